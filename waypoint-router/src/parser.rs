use std::collections::HashMap;

use crate::error::ParseError;

/// Pattern applied to a placeholder unless an override was supplied at
/// registration: one or more non-slash characters.
pub const DEFAULT_PATTERN: &str = "[^/]+";

/// Per-name regex fragments overriding the default placeholder pattern.
pub type PatternOverrides = HashMap<String, String>;

/// A fixed path component at a specific position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub literal: String,
}

/// A named, pattern-constrained variable path component. `pattern` is
/// an unanchored regex fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub index: usize,
    pub name: String,
    pub pattern: String,
}

/// Output of [`parse`]: segments and placeholders share one contiguous
/// 0-based index space, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub segments: Vec<Segment>,
    pub placeholders: Vec<Placeholder>,
}

/// Parse one route template into positional segment/placeholder
/// metadata. Splits on `/`; leading, trailing and duplicate slashes
/// produce no tokens, so the root template `/` parses to empty lists.
pub fn parse(template: &str, overrides: &PatternOverrides) -> Result<ParsedTemplate, ParseError> {
    let mut parsed = ParsedTemplate::default();
    let mut index = 0;

    for token in template.split('/').filter(|t| !t.is_empty()) {
        if let Some(inner) = token.strip_prefix('{') {
            let Some(name) = inner.strip_suffix('}') else {
                return Err(ParseError::UnterminatedPlaceholder(token.to_string()));
            };
            if name.is_empty() {
                return Err(ParseError::EmptyPlaceholder);
            }
            if let Some(ch) = name
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
            {
                return Err(ParseError::InvalidPlaceholderName {
                    name: name.to_string(),
                    ch,
                });
            }
            if parsed.placeholders.iter().any(|p| p.name == name) {
                return Err(ParseError::DuplicatePlaceholder(name.to_string()));
            }
            let pattern = overrides
                .get(name)
                .cloned()
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string());
            parsed.placeholders.push(Placeholder {
                index,
                name: name.to_string(),
                pattern,
            });
        } else if token.contains('{') || token.contains('}') {
            return Err(ParseError::UnterminatedPlaceholder(token.to_string()));
        } else {
            parsed.segments.push(Segment {
                index,
                literal: token.to_string(),
            });
        }
        index += 1;
    }

    Ok(parsed)
}
