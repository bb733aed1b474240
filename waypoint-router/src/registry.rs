use http::Method;

use crate::error::ParseError;
use crate::parser::{self, PatternOverrides, Placeholder, Segment};

/// One compiled route: methods, positional metadata and an opaque
/// handler reference. Immutable after creation.
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    methods: Vec<Method>,
    segments: Vec<Segment>,
    placeholders: Vec<Placeholder>,
    handler: H,
}

/// A segment or placeholder viewed at its position in the entry.
#[derive(Debug, Clone, Copy)]
pub enum RouteToken<'a> {
    Literal(&'a Segment),
    Placeholder(&'a Placeholder),
}

impl<H> RouteEntry<H> {
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Walk segments and placeholders interleaved by position index.
    pub fn tokens(&self) -> impl Iterator<Item = RouteToken<'_>> {
        let mut segments = self.segments.iter().peekable();
        let mut placeholders = self.placeholders.iter();
        (0..self.segments.len() + self.placeholders.len()).map(move |index| {
            if segments.peek().is_some_and(|s| s.index == index) {
                RouteToken::Literal(segments.next().expect("peeked segment present"))
            } else {
                RouteToken::Placeholder(
                    placeholders
                        .next()
                        .expect("indices form a contiguous sequence"),
                )
            }
        })
    }

    /// Segments joined in index order, `/`-prefixed; `/` for the empty
    /// entry. Only a faithful reconstruction of the path when the
    /// entry has no placeholders.
    pub fn literal_path(&self) -> String {
        if self.segments.is_empty() && self.placeholders.is_empty() {
            return "/".to_string();
        }
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(&segment.literal);
        }
        path
    }

    /// Reconstruct the template text, e.g. `/users/{id}`. Used to name
    /// entries in compile errors and logs.
    pub fn template(&self) -> String {
        if self.segments.is_empty() && self.placeholders.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for token in self.tokens() {
            out.push('/');
            match token {
                RouteToken::Literal(segment) => out.push_str(&segment.literal),
                RouteToken::Placeholder(placeholder) => {
                    out.push('{');
                    out.push_str(&placeholder.name);
                    out.push('}');
                }
            }
        }
        out
    }
}

/// Append-only collection of route entries with an active group prefix
/// applied to future registrations only.
#[derive(Debug, Clone)]
pub struct RouteRegistry<H> {
    routes: Vec<RouteEntry<H>>,
    group: String,
}

impl<H> Default for RouteRegistry<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            group: String::new(),
        }
    }
}

impl<H> RouteRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualify `template` with the active group prefix, parse it and
    /// append one entry. On error the registry is unchanged. Duplicate
    /// or structurally-overlapping templates are legal here; the
    /// dispatcher disambiguates them.
    pub fn add_route(
        &mut self,
        methods: &[Method],
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        if methods.is_empty() {
            return Err(ParseError::NoMethods);
        }
        let qualified = format!("{}{}", self.group.trim_end_matches('/'), template);
        let parsed = parser::parse(&qualified, overrides)?;

        let mut deduped: Vec<Method> = Vec::with_capacity(methods.len());
        for method in methods {
            if !deduped.contains(method) {
                deduped.push(method.clone());
            }
        }

        self.routes.push(RouteEntry {
            methods: deduped,
            segments: parsed.segments,
            placeholders: parsed.placeholders,
            handler,
        });
        Ok(())
    }

    /// Set the prefix applied to subsequent `add_route` calls only;
    /// already-registered entries are never requalified.
    pub fn set_group(&mut self, prefix: impl Into<String>) {
        self.group = prefix.into();
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn routes(&self) -> &[RouteEntry<H>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
