use thiserror::Error;

/// Raised while parsing a route template at registration time. The
/// registry is left untouched when one of these comes back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("placeholder must not be empty")]
    EmptyPlaceholder,
    #[error("unterminated placeholder in token '{0}'")]
    UnterminatedPlaceholder(String),
    #[error("invalid character '{ch}' in placeholder name '{name}'")]
    InvalidPlaceholderName { name: String, ch: char },
    #[error("duplicate placeholder name '{0}'")]
    DuplicatePlaceholder(String),
    #[error("route must declare at least one method")]
    NoMethods,
}

/// Raised while building the combined matcher, naming the entry that
/// could not be embedded. Dispatch itself never fails once a
/// dispatcher has been built.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid pattern '{pattern}' for placeholder '{name}' in route '{route}': {source}")]
    InvalidPattern {
        index: usize,
        route: String,
        name: String,
        pattern: String,
        source: regex::Error,
    },
    #[error("route '{route}' cannot be embedded in the combined expression: {source}")]
    InvalidRoute {
        index: usize,
        route: String,
        source: regex::Error,
    },
    #[error("combined expression failed to build: {0}")]
    Combined(regex::Error),
}
