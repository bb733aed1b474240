//! Route-template compilation and dispatch: parse templates like
//! `/users/{id}` into positional metadata, compile a whole registry
//! into one combined matcher, and resolve `(method, path)` to a
//! three-way outcome with bound parameters. Transport, URL decoding
//! and handler invocation belong to the embedder.

mod error;
mod matcher;
mod outcome;
mod parser;
mod registry;

pub use error::{CompileError, ParseError};
pub use http::Method;
pub use matcher::Dispatcher;
pub use outcome::{BoundParams, DispatchOutcome, RouteSnapshot};
pub use parser::{DEFAULT_PATTERN, ParsedTemplate, PatternOverrides, Placeholder, Segment, parse};
pub use registry::{RouteEntry, RouteRegistry, RouteToken};

/// Registration surface over a [`RouteRegistry`]. Build phase only:
/// register routes, then [`Router::build`] freezes everything into a
/// [`Dispatcher`] for the serving phase.
#[derive(Debug, Clone)]
pub struct Router<H> {
    registry: RouteRegistry<H>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            registry: RouteRegistry::new(),
        }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(
        &mut self,
        methods: &[Method],
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.registry.add_route(methods, template, handler, overrides)
    }

    pub fn get(
        &mut self,
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.add_route(&[Method::GET], template, handler, overrides)
    }

    pub fn post(
        &mut self,
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.add_route(&[Method::POST], template, handler, overrides)
    }

    pub fn put(
        &mut self,
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.add_route(&[Method::PUT], template, handler, overrides)
    }

    pub fn patch(
        &mut self,
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.add_route(&[Method::PATCH], template, handler, overrides)
    }

    pub fn delete(
        &mut self,
        template: &str,
        handler: H,
        overrides: &PatternOverrides,
    ) -> Result<(), ParseError> {
        self.add_route(&[Method::DELETE], template, handler, overrides)
    }

    /// Register everything `build` adds under `prefix`. The
    /// surrounding prefix is restored afterwards, and nested groups
    /// compose (`/api` then `/v1` scopes under `/api/v1`).
    pub fn group<F>(&mut self, prefix: &str, build: F) -> Result<(), ParseError>
    where
        F: FnOnce(&mut Self) -> Result<(), ParseError>,
    {
        let saved = self.registry.group().to_string();
        let nested = format!("{}{}", saved.trim_end_matches('/'), prefix);
        self.registry.set_group(nested);
        let ret = build(self);
        self.registry.set_group(saved);
        ret
    }

    pub fn routes(&self) -> &[RouteEntry<H>] {
        self.registry.routes()
    }

    pub fn registry(&self) -> &RouteRegistry<H> {
        &self.registry
    }

    /// Compile the registry into its frozen serving form. Call again
    /// after further registrations to get an updated dispatcher.
    pub fn build(&self) -> Result<Dispatcher<H>, CompileError>
    where
        H: Clone,
    {
        Dispatcher::compile(&self.registry)
    }
}
