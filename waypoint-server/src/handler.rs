use std::collections::HashMap;

use axum::{body::Body, response::Response};
use typed_builder::TypedBuilder;
use waypoint_router::BoundParams;

/// Handler-resolution collaborator: maps the opaque handler id carried
/// by a route entry to an invocable function. The router core never
/// sees these.
pub type HandlerFn = Box<dyn Fn(Req) -> Res + Send + Sync>;

/// A registered handler, optionally carrying the parameter names it
/// expects, in order. When declared, dispatch refuses to invoke the
/// handler with a mismatched set of bound parameters.
pub struct HandlerEntry {
    func: HandlerFn,
    params: Option<Vec<String>>,
}

impl HandlerEntry {
    pub fn call(&self, req: Req) -> Res {
        (self.func)(req)
    }

    pub fn expected_params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }
}

#[derive(Default)]
pub struct HandlerMap {
    handlers: HashMap<String, HandlerEntry>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(Req) -> Res + Send + Sync + 'static,
    ) {
        self.handlers.insert(
            name.into(),
            HandlerEntry {
                func: Box::new(handler),
                params: None,
            },
        );
    }

    /// Register a handler with a declared parameter schema.
    pub fn insert_with_params(
        &mut self,
        name: impl Into<String>,
        params: &[&str],
        handler: impl Fn(Req) -> Res + Send + Sync + 'static,
    ) {
        self.handlers.insert(
            name.into(),
            HandlerEntry {
                func: Box::new(handler),
                params: Some(params.iter().map(|p| p.to_string()).collect()),
            },
        );
    }

    pub fn resolve(&self, name: &str) -> Option<&HandlerEntry> {
        self.handlers.get(name)
    }
}

#[derive(Debug, TypedBuilder)]
pub struct Req {
    #[builder(setter(into))]
    pub method: String,
    #[builder(setter(into))]
    pub path: String,
    #[builder(default)]
    pub query: HashMap<String, String>,
    #[builder(default)]
    pub params: BoundParams,
    #[builder(default)]
    pub headers: HashMap<String, String>,
    #[builder(default, setter(strip_option))]
    pub body: Option<String>,
}

#[derive(Debug, TypedBuilder)]
pub struct Res {
    pub status: u16,
    #[builder(default)]
    pub headers: HashMap<String, String>,
    #[builder(default, setter(strip_option))]
    pub body: Option<String>,
}

impl From<Res> for Response {
    fn from(res: Res) -> Self {
        let mut builder = Response::builder().status(res.status);
        for (k, v) in res.headers {
            builder = builder.header(k, v);
        }
        if let Some(body) = res.body {
            builder.body(body.into()).unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        }
    }
}
