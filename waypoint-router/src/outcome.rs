use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::registry::RouteEntry;

/// Placeholder name to raw captured substring, in placeholder
/// declaration order. No percent-decoding, no coercion.
pub type BoundParams = IndexMap<String, String>;

/// The three-way dispatch result. `NotFound` and `MethodNotAllowed`
/// are ordinary, expected values, not errors.
#[derive(Debug)]
pub enum DispatchOutcome<'a, H> {
    Found {
        entry: &'a RouteEntry<H>,
        params: BoundParams,
    },
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
    NotFound,
}

impl<'a, H> DispatchOutcome<'a, H> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Serializable replay record for an external dispatch cache.
    /// `Some` only for `Found`; `path` is the path that was dispatched.
    pub fn snapshot(&self, path: &str) -> Option<RouteSnapshot<H>>
    where
        H: Clone,
    {
        match self {
            Self::Found { entry, params } => Some(RouteSnapshot {
                methods: entry.methods().iter().map(|m| m.to_string()).collect(),
                path: path.to_string(),
                handler: entry.handler().clone(),
                params: params.clone(),
            }),
            _ => None,
        }
    }
}

/// Enough of a prior `Found` outcome to bypass the matching engine on
/// a cache hit. The core owns no cache storage; embedders key these by
/// `(method, path)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot<H> {
    pub methods: Vec<String>,
    pub path: String,
    pub handler: H,
    pub params: BoundParams,
}

impl<H> RouteSnapshot<H> {
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.iter().any(|m| m == method.as_str())
    }
}
