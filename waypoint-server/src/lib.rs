mod cache;
mod config;
mod error;
mod handler;
mod router;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, Request, State},
    response::Response,
    routing::any,
};
use tokio::net::TcpListener;
use tracing::{debug, info};
use waypoint_router::{BoundParams, DispatchOutcome, Method};

pub use cache::DispatchCache;
pub use config::{ProjectConfig, ProjectRoutes, RouteSpec};
pub use error::AppError;
pub use handler::{HandlerEntry, HandlerFn, HandlerMap, Req, Res};
pub use router::SwappableRouter;

#[derive(Clone)]
pub struct AppState {
    router: SwappableRouter,
    handlers: Arc<HandlerMap>,
    cache: Arc<DispatchCache>,
}

pub async fn start_server(port: u16, state: AppState) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(addr).await?;

    info!("server is running on {}", listener.local_addr()?);

    let app = axum::Router::new()
        .route("/", any(dispatch_request))
        .route("/{*path}", any(dispatch_request))
        .with_state(state);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn dispatch_request(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.ok();
    let body = body.and_then(|b| String::from_utf8(b.into()).ok());

    let headers = parts
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();

    info!("{} {}", parts.method, parts.uri.path());

    let res = state.execute(&parts.method, parts.uri.path(), query, headers, body)?;
    Ok(Response::from(res))
}

impl AppState {
    pub fn new(router: SwappableRouter, handlers: HandlerMap) -> Self {
        Self {
            router,
            handlers: Arc::new(handlers),
            cache: Arc::new(DispatchCache::new()),
        }
    }

    pub fn router(&self) -> &SwappableRouter {
        &self.router
    }

    pub fn cache(&self) -> &DispatchCache {
        &self.cache
    }

    /// Resolve and run one request: try the dispatch cache, fall back
    /// to the matching engine, record `Found` outcomes for replay.
    pub fn execute(
        &self,
        method: &Method,
        path: &str,
        query: HashMap<String, String>,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<Res, AppError> {
        if let Some(snapshot) = self.cache.get(method.as_str(), path) {
            if snapshot.allows(method) {
                debug!("dispatch cache hit: {} {}", method, path);
                return self.run(&snapshot.handler, snapshot.params.clone(), method, path, query, headers, body);
            }
        }

        let dispatcher = self.router.load();
        let outcome = dispatcher.dispatch(method, path);
        if let Some(snapshot) = outcome.snapshot(path) {
            self.cache.put(method.as_str(), path, snapshot);
        }

        match outcome {
            DispatchOutcome::Found { entry, params } => {
                self.run(entry.handler(), params, method, path, query, headers, body)
            }
            DispatchOutcome::MethodNotAllowed { allowed } => Err(AppError::MethodNotAllowed {
                method: method.clone(),
                allowed,
            }),
            DispatchOutcome::NotFound => Err(AppError::RouteNotFound(path.to_string())),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        name: &str,
        params: BoundParams,
        method: &Method,
        path: &str,
        query: HashMap<String, String>,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<Res, AppError> {
        let handler = self
            .handlers
            .resolve(name)
            .ok_or_else(|| AppError::HandlerNotFound(name.to_string()))?;

        if let Some(expected) = handler.expected_params() {
            let actual: Vec<String> = params.keys().cloned().collect();
            if actual != expected {
                return Err(AppError::ParameterMismatch {
                    handler: name.to_string(),
                    expected: expected.to_vec(),
                    actual,
                });
            }
        }

        let req = Req::builder()
            .method(method.as_str())
            .path(path)
            .query(query)
            .params(params)
            .headers(headers)
            .body(body.unwrap_or_default())
            .build();

        Ok(handler.call(req))
    }
}
