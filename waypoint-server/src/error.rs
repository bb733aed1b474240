use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use waypoint_router::Method;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("route not found: {0}")]
    RouteNotFound(String),
    #[error("method {method} not allowed")]
    MethodNotAllowed {
        method: Method,
        allowed: Vec<Method>,
    },
    #[error("handler not found: {0}")]
    HandlerNotFound(String),
    #[error("handler '{handler}' expects parameters {expected:?}, route bound {actual:?}")]
    ParameterMismatch {
        handler: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::RouteNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::MethodNotAllowed { ref allowed, .. } => {
                let allow = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, allow)],
                    self.to_string(),
                )
                    .into_response()
            }
            Self::HandlerNotFound(_) | Self::ParameterMismatch { .. } | Self::Anyhow(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
