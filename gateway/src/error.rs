use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors the HTTP surface can produce, on top of whatever
/// [`smart_proxy::Error`] a namespace operation fails with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path's namespace segment doesn't match any configured namespace.
    #[error("namespace '{0}' is not configured")]
    NamespaceNotFound(String),
    /// Propagated from the orchestrator.
    #[error(transparent)]
    SmartProxy(#[from] smart_proxy::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            Error::SmartProxy(smart_proxy::Error::ToolNotFound { .. }) => StatusCode::NOT_FOUND,
            Error::SmartProxy(_) => StatusCode::BAD_GATEWAY,
        };

        log::warn!("request failed: {self}");

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
