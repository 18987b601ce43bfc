use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use serde::{Deserialize, Serialize};
use socialwall_backend::{BackendError, MemoryBackend, client::UnknownBucketError};
use socialwall_common::model::ModelValidationError;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::error;

mod auth;
mod json;
mod routes;

pub use auth::RequiredApiKey;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub backend: Arc<MemoryBackend>,
    pub api_key: RequiredApiKey,
}

impl ServerState {
    #[must_use]
    pub fn new(backend: MemoryBackend, api_key: Option<String>) -> Self {
        Self {
            backend: Arc::new(backend),
            api_key: RequiredApiKey::new(api_key),
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

/// The full application: routes, state and request tracing.
pub fn app(state: ServerState) -> Router {
    routes().with_state(state).layer(TraceLayer::new_for_http())
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("No API key found in request")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("A filter on id is required")]
    MissingFilter,
    #[error("Unsupported filter: {0}")]
    InvalidFilter(String),
    #[error("Unsupported order: {0}")]
    UnsupportedOrder(String),
    #[error("Unsupported select: {0}")]
    UnsupportedSelect(String),
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    BucketNotFound(#[from] UnknownBucketError),
    #[error("Object not found")]
    ObjectNotFound,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::BucketNotFound(_)
            | ServerError::ObjectNotFound => StatusCode::NOT_FOUND,
            ServerError::MissingApiKey | ServerError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::MissingFilter
            | ServerError::InvalidFilter(_)
            | ServerError::UnsupportedOrder(_)
            | ServerError::UnsupportedSelect(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Backend(err) => err
                .status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ServerError::JsonResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}
