use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::rewrite::{ErrorKind, RewriteError};

const INVALID_BODY: &str = "Invalid JSON body";
const UPSTREAM_ERROR: &str = "AI Error";

/// Errors surfaced by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The body was not JSON of the expected shape.
    InvalidBody,
    Rewrite(RewriteError),
}

impl From<RewriteError> for ApiError {
    fn from(err: RewriteError) -> Self {
        ApiError::Rewrite(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'static str>,
}

/// Client-facing description of an upstream failure. Provider messages can
/// carry keys or infrastructure details, so they are logged, not returned.
fn upstream_details(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Auth => "The generation engine rejected or is missing its credentials.",
        ErrorKind::Network => "The generation engine could not be reached in time.",
        ErrorKind::UnknownUpstream | ErrorKind::Validation => {
            "The generation engine returned an unexpected response."
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidBody => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: INVALID_BODY.to_string(),
                    details: None,
                },
            ),
            ApiError::Rewrite(err) if err.is_client_error() => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err.message,
                    details: None,
                },
            ),
            ApiError::Rewrite(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: UPSTREAM_ERROR.to_string(),
                    details: Some(upstream_details(err.kind)),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
