//! The rewrite pipeline: request/result types, the error taxonomy, and the
//! service that drives a [`GenerationClient`](crate::generation::GenerationClient).

pub mod service;

pub use service::{RewriteConfig, RewriteService};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::generation::GenerationError;
use crate::tone::Tone;

/// Message returned when the submitted text is empty or blank.
pub const TEXT_REQUIRED: &str = "Text is required";

/// A single rewrite request as submitted by a client.
///
/// A field that is absent or `null` takes its default: empty text, which
/// fails validation, and the default tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default = "default_tone", deserialize_with = "null_as_default_tone")]
    pub tone: String,
}

fn default_tone() -> String {
    Tone::default().id().to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_default_tone<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_tone))
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: tone.into(),
        }
    }
}

/// The engine's output, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub text: String,
}

/// Failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable; fix it and resend.
    Validation,
    /// The engine rejected or never received credentials.
    Auth,
    /// The engine could not be reached in time.
    Network,
    /// The engine answered with something other than a rewrite.
    UnknownUpstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::UnknownUpstream => "UnknownUpstreamError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RewriteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RewriteError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    /// True when the caller, not the engine, is at fault.
    pub fn is_client_error(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

impl From<GenerationError> for RewriteError {
    fn from(err: GenerationError) -> Self {
        let kind = match err {
            GenerationError::MissingCredentials | GenerationError::Unauthorized { .. } => {
                ErrorKind::Auth
            }
            GenerationError::Network(_) | GenerationError::Timeout | GenerationError::Cancelled => {
                ErrorKind::Network
            }
            GenerationError::InvalidRequest(_)
            | GenerationError::RateLimited(_)
            | GenerationError::MalformedResponse(_)
            | GenerationError::Upstream { .. } => ErrorKind::UnknownUpstream,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
