pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompts::Prompt;

/// Why a generation call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("credentials rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("generation timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("quota or rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
}

impl GenerationError {
    /// Failures worth another attempt: the engine was never reached, or did
    /// not answer in time.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Network(_) | GenerationError::Timeout)
    }
}

/// A text-generation engine. Could be Gemini, another provider, or a test script.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;

    /// Short provider name, for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_and_timeout_are_transient() {
        assert!(GenerationError::Network("reset".into()).is_transient());
        assert!(GenerationError::Timeout.is_transient());

        assert!(!GenerationError::MissingCredentials.is_transient());
        assert!(!GenerationError::Cancelled.is_transient());
        assert!(!GenerationError::InvalidRequest("bad header".into()).is_transient());
        assert!(!GenerationError::RateLimited("quota".into()).is_transient());
        assert!(!GenerationError::MalformedResponse("{}".into()).is_transient());
        assert!(
            !GenerationError::Unauthorized {
                status: 401,
                message: "bad key".into()
            }
            .is_transient()
        );
        assert!(
            !GenerationError::Upstream {
                status: 500,
                message: "boom".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn display_carries_status() {
        let err = GenerationError::Upstream {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "upstream error (503): overloaded");
    }
}
