use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{RewriteError, RewriteRequest, RewriteResult, TEXT_REQUIRED};
use crate::consts::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_CAP, DEFAULT_MAX_RETRIES,
};
use crate::generation::{GenerationClient, GenerationError};
use crate::prompts::Prompt;
use crate::prompts::rewrite::build_rewrite_prompt;
use crate::tone::Tone;

#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Bound on a single engine call.
    pub attempt_timeout: Duration,
    /// Extra attempts allowed after a transient failure.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: DEFAULT_BACKOFF_CAP,
        }
    }
}

impl RewriteConfig {
    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }
}

/// Validates requests, builds prompts and drives the generation engine.
///
/// Holds one shared client; safe to call concurrently.
pub struct RewriteService {
    client: Arc<dyn GenerationClient>,
    config: RewriteConfig,
}

impl RewriteService {
    pub fn new(client: Arc<dyn GenerationClient>, config: RewriteConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite `request.text` in `request.tone`.
    ///
    /// Never retries validation or auth failures. Cancelling `cancel` aborts
    /// the in-flight call and any pending backoff.
    pub async fn rewrite(
        &self,
        request: &RewriteRequest,
        cancel: &CancellationToken,
    ) -> Result<RewriteResult, RewriteError> {
        if request.text.trim().is_empty() {
            return Err(RewriteError::validation(TEXT_REQUIRED));
        }

        let tone =
            Tone::resolve(&request.tone).map_err(|e| RewriteError::validation(e.to_string()))?;

        info!(
            %tone,
            chars = request.text.chars().count(),
            engine = self.client.name(),
            "rewrite requested"
        );

        let prompt = build_rewrite_prompt(&request.text, tone);

        match self.generate(&prompt, cancel).await {
            Ok(text) => Ok(RewriteResult { text }),
            Err(e) => {
                let err = RewriteError::from(e);
                warn!(kind = %err.kind, error = %err.message, "rewrite failed");
                Err(err)
            }
        }
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        let mut retry = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GenerationError::Cancelled),
                result = tokio::time::timeout(
                    self.config.attempt_timeout,
                    self.client.generate(prompt),
                ) => result.unwrap_or(Err(GenerationError::Timeout)),
            };

            match outcome {
                Err(e) if e.is_transient() && retry < self.config.max_retries => {
                    let delay = self.config.backoff(retry);
                    retry += 1;
                    warn!(
                        error = %e,
                        retry,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "transient generation failure, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let config = RewriteConfig {
            backoff_base: Duration::from_millis(100),
            backoff_cap: Duration::from_millis(500),
            ..RewriteConfig::default()
        };
        assert_eq!(config.backoff(0), Duration::from_millis(100));
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(2), Duration::from_millis(400));
        assert_eq!(config.backoff(3), Duration::from_millis(500));
        assert_eq!(config.backoff(64), Duration::from_millis(500));
    }

    #[test]
    fn default_config_matches_consts() {
        let config = RewriteConfig::default();
        assert_eq!(config.attempt_timeout, DEFAULT_ATTEMPT_TIMEOUT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }
}
