use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{GenerationClient, GenerationError};
use crate::prompts::Prompt;

type Responder = dyn Fn(&Prompt) -> Result<String, GenerationError> + Send + Sync;

enum Script {
    Queue(Vec<Result<String, GenerationError>>),
    Func(Box<Responder>),
}

/// A scripted engine for tests. Returns pre-defined outcomes in order, or
/// computes each outcome from the prompt. Records every prompt it receives.
pub struct MockClient {
    script: Script,
    index: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
    delay: Option<Duration>,
}

impl MockClient {
    pub fn new(outcomes: Vec<Result<String, GenerationError>>) -> Self {
        Self::with_script(Script::Queue(outcomes))
    }

    /// Always succeed with `text`.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    /// Always fail with `error`.
    pub fn failing(error: GenerationError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Prompt) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Func(Box::new(f)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `generate` was entered.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Queue(outcomes) => outcomes.get(i).cloned().unwrap_or_else(|| {
                Err(GenerationError::MalformedResponse(format!(
                    "MockClient: no more responses (called {} times)",
                    i + 1
                )))
            }),
            Script::Func(f) => f(prompt),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(user: &str) -> Prompt {
        Prompt {
            system: "sys".to_string(),
            user: user.to_string(),
        }
    }

    #[tokio::test]
    async fn queue_replays_in_order_then_runs_dry() {
        let client = MockClient::new(vec![
            Err(GenerationError::Timeout),
            Ok("second".to_string()),
        ]);

        assert_eq!(
            client.generate(&prompt("a")).await,
            Err(GenerationError::Timeout)
        );
        assert_eq!(client.generate(&prompt("b")).await.unwrap(), "second");
        let dry = client.generate(&prompt("c")).await.unwrap_err();
        assert!(dry.to_string().contains("no more responses"));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn records_prompts() {
        let client = MockClient::replying("ok");
        client.generate(&prompt("first")).await.unwrap();
        client.generate(&prompt("second")).await.unwrap();

        let users: Vec<_> = client.prompts().into_iter().map(|p| p.user).collect();
        assert_eq!(users, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn from_fn_sees_the_prompt() {
        let client = MockClient::from_fn(|p| Ok(p.user.to_uppercase()));
        assert_eq!(client.generate(&prompt("shout")).await.unwrap(), "SHOUT");
    }

    #[test]
    fn mock_name() {
        assert_eq!(MockClient::replying("x").name(), "mock");
    }
}
