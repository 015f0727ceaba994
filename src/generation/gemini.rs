use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{GenerationClient, GenerationError};
use crate::consts::{DEFAULT_GEMINI_BASE_URL, DEFAULT_MODEL};
use crate::prompts::Prompt;

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INVALID_KEY_REASON: &str = "API_KEY_INVALID";
const GENERATE_METHOD: &str = "generateContent";
const REDACTED: &str = "[REDACTED]";
const MAX_ERROR_BODY: usize = 512;

/// A generation engine backed by the Gemini `generateContent` API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// A missing or empty key is accepted here; calls then fail with
    /// [`GenerationError::MissingCredentials`].
    pub fn new(api_key: Option<String>, model: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point the client at another API root (a proxy, or a local fake in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Models usable with `generateContent` under the configured key,
    /// without the `models/` prefix.
    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1beta/models?pageSize=1000", self.base_url);

        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| self.scrub(transport_error(e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| self.scrub(transport_error(e)))?;

        if !status.is_success() {
            return Err(self.scrub(classify_status(status.as_u16(), &body)));
        }

        parse_models_response(&body).map_err(|e| self.scrub(e))
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredentials)
    }

    fn redact(&self, message: String) -> String {
        match &self.api_key {
            Some(key) => message.replace(key.as_str(), REDACTED),
            None => message,
        }
    }

    /// Strip the API key from any message carried by `err`.
    fn scrub(&self, err: GenerationError) -> GenerationError {
        match err {
            GenerationError::Unauthorized { status, message } => GenerationError::Unauthorized {
                status,
                message: self.redact(message),
            },
            GenerationError::InvalidRequest(m) => GenerationError::InvalidRequest(self.redact(m)),
            GenerationError::Network(m) => GenerationError::Network(self.redact(m)),
            GenerationError::RateLimited(m) => GenerationError::RateLimited(self.redact(m)),
            GenerationError::MalformedResponse(m) => {
                GenerationError::MalformedResponse(self.redact(m))
            }
            GenerationError::Upstream { status, message } => GenerationError::Upstream {
                status,
                message: self.redact(message),
            },
            other => other,
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/v1beta/models/{}:{}",
            self.base_url, self.model, GENERATE_METHOD
        );

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &prompt.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt.user }],
            }],
        };

        let started = Instant::now();
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.scrub(transport_error(e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| self.scrub(transport_error(e)))?;

        debug!(
            model = %self.model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gemini responded"
        );

        if !status.is_success() {
            return Err(self.scrub(classify_status(status.as_u16(), &text)));
        }

        parse_generate_response(&text).map_err(|e| self.scrub(e))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn transport_error(e: reqwest::Error) -> GenerationError {
    // A builder error never left this process: an unusable key or URL.
    if e.is_builder() {
        GenerationError::InvalidRequest(e.to_string())
    } else if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_decode() {
        GenerationError::MalformedResponse(e.to_string())
    } else {
        GenerationError::Network(e.to_string())
    }
}

/// Map a non-2xx status and its body to a failure class.
fn classify_status(status: u16, body: &str) -> GenerationError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let message = parsed
        .as_ref()
        .map(|env| env.error.message.clone())
        .unwrap_or_else(|| truncate(body.trim(), MAX_ERROR_BODY));

    let invalid_key = parsed.as_ref().is_some_and(|env| {
        env.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some(INVALID_KEY_REASON))
    }) || message.contains("API key not valid");

    match status {
        401 | 403 => GenerationError::Unauthorized { status, message },
        400 if invalid_key => GenerationError::Unauthorized { status, message },
        429 => GenerationError::RateLimited(message),
        _ => GenerationError::Upstream { status, message },
    }
}

fn parse_generate_response(body: &str) -> Result<String, GenerationError> {
    let resp: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::MalformedResponse(format!(
            "failed to parse Gemini response: {}\nraw: {}",
            e,
            truncate(body, MAX_ERROR_BODY)
        ))
    })?;

    if let Some(reason) = resp
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerationError::Upstream {
            status: 200,
            message: format!("prompt blocked: {reason}"),
        });
    }

    if let Some(usage) = &resp.usage_metadata {
        debug!(
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "gemini token usage"
        );
    }

    let candidate = resp.candidates.first().ok_or_else(|| {
        GenerationError::MalformedResponse("Gemini returned no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GenerationError::MalformedResponse(format!(
            "Gemini returned empty text (finish reason: {reason})"
        )));
    }

    Ok(text)
}

fn parse_models_response(body: &str) -> Result<Vec<String>, GenerationError> {
    let resp: ModelsResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::MalformedResponse(format!("failed to parse model list: {e}"))
    })?;

    Ok(resp
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_METHOD)
        })
        .map(|m| m.name.trim_start_matches("models/").to_string())
        .collect())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

// --- API types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}
