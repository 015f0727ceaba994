//! Project-wide constants.

use std::time::Duration;

/// Default Gemini model when none is specified.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API root. Overridable so tests can point at a local server.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default listening port (the hosting platform routes to 10000).
pub const DEFAULT_PORT: u16 = 10000;

/// Default bind address: all interfaces.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Body returned by the liveness route.
pub const LIVENESS_MESSAGE: &str = "Professionalizer Backend is Active & Running.";

/// Per-attempt timeout for a generation call.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first attempt, for transient failures only.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// First backoff delay; doubles on every retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Upper bound for a single backoff delay.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(4);
