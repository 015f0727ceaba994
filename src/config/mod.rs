//! Runtime configuration: command-line flags, each with an environment
//! variable fallback and a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use crate::consts::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_HOST, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_PORT,
};
use crate::rewrite::RewriteConfig;

#[derive(Parser, Debug)]
#[command(
    name = "professionalizer",
    version,
    about = "Rewrites text in a chosen tone."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Gemini API key. Startup succeeds without one; rewrites then fail with an auth error.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Gemini API root
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL, global = true)]
    pub base_url: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    /// Per-attempt timeout for a generation call, in seconds
    #[arg(
        short,
        long,
        env = "REWRITE_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub timeout: u64,

    /// Retries after a transient network failure
    #[arg(long, env = "REWRITE_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub max_retries: u32,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Check the API key and list the models it can use
    CheckKey,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rewrite_config(&self) -> RewriteConfig {
        RewriteConfig {
            attempt_timeout: Duration::from_secs(self.timeout),
            max_retries: self.max_retries,
            ..RewriteConfig::default()
        }
    }

    /// Default log directive when RUST_LOG is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Load `<dir>/.env` into the process environment so clap sees its values.
/// Variables already set in the environment are left alone. Returns the path
/// that was loaded, or `None` when there is no file.
pub fn load_env_file(dir: &Path) -> Result<Option<PathBuf>> {
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(None);
    }
    dotenv::from_path(&path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["professionalizer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_to_serve() {
        assert_eq!(parse(&[]).command(), Command::Serve);
    }

    #[test]
    fn check_key_subcommand() {
        assert_eq!(parse(&["check-key"]).command(), Command::CheckKey);
    }

    #[test]
    fn flags_work_after_subcommand() {
        let cli = parse(&["serve", "--port", "5000", "--host", "127.0.0.1"]);
        assert_eq!(cli.bind_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn rewrite_config_from_flags() {
        let cli = parse(&["--timeout", "5", "--max-retries", "0"]);
        let config = cli.rewrite_config();
        assert_eq!(config.attempt_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.backoff_cap, RewriteConfig::default().backoff_cap);
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["professionalizer", "--timeout", "0"]).is_err());
    }

    #[test]
    fn api_key_flag() {
        let cli = parse(&["--api-key", "AIza-test"]);
        assert_eq!(cli.api_key.as_deref(), Some("AIza-test"));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(parse(&[]).log_level(), "info");
        assert_eq!(parse(&["-v"]).log_level(), "debug");
        assert_eq!(parse(&["-vv"]).log_level(), "trace");
    }

    #[test]
    fn env_file_missing_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn env_file_values_reach_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "PROFESSIONALIZER_ENV_FILE_TEST=from-file\n",
        )
        .unwrap();

        let loaded = load_env_file(dir.path()).unwrap();
        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(
            std::env::var("PROFESSIONALIZER_ENV_FILE_TEST").as_deref(),
            Ok("from-file")
        );
    }
}
