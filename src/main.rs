use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use professionalizer::config::{self, Cli, Command};
use professionalizer::consts::API_KEY_ENV;
use professionalizer::generation::GenerationError;
use professionalizer::generation::gemini::GeminiClient;
use professionalizer::rewrite::RewriteService;
use professionalizer::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = config::load_env_file(&std::env::current_dir()?)?;
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }

    let client = GeminiClient::new(cli.api_key.clone(), Some(cli.model.clone()))?
        .with_base_url(cli.base_url.clone());

    match cli.command() {
        Command::Serve => run_server(&cli, client).await,
        Command::CheckKey => check_key(&client).await,
    }
}

async fn run_server(cli: &Cli, client: GeminiClient) -> Result<()> {
    if client.has_api_key() {
        info!(model = client.model(), "API key found, using Gemini");
    } else {
        warn!("{API_KEY_ENV} is not set; rewrite requests will fail until it is");
    }

    let service = RewriteService::new(Arc::new(client), cli.rewrite_config());
    let state = AppState::new(service);

    let addr = cli.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("server is live on http://{}", listener.local_addr()?);

    server::serve(listener, state, shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// The original key-diagnostic: report whether the key works and which
/// models it may call.
async fn check_key(client: &GeminiClient) -> Result<()> {
    println!("Checking API key permissions...");

    match client.list_models().await {
        Ok(models) if models.is_empty() => {
            println!("The key works, but has no access to any generateContent model.");
            println!("Enable the Generative Language API for the key's project.");
        }
        Ok(models) => {
            println!("The key has access to these models:");
            for model in &models {
                let marker = if model == client.model() { " (configured)" } else { "" };
                println!("  {model}{marker}");
            }
            if !models.iter().any(|m| m == client.model()) {
                println!(
                    "warning: configured model '{}' is not in this list",
                    client.model()
                );
            }
        }
        Err(GenerationError::MissingCredentials) => {
            anyhow::bail!("no API key found. Set {API_KEY_ENV} or pass --api-key.");
        }
        Err(e) => {
            anyhow::bail!("key check failed: {e}");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining requests");
}
