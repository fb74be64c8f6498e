use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use playground::client::ChatClient;
use playground::config::{Config, DEFAULT_CONFIG_PATH};
use playground::credentials::CredentialStore;
use playground::llm::{ChatAdapter, ChatBackend, ProviderRegistry};
use playground::models::default_model;
use playground::provider::Provider;
use playground::repl;
use playground::server::{AppState, build_app};
use playground::session::ChatSession;

#[derive(Parser)]
#[command(name = "playground", version, about = "Chat with LLM provider APIs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the chat API over HTTP
    Serve {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat interactively in the terminal
    Chat {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// gemini, gpt or claude
        #[arg(long)]
        provider: Option<Provider>,

        #[arg(short, long)]
        model: Option<String>,

        /// Send requests to a running playground server instead of calling
        /// the provider directly
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config, host, port } => serve(config, host, port).await,
        Command::Chat {
            config,
            provider,
            model,
            server,
        } => chat(config, provider, model, server).await,
    }
}

async fn serve(config_path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = Config::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let state = AppState {
        chat: ChatAdapter::new(ProviderRegistry::from_config(&config.providers)),
    };
    let app = build_app(state, config.server.request_timeout_seconds);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "Playground listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");

    Ok(())
}

async fn chat(
    config_path: PathBuf,
    provider: Option<Provider>,
    model: Option<String>,
    server: Option<String>,
) -> Result<()> {
    let config = Config::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let provider = provider.unwrap_or(config.playground.provider);
    let model = model.or_else(|| {
        if provider == config.playground.provider {
            Some(config.playground.model.clone())
        } else {
            default_model(provider).map(|m| m.id.to_string())
        }
    });

    let backend: Arc<dyn ChatBackend> = match server {
        Some(url) => {
            info!(%url, "Using remote playground server");
            Arc::new(ChatClient::new(url))
        }
        None => Arc::new(ChatAdapter::new(ProviderRegistry::from_config(
            &config.providers,
        ))),
    };

    let mut session = ChatSession::new(provider, model, CredentialStore::in_memory(), backend);
    repl::run(&mut session).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
