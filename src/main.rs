use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollgate::config::{ResolverConfig, TollgateConfig};
use tollgate::http::{AdmissionState, HttpServer};
use tollgate::limiter::{LimiterEngine, Quota, QuotaResolver, ResolverPolicy};
use tollgate::store::{CounterStore, MemoryStore, RedisStore};

/// Quota-based request admission service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured listen address
    #[arg(short, long)]
    listen: Option<std::net::SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    info!("Starting Tollgate Admission Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => TollgateConfig::from_file(path)?,
        None => TollgateConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    let default_quota = config.limiter.default_quota()?;
    info!(
        listen_addr = %config.server.listen_addr,
        window = %config.limiter.window,
        credits = default_quota.credits,
        "Configuration loaded"
    );

    let store: Arc<dyn CounterStore> = match config.store.redis_url {
        Some(ref url) => {
            Arc::new(RedisStore::connect(url, config.store.operation_timeout()).await?)
        }
        None => {
            info!("No redis_url configured, using in-process counter store");
            Arc::new(MemoryStore::new())
        }
    };

    let policy = match config.limiter.resolver {
        ResolverConfig::TokenOverride {
            token_secret,
            window_claim,
            credits_claim,
        } => ResolverPolicy::TokenOverride {
            secret: token_secret,
            window_claim,
            credits_claim,
        },
        ResolverConfig::CredentialSplit {
            authenticated_credits,
            anonymous_credits,
        } => ResolverPolicy::CredentialSplit {
            authenticated: Quota::new(default_quota.window, authenticated_credits),
            anonymous: Quota::new(default_quota.window, anonymous_credits),
        },
    };

    let state = AdmissionState {
        engine: Arc::new(LimiterEngine::new(store)),
        resolver: Arc::new(QuotaResolver::new(default_quota, policy)),
        credential_header: config.limiter.credential_header,
    };

    let server = HttpServer::new(config.server.listen_addr, state);

    // Run the server with graceful shutdown on Ctrl+C or SIGTERM
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Tollgate Admission Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
