//! Verity HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use verity::config::Config;
use verity::gateway::{AppState, ClientRateLimiter, create_router};
use verity::models::ModelManager;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        index = %config.index_path.display(),
        snippets = %config.snippets_path.display(),
        embedding_model = %config.embedding_model,
        "Verity starting"
    );

    if config.embed_model_path.is_none() {
        tracing::warn!("No VERITY_EMBED_MODEL_PATH configured, running encoder in stub mode");
    }
    if config.nli_model_path.is_none() {
        tracing::warn!("No VERITY_NLI_MODEL_PATH configured, running entailment in stub mode");
    }

    let models = Arc::new(ModelManager::from_config(&config));
    let loader = Arc::clone(&models);
    tokio::task::spawn_blocking(move || loader.load_models())
        .await
        .context("model loading task panicked")?
        .context("failed to load models")?;

    let kb_size = models.get_snippets()?.len();
    tracing::info!(kb_size, "Models loaded");

    let state = AppState::from_config(&config, Arc::clone(&models));
    spawn_limiter_sweeper(state.limiter.clone());

    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Verity shutdown complete");
    Ok(())
}

fn spawn_limiter_sweeper(limiter: ClientRateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            tracing::debug!(clients = limiter.tracked_clients(), "Swept rate limiter state");
        }
    });
}

fn run_health_check() -> i32 {
    let port = std::env::var("VERITY_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or_else(|| Config::default().port);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
