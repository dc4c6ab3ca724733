use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use sefs_backend::{config, embed, engine, server, state, watcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Resolve log directory (platform data dir or from env).
    let log_dir = std::env::var("SEFS_LOG_DIR").unwrap_or_else(|_| {
        dirs::data_local_dir()
            .map(|d| d.join("sefs-backend").join("logs").to_string_lossy().to_string())
            .unwrap_or_else(|| ".sefs-data/logs".to_string())
    });
    std::fs::create_dir_all(&log_dir).ok();

    // File appender: daily rotated log files.
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sefs-backend.log");
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sefs_backend=info,tower_http=info".into());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Log panics before aborting.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        error!(target: "sefs_backend::panic", location = %location, payload = %payload, "PANIC: thread panicked");
        default_panic(info);
    }));

    let config = config::AppConfig::from_env();
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(
        listen_addr = %config.listen_addr,
        root_dir = %config.root_dir.display(),
        debounce_ms = config.debounce.as_millis() as u64,
        recluster_delay_ms = config.recluster_delay.as_millis() as u64,
        reconcile_interval_ms = config.reconcile_interval.as_millis() as u64,
        log_dir = %log_dir,
        "SEFS backend starting"
    );

    let embedder = default_embedder()?;
    let engine = engine::Engine::new(config.clone(), embedder)?;

    let app_state = state::AppState::new(engine.config().clone(), engine.clone());
    let app = server::create_app(app_state);

    // Bind and serve before the startup scan: the health endpoint must be
    // reachable while the initial ingest (potentially slow I/O) runs.
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("SEFS backend listening on {}", addr);

    // Startup scan, then the event source, then the reconciler backstop.
    let scan_engine = engine.clone();
    tokio::spawn(async move {
        scan_engine.startup_scan().await;
    });

    let _watcher = watcher::spawn(engine.clone())?;
    engine::reconcile::spawn(engine.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SEFS backend shutdown complete");
    Ok(())
}

fn default_embedder() -> Result<Arc<dyn embed::Embedder>> {
    #[cfg(feature = "onnx-embedder")]
    {
        Ok(Arc::new(embed::onnx::OnnxEmbedder::new()?))
    }
    #[cfg(not(feature = "onnx-embedder"))]
    {
        Ok(Arc::new(embed::HashEmbedder::new()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, initiating shutdown"); },
        _ = terminate => { info!("Received terminate signal, initiating shutdown"); },
    }
}
