use axum::{
    Json, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Multipart, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::is_supported_extension;
use crate::error::{AppError, AppResult};
use crate::state::{AppState, ServerEvent};

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/graph", get(graph))
        .route("/logs", get(logs))
        .route("/open", get(open_file))
        .route("/upload", post(upload))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.graph_snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "service": "sefs-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "files": snapshot.total_files,
        "clusters": snapshot.clusters.len(),
    }))
}

async fn graph(State(state): State<AppState>) -> Json<crate::state::GraphSnapshot> {
    Json(state.engine.graph_snapshot())
}

async fn logs(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "logs": state.engine.recent_logs(20) }))
}

#[derive(Debug, Deserialize)]
struct OpenQuery {
    path: String,
}

/// Open a document with the OS's default application. Failures are reported
/// in the body, never as an HTTP error.
async fn open_file(Query(query): Query<OpenQuery>) -> Json<serde_json::Value> {
    match open_with_system(&query.path) {
        Ok(()) => Json(serde_json::json!({ "status": "opened" })),
        Err(e) => Json(serde_json::json!({
            "status": "error",
            "message": e.to_string(),
        })),
    }
}

fn open_with_system(path: &str) -> std::io::Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", path])
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    Ok(())
}

/// Multipart upload boundary. Unsupported types are rejected per file with a
/// warning log entry; accepted files land in `.staging/` and the whole batch
/// is ingested followed by one immediate reclustering.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let staging = state.config.staging_dir();
    tokio::fs::create_dir_all(&staging).await?;

    let mut saved: Vec<PathBuf> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(|n| n.to_string()) else {
            continue;
        };

        let ext = std::path::Path::new(&file_name)
            .extension()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase();
        if !is_supported_extension(&ext) {
            state.engine.log_and_broadcast(
                "warning",
                format!("Skipped {file_name} — unsupported type"),
                "⚠️",
            );
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let dest = staged_destination(&staging, &file_name);
        tokio::fs::write(&dest, &bytes).await?;

        state.engine.log_and_broadcast(
            "upload",
            format!(
                "Uploaded: {}",
                dest.file_name().unwrap_or_default().to_string_lossy()
            ),
            "📤",
        );
        saved.push(dest);
    }

    let uploaded: Vec<String> = saved
        .iter()
        .map(|p| p.file_name().unwrap_or_default().to_string_lossy().to_string())
        .collect();
    let count = saved.len();

    if !saved.is_empty() {
        let engine = state.engine.clone();
        tokio::spawn(async move {
            engine.ingest_batch(saved).await;
        });
    }

    Ok(Json(serde_json::json!({
        "status": "ok",
        "uploaded": uploaded,
        "count": count,
    })))
}

/// Pick a collision-free name inside the staging directory.
fn staged_destination(staging: &std::path::Path, file_name: &str) -> PathBuf {
    let candidate = staging.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = std::path::Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let next = staging.join(format!("{stem}_{counter}{ext}"));
        if !next.exists() {
            return next;
        }
        counter += 1;
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push channel: on subscribe the client receives the current snapshot and
/// the recent activity backlog, then every broadcast in order. Send failures
/// evict the subscriber silently.
async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket client connected");
    let mut rx = state.engine.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let initial_snapshot = ServerEvent::GraphUpdate(state.engine.graph_snapshot());
    let initial_logs = ServerEvent::ActivityLog {
        logs: state.engine.recent_logs(20),
    };
    for event in [initial_snapshot, initial_logs] {
        if let Ok(json) = serde_json::to_string(&event) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("WebSocket client lagged, skipped {} events", n);
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // The read side only detects disconnection; incoming frames are ignored.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!("WebSocket client disconnected");
}
