use std::{
    path::{Path as FsPath, PathBuf},
    sync::Arc,
    time::Instant,
};

use api::{ApiError, ModuleSpec, OutputSnapshot, RunRequest, RunResponse};
use axum::{
    Json, Router,
    extract::{
        Path, Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    catalog::discover_modules,
    execution::{ExecutionStore, OutputSubscription, spawn_module_run},
};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub modules_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub results_dir: PathBuf,
    pub interpreter: String,
    pub module_ext: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("modules"),
            logs_dir: PathBuf::from("logs"),
            results_dir: PathBuf::from("results"),
            interpreter: "python3".to_string(),
            module_ext: "py".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub executions: ExecutionStore,
    pub config: Arc<ServerConfig>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            executions: ExecutionStore::new(),
            config: Arc::new(config),
        }
    }
}

pub fn build_api_app(state: ServerState) -> Router {
    Router::new()
        .route("/api/modules", get(modules_handler))
        .route("/api/run", post(run_handler))
        .route("/api/output/{exec_id}", get(output_handler))
        .route("/api/results/{filename}", get(results_handler))
        .layer(middleware::from_fn(access_log_middleware))
        .with_state(state)
}

pub fn build_push_app(state: ServerState) -> Router {
    Router::new()
        .route("/ws/{exec_id}", get(ws_output_handler))
        .with_state(state)
}

async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = elapsed_ms,
        "http access"
    );
    response
}

async fn modules_handler(State(state): State<ServerState>) -> Json<Vec<ModuleSpec>> {
    Json(discover_modules(
        &state.config.modules_dir,
        &state.config.module_ext,
    ))
}

async fn run_handler(
    State(state): State<ServerState>,
    Json(request): Json<RunRequest>,
) -> Response {
    let Some(module_path) = resolve_module_path(&state.config.modules_dir, &request.path) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "Invalid module path".to_string(),
            }),
        )
            .into_response();
    };

    match spawn_module_run(
        &state.executions,
        &state.config.interpreter,
        &module_path,
        &request.inputs,
        &state.config.logs_dir,
    )
    .await
    {
        Ok(exec_id) => Json(RunResponse { exec_id }).into_response(),
        Err(err) => {
            warn!("failed to start module path={}: {err}", request.path);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: format!("failed to start module: {err}"),
                }),
            )
                .into_response()
        }
    }
}

// Only files that resolve inside the modules directory are runnable.
fn resolve_module_path(modules_dir: &FsPath, requested: &str) -> Option<PathBuf> {
    let candidate = FsPath::new(requested).canonicalize().ok()?;
    let root = modules_dir.canonicalize().ok()?;
    if candidate.starts_with(&root) && candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

async fn output_handler(
    State(state): State<ServerState>,
    Path(exec_id): Path<String>,
) -> Response {
    let Some((log_path, done)) = state.executions.snapshot(&exec_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "Execution ID not found.".to_string(),
            }),
        )
            .into_response();
    };

    match tokio::fs::read_to_string(&log_path).await {
        Ok(log) => Json(OutputSnapshot {
            log: Some(log),
            done,
        })
        .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "Log file not available.".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn results_handler(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> Response {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "File not found".to_string(),
            }),
        )
            .into_response()
    };

    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return not_found();
    }

    match tokio::fs::read(state.config.results_dir.join(&filename)).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => not_found(),
    }
}

async fn ws_output_handler(
    Path(exec_id): Path<String>,
    State(state): State<ServerState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let subscription = state.executions.subscribe(&exec_id).await;
    ws.on_upgrade(move |socket| stream_output(socket, exec_id, subscription))
}

async fn stream_output(mut socket: WebSocket, exec_id: String, subscription: OutputSubscription) {
    match subscription {
        OutputSubscription::Unknown => {
            let _ = socket
                .send(Message::Text("[!] Unknown execution id\n".into()))
                .await;
        }
        OutputSubscription::Finished(log_path) => {
            // Run already over: deliver the captured log in one frame.
            if let Ok(log) = tokio::fs::read_to_string(&log_path).await {
                let _ = socket.send(Message::Text(log.into())).await;
            }
        }
        OutputSubscription::Live(mut receiver) => loop {
            match receiver.recv().await {
                Ok(line) => {
                    if socket
                        .send(Message::Text(format!("{line}\n").into()))
                        .await
                        .is_err()
                    {
                        debug!("live output subscriber left exec_id={exec_id}");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("live output subscriber lagged exec_id={exec_id} skipped={skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        },
    }
}
