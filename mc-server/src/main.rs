use std::{env, net::SocketAddr, path::PathBuf};

use mc_server::{ServerConfig, ServerState, build_api_app, build_push_app};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if wants_version_flag() {
        println!("{}", binary_version_text());
        return Ok(());
    }

    init_logging();
    info!("{}", binary_version_text());

    let api_addr = parse_addr("MC_API_ADDR", "0.0.0.0:5050")?;
    let ws_addr = parse_addr("MC_WS_ADDR", "0.0.0.0:8765")?;
    let config = ServerConfig {
        modules_dir: parse_path("MC_MODULES_DIR", "modules"),
        logs_dir: parse_path("MC_LOGS_DIR", "logs"),
        results_dir: parse_path("MC_RESULTS_DIR", "results"),
        interpreter: parse_string("MC_INTERPRETER", "python3"),
        module_ext: parse_string("MC_MODULE_EXT", "py"),
    };

    std::fs::create_dir_all(&config.logs_dir)?;
    std::fs::create_dir_all(&config.results_dir)?;

    let state = ServerState::new(config);
    let api_app = build_api_app(state.clone());
    let push_app = build_push_app(state);

    let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
    let push_listener = tokio::net::TcpListener::bind(ws_addr).await?;
    info!("api listening on http://{}", api_listener.local_addr()?);
    info!(
        "live output listening on ws://{}",
        push_listener.local_addr()?
    );

    let api_server = axum::serve(api_listener, api_app);
    let push_server = axum::serve(push_listener, push_app);

    tokio::select! {
        result = api_server => result?,
        result = push_server => result?,
    }

    Ok(())
}

fn init_logging() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn parse_addr(key: &str, default: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    Ok(value.parse()?)
}

fn parse_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn wants_version_flag() -> bool {
    env::args()
        .skip(1)
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
}

fn binary_version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
