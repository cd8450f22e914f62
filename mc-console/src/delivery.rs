use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::{client::ApiClient, output::SharedPane};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_PUSH_PORT: u16 = 8765;

const COMPLETION_MARKERS: [&str; 3] = ["return code", "completed", "exited"];
const POLL_FAILED_MARKER: &str = "\n[!] Output polling failed.";
const CHANNEL_ERROR_MARKER: &str = "\n[!] Live output channel error.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    Poll,
    Push,
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "poll" => Ok(Self::Poll),
            "push" => Ok(Self::Push),
            other => Err(format!("unknown delivery mode: {other} (expected poll or push)")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    pub poll_interval: Duration,
    pub push_host: String,
    pub push_port: u16,
}

/// One live output-delivery session. The console holds at most one;
/// dispatching a new run supersedes the old session before the new one
/// can touch the pane.
pub struct OutputSession {
    exec_id: String,
    task: JoinHandle<()>,
}

impl OutputSession {
    pub fn exec_id(&self) -> &str {
        &self.exec_id
    }

    /// Stops the session and waits for its task to finish, so no late
    /// tick or frame can write to the pane afterwards.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

/// Supersedes `previous`, if any, then starts delivery for `exec_id`
/// with the configured variant.
pub async fn start_session(
    previous: Option<OutputSession>,
    client: ApiClient,
    config: &DeliveryConfig,
    pane: SharedPane,
    exec_id: String,
) -> OutputSession {
    if let Some(previous) = previous {
        previous.shutdown().await;
    }

    let task = match config.mode {
        DeliveryMode::Poll => {
            let interval = config.poll_interval;
            let id = exec_id.clone();
            tokio::spawn(async move { poll_output(client, interval, pane, id).await })
        }
        DeliveryMode::Push => {
            let url = format!(
                "ws://{}:{}/ws/{}",
                config.push_host, config.push_port, exec_id
            );
            let id = exec_id.clone();
            tokio::spawn(async move { follow_push_output(url, pane, id).await })
        }
    };
    OutputSession { exec_id, task }
}

async fn poll_output(client: ApiClient, interval: Duration, pane: SharedPane, exec_id: String) {
    loop {
        tokio::time::sleep(interval).await;
        match client.fetch_output(&exec_id).await {
            Ok(snapshot) => {
                if let Some(log) = snapshot.log.as_deref()
                    && !log.is_empty()
                {
                    pane.lock().await.replace(log);
                }
                if run_finished(snapshot.log.as_deref()) {
                    debug!("output polling finished exec_id={exec_id}");
                    break;
                }
            }
            Err(err) => {
                // Failures append a marker even though normal ticks replace.
                warn!("output poll failed exec_id={exec_id}: {err}");
                pane.lock().await.append(POLL_FAILED_MARKER);
                break;
            }
        }
    }
}

/// Completion check for polled snapshots: any of the three markers in
/// a non-empty log stops the poll for good.
fn run_finished(log: Option<&str>) -> bool {
    match log {
        Some(log) if !log.is_empty() => {
            COMPLETION_MARKERS.iter().any(|marker| log.contains(marker))
        }
        _ => false,
    }
}

async fn follow_push_output(url: String, pane: SharedPane, exec_id: String) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!("live output connect failed exec_id={exec_id}: {err}");
            pane.lock().await.append(CHANNEL_ERROR_MARKER);
            return;
        }
    };

    // The console never sends anything on this channel.
    let (_write, mut read) = stream.split();
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => pane.lock().await.append(text.as_str()),
            Ok(Message::Close(_)) => {
                debug!("live output channel closed exec_id={exec_id}");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("live output channel error exec_id={exec_id}: {err}");
                pane.lock().await.append(CHANNEL_ERROR_MARKER);
                break;
            }
        }
    }
}
