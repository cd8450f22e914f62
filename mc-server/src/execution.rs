use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use api::IndexMap;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, Command},
    sync::{RwLock, broadcast, mpsc},
};
use tracing::{info, warn};
use uuid::Uuid;

const OUTPUT_CHANNEL_CAPACITY: usize = 256;

struct ExecutionRecord {
    log_path: PathBuf,
    done: bool,
    // Present while the process is still producing output; dropped on
    // completion so live subscribers see the channel close.
    output_tx: Option<broadcast::Sender<String>>,
}

/// Bookkeeping for every run started since the server came up.
/// Entries are never evicted; the log file is the source of truth for
/// snapshot requests.
#[derive(Clone, Default)]
pub struct ExecutionStore {
    inner: Arc<RwLock<HashMap<String, ExecutionRecord>>>,
}

pub enum OutputSubscription {
    Unknown,
    Finished(PathBuf),
    Live(broadcast::Receiver<String>),
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, exec_id: &str) -> Option<(PathBuf, bool)> {
        let guard = self.inner.read().await;
        guard
            .get(exec_id)
            .map(|record| (record.log_path.clone(), record.done))
    }

    pub async fn subscribe(&self, exec_id: &str) -> OutputSubscription {
        let guard = self.inner.read().await;
        match guard.get(exec_id) {
            None => OutputSubscription::Unknown,
            Some(record) => match &record.output_tx {
                Some(sender) => OutputSubscription::Live(sender.subscribe()),
                None => OutputSubscription::Finished(record.log_path.clone()),
            },
        }
    }

    async fn insert(&self, exec_id: String, log_path: PathBuf, output_tx: broadcast::Sender<String>) {
        let mut guard = self.inner.write().await;
        guard.insert(
            exec_id,
            ExecutionRecord {
                log_path,
                done: false,
                output_tx: Some(output_tx),
            },
        );
    }

    async fn finish(&self, exec_id: &str) {
        let mut guard = self.inner.write().await;
        if let Some(record) = guard.get_mut(exec_id) {
            record.done = true;
            record.output_tx = None;
        }
    }
}

/// Spawns `<interpreter> <module> --key value ...` and streams its
/// merged stdout/stderr into the execution log and the live output
/// channel. Returns the execution id as soon as the process is up.
pub async fn spawn_module_run(
    store: &ExecutionStore,
    interpreter: &str,
    module_path: &Path,
    inputs: &IndexMap<String, String>,
    logs_dir: &Path,
) -> io::Result<String> {
    let exec_id = Uuid::new_v4().to_string();
    tokio::fs::create_dir_all(logs_dir).await?;
    let log_path = logs_dir.join(format!("{exec_id}.log"));
    let log_file = tokio::fs::File::create(&log_path).await?;

    let mut command = Command::new(interpreter);
    command
        .arg(module_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in inputs {
        command.arg(format!("--{key}")).arg(value);
    }

    let mut child = command.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("child stderr not captured"))?;

    let (line_tx, line_rx) = mpsc::channel::<String>(OUTPUT_CHANNEL_CAPACITY);
    forward_lines(stdout, line_tx.clone());
    forward_lines(stderr, line_tx);

    let (output_tx, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
    store
        .insert(exec_id.clone(), log_path, output_tx.clone())
        .await;

    info!("module run started exec_id={exec_id} path={}", module_path.display());

    let supervisor_store = store.clone();
    let id = exec_id.clone();
    tokio::spawn(async move {
        if let Err(err) = supervise_run(child, line_rx, log_file, &output_tx).await {
            warn!("run supervision failed exec_id={id}: {err}");
        }
        supervisor_store.finish(&id).await;
    });

    Ok(exec_id)
}

async fn supervise_run(
    mut child: Child,
    mut line_rx: mpsc::Receiver<String>,
    mut log_file: tokio::fs::File,
    output_tx: &broadcast::Sender<String>,
) -> io::Result<()> {
    while let Some(line) = line_rx.recv().await {
        log_file.write_all(line.as_bytes()).await?;
        log_file.write_all(b"\n").await?;
        log_file.flush().await?;
        let _ = output_tx.send(line);
    }

    let status = child.wait().await?;
    let exit_line = format!(
        "[process exited with return code {}]",
        status.code().unwrap_or(-1)
    );
    log_file.write_all(exit_line.as_bytes()).await?;
    log_file.write_all(b"\n").await?;
    log_file.flush().await?;
    let _ = output_tx.send(exit_line);
    Ok(())
}

fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}
