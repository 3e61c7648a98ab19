//! Kubernetes secrets via kubectl
//!
//! Listing runs `kubectl get secrets --all-namespaces -o json`. Watching adds
//! `--watch --output-watch-events`, which prints one JSON object per event
//! (`{"type": "ADDED", "object": {...}}`) back to back on stdout; the stream is
//! decoded incrementally as chunks arrive.

use crate::error::SourceError;
use crate::source::SecretSource;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use s3_operator_core::{EventKind, FieldMap, ManagedRecord, RecordEvent};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const DEFAULT_BINARY: &str = "kubectl";
const CHANNEL_CAPACITY: usize = 64;
const READ_BUFFER: usize = 16 * 1024;
/// Extra time a listing gets beyond its request timeout before it is killed
const LIST_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct KubeSecretList {
    #[serde(default)]
    items: Vec<KubeSecret>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct KubeSecret {
    metadata: KubeMetadata,
    data: Option<BTreeMap<String, String>>,
    string_data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct KubeMetadata {
    namespace: String,
    name: String,
    annotations: Option<BTreeMap<String, String>>,
    resource_version: String,
}

#[derive(Debug, Deserialize)]
struct KubeWatchEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    object: KubeSecret,
}

impl KubeSecret {
    fn into_record(self) -> ManagedRecord {
        let mut data = FieldMap::new();
        for (key, encoded) in self.data.unwrap_or_default() {
            match STANDARD.decode(encoded.as_bytes()) {
                Ok(bytes) => {
                    data.insert(key, String::from_utf8_lossy(&bytes).into_owned());
                }
                Err(e) => warn!(
                    "Secret {}/{}: field {} is not valid base64, ignoring it: {}",
                    self.metadata.namespace, self.metadata.name, key, e
                ),
            }
        }

        ManagedRecord {
            namespace: self.metadata.namespace,
            name: self.metadata.name,
            annotations: self.metadata.annotations.unwrap_or_default(),
            data,
            string_data: self.string_data.unwrap_or_default(),
            resource_version: self.metadata.resource_version,
        }
    }
}

/// Parse the output of `kubectl get secrets -o json`
pub fn parse_secret_list(json: &str) -> Result<Vec<ManagedRecord>, SourceError> {
    let list: KubeSecretList = serde_json::from_str(json)?;
    Ok(list.items.into_iter().map(KubeSecret::into_record).collect())
}

/// Incremental decoder for the `--output-watch-events` stream
#[derive(Debug, Default)]
pub struct WatchDecoder {
    buffer: Vec<u8>,
}

impl WatchDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of output and return every event completed by it.
    ///
    /// A trailing partial object stays buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<RecordEvent>, SourceError> {
        self.buffer.extend_from_slice(chunk);

        let mut raw = Vec::new();
        let mut failure = None;
        let consumed = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<KubeWatchEvent>();
            loop {
                match stream.next() {
                    Some(Ok(event)) => raw.push(event),
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => {
                        failure = Some(e);
                        break;
                    }
                    None => break,
                }
            }
            stream.byte_offset()
        };

        if let Some(e) = failure {
            self.buffer.clear();
            return Err(e.into());
        }
        self.buffer.drain(..consumed);

        Ok(raw.into_iter().filter_map(convert_event).collect())
    }

    /// Bytes waiting for the rest of an object
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn convert_event(event: KubeWatchEvent) -> Option<RecordEvent> {
    match EventKind::from_watch_type(&event.event_type) {
        Some(kind) => Some(RecordEvent::new(kind, event.object.into_record())),
        None if event.event_type == "ERROR" => {
            warn!("Watch reported an error event, the session will be restarted");
            None
        }
        None => {
            debug!("Ignoring watch event of type {}", event.event_type);
            None
        }
    }
}

/// Change source backed by the kubectl CLI
#[derive(Debug, Clone)]
pub struct KubectlSource {
    binary_path: String,
    kubeconfig: Option<PathBuf>,
    request_timeout: Duration,
    watch_timeout: Duration,
}

impl Default for KubectlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl KubectlSource {
    pub fn new() -> Self {
        Self {
            binary_path: DEFAULT_BINARY.to_string(),
            kubeconfig: None,
            request_timeout: Duration::from_secs(30),
            watch_timeout: Duration::from_secs(300),
        }
    }

    /// Use a specific kubectl binary
    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        self.binary_path = path.into();
        self
    }

    pub fn with_kubeconfig(mut self, path: Option<PathBuf>) -> Self {
        self.kubeconfig = path;
        self
    }

    /// Upper bound for one listing
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Server-side lifetime of one watch session
    pub fn with_watch_timeout(mut self, timeout: Duration) -> Self {
        self.watch_timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    fn get_args() -> Vec<String> {
        ["get", "secrets", "--all-namespaces", "-o", "json"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn list_args(&self) -> Vec<String> {
        let mut args = Self::get_args();
        args.push(format!("--request-timeout={}s", self.request_timeout.as_secs().max(1)));
        args
    }

    pub fn watch_args(&self) -> Vec<String> {
        let mut args = Self::get_args();
        args.push("--watch".to_string());
        args.push("--output-watch-events".to_string());
        args.push(format!("--request-timeout={}s", self.watch_timeout.as_secs()));
        args
    }

    fn spawn_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Spawn {
            program: self.binary_path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SecretSource for KubectlSource {
    async fn list(&self) -> Result<Vec<ManagedRecord>, SourceError> {
        let deadline = self.request_timeout + LIST_GRACE;
        let output = tokio::time::timeout(
            deadline,
            self.command()
                .args(self.list_args())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SourceError::TimedOut {
            program: self.binary_path.clone(),
            timeout: deadline,
        })?
        .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: self.binary_path.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let records = parse_secret_list(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Listed {} secret(s)", records.len());
        Ok(records)
    }

    async fn watch(&self) -> Result<mpsc::Receiver<RecordEvent>, SourceError> {
        let mut child = self
            .command()
            .args(self.watch_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Unavailable("kubectl stdout not captured".to_string()))?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let program = self.binary_path.clone();

        tokio::spawn(async move {
            let stderr_task = tokio::spawn(async move {
                let mut text = String::new();
                if let Some(mut stderr) = stderr {
                    let _ = stderr.read_to_string(&mut text).await;
                }
                text
            });

            let receiver_open = forward_events(stdout, &tx).await;
            let _ = child.start_kill();
            let status = child.wait().await;
            let stderr = stderr_task.await.unwrap_or_default();

            if !receiver_open {
                debug!("Watch consumer went away, stopped {}", program);
                return;
            }
            match status {
                Ok(status) if status.success() => info!("Watch session ended"),
                Ok(status) => warn!(
                    "{} watch exited with {}: {}",
                    program,
                    status,
                    stderr.trim()
                ),
                Err(e) => warn!("Failed to reap {} watch: {}", program, e),
            }
        });

        Ok(rx)
    }
}

/// Decode events from `reader` into `tx` until the output ends.
///
/// Returns `false` when the receiving side was dropped first.
async fn forward_events<R>(mut reader: R, tx: &mpsc::Sender<RecordEvent>) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut decoder = WatchDecoder::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let read = tokio::select! {
            read = reader.read(&mut buf) => read,
            _ = tx.closed() => return false,
        };

        let n = match read {
            Ok(0) => return true,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read watch output: {}", e);
                return true;
            }
        };

        let events = match decoder.push(&buf[..n]) {
            Ok(events) => events,
            Err(e) => {
                warn!("Dropping watch session: {}", e);
                return true;
            }
        };

        for event in events {
            if tx.send(event).await.is_err() {
                return false;
            }
        }
    }
}
