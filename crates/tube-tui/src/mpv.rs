//! mpv IPC driver.
//!
//! Spawns mpv in idle mode and talks JSON over its unix IPC socket.  A single
//! IO task owns both halves of the socket and the pending-request map:
//!
//! ```text
//!   MpvHandle::send()  ── mpsc ──▶ io_task ── socket ──▶ mpv
//!                                    │
//!                                    ├── response (request_id) → oneshot reply
//!                                    └── unsolicited event     → event_tx
//! ```
//!
//! Because one task does all the socket IO there is no shared lock around the
//! pending map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An mpv event that arrived unsolicited (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns the event name, e.g. "end-file", "start-file", "file-loaded".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// Returns the end-file reason, e.g. "eof", "stop", "error".
    pub fn end_file_reason(&self) -> Option<&str> {
        self.raw.get("reason")?.as_str()
    }
}

/// Cloneable handle to the mpv IO task.  `send()` fires a command and awaits
/// the matching response.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv IO task gone"))?;

        tokio::time::timeout(tokio::time::Duration::from_secs(5), reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    pub async fn load_stream(&self, url: &str, volume: u8) -> anyhow::Result<()> {
        self.send(json!(["loadfile", url])).await?;
        let _ = self
            .send(json!(["set_property", "volume", volume.min(100)]))
            .await;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn set_volume(&self, volume: u8) -> anyhow::Result<()> {
        self.send(json!(["set_property", "volume", volume.min(100)]))
            .await?;
        Ok(())
    }

    /// Health-check: returns Ok(()) if mpv is responsive.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "volume"])).await?;
        Ok(())
    }
}

/// Owns the mpv child process.
pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
}

impl MpvDriver {
    pub fn new() -> Self {
        Self {
            socket_name: tube_core::platform::mpv_socket_name(),
            process: None,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        if let Some(ref mut child) = self.process {
            child.try_wait().ok().flatten().is_none()
        } else {
            false
        }
    }

    /// Kill the process if running.
    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    /// Spawn a fresh mpv process and connect to its IPC socket.
    pub async fn spawn_and_connect(
        &mut self,
        volume: u8,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        // Kill stale process
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        info!("mpv: spawning new process");
        let mpv_binary = tube_core::platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found, make sure mpv is installed"))?;

        let child = tokio::process::Command::new(mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg(tube_core::platform::mpv_socket_arg())
            .arg("--quiet")
            .arg(format!("--volume={}", volume.min(100)))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;
        self.process = Some(child);

        // Wait for the socket to appear
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");

        let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);
        tokio::spawn(io_task(stream, cmd_rx, event_tx));
        Ok(MpvHandle { tx: cmd_tx })
    }
}

/// Single task owning the write half and the pending map: writes queued
/// requests, matches responses to requests by id.  A helper task pumps socket
/// lines into a channel so the select below only races cancel-safe `recv`s.
async fn io_task(
    stream: UnixStream,
    mut cmd_rx: mpsc::Receiver<PendingRequest>,
    event_tx: mpsc::Sender<MpvEvent>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut pending: HashMap<u64, oneshot::Sender<anyhow::Result<Value>>> = HashMap::new();

    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("mpv io: connection closed");
                    break;
                }
                Ok(_) => {
                    if line_tx.send(std::mem::take(&mut line)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("mpv io: read error: {}", e);
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            req = cmd_rx.recv() => {
                let Some(req) = req else {
                    debug!("mpv io: command channel closed, exiting");
                    break;
                };
                debug!("mpv io: send req={} payload={}", req.req_id, req.payload.trim());
                if let Err(e) = write_half.write_all(req.payload.as_bytes()).await {
                    warn!("mpv io: write error: {}", e);
                    let _ = req.reply.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
                    break;
                }
                pending.insert(req.req_id, req.reply);
            }

            line = line_rx.recv() => {
                let Some(line) = line else {
                    // Reader ended; the socket is gone.
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv io: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };
                dispatch_line(val, &mut pending, &event_tx).await;
            }
        }
    }

    // Fail whatever is still waiting
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("mpv IPC connection closed")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_handle() -> MpvHandle {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        MpvHandle { tx }
    }

    #[tokio::test]
    async fn test_stop_reports_lost_io_task() {
        assert!(dead_handle().stop().await.is_err());
    }

    #[tokio::test]
    async fn test_set_volume_reports_lost_io_task() {
        assert!(dead_handle().set_volume(50).await.is_err());
    }

    #[test]
    fn test_end_file_reason_extraction() {
        let evt = MpvEvent {
            raw: json!({"event": "end-file", "reason": "error"}),
        };
        assert_eq!(evt.event_name(), Some("end-file"));
        assert_eq!(evt.end_file_reason(), Some("error"));

        let evt = MpvEvent {
            raw: json!({"event": "idle"}),
        };
        assert_eq!(evt.end_file_reason(), None);
    }
}

async fn dispatch_line(
    val: Value,
    pending: &mut HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>,
    event_tx: &mpsc::Sender<MpvEvent>,
) {
    if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
        if let Some(tx) = pending.remove(&req_id) {
            let result = if val["error"].as_str() == Some("success") {
                debug!("mpv io: response req={} ok", req_id);
                Ok(val)
            } else {
                let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                debug!("mpv io: response req={} err={}", req_id, err);
                Err(anyhow::anyhow!("mpv error: {}", err))
            };
            let _ = tx.send(result);
        } else {
            debug!("mpv io: response for unknown req={}", req_id);
        }
    } else {
        debug!("mpv io: event {}", val);
        let _ = event_tx.send(MpvEvent { raw: val }).await;
    }
}
