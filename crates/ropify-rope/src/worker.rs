//! Rope Worker Manager: spawns and communicates with the Python subprocess.
//!
//! - Spawn worker subprocess with JSON-lines protocol
//! - Wait for ready message
//! - Send requests and receive responses
//! - Shut the worker down on drop
//!
//! Protocol: JSON-lines over stdin/stdout
//! - Request: `{"id": <int>, "op": "<operation>", ...params...}`
//! - Response: `{"id": <int>, "status": "ok"|"error", ...result...}`
//!
//! The worker's stderr is inherited, so rope's own diagnostics (index builds
//! in particular) reach the user's terminal without touching the protocol.
//! There are no timeouts: index builds over large environments can take
//! minutes and the caller is a single interactive command.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Embedded worker script.
const WORKER_SCRIPT: &str = include_str!("rope_worker.py");

/// File name the script is materialized under.
const WORKER_SCRIPT_NAME: &str = "rope_worker.py";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during worker operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Worker process failed to start.
    #[error("failed to spawn rope worker: {reason}")]
    SpawnFailed { reason: String },

    /// Worker process died or closed its pipes.
    #[error("rope worker crashed: {reason}")]
    WorkerCrashed { reason: String },

    /// Worker returned an error response.
    #[error("{code}: {message}")]
    WorkerResponseError {
        code: String,
        message: String,
        traceback: Option<String>,
    },

    /// Invalid response from worker.
    #[error("invalid worker response: {reason}")]
    InvalidResponse { reason: String },

    /// IO error during worker communication.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Python interpreter not found.
    #[error("Python interpreter not found at {path}")]
    PythonNotFound { path: PathBuf },
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

// ============================================================================
// Protocol Types
// ============================================================================

/// Worker ready message (sent on startup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyMessage {
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub rope_version: String,
}

/// Generic worker response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResponse {
    /// Request ID (echoed back).
    pub id: Option<u64>,
    /// Status: "ok" or "error".
    pub status: String,
    /// Error code (if status == "error").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error message (if status == "error").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Python traceback for unexpected exceptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    /// Additional data (operation-specific).
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Result of `create_move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveInfo {
    pub handle: String,
    pub name: String,
    /// "global", "module" or "method".
    pub kind: String,
    /// Project-relative path of the defining resource.
    pub origin: String,
}

/// Result of `get_changes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesInfo {
    pub handle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub changed: Vec<String>,
}

// ============================================================================
// Worker Handle
// ============================================================================

/// Handle to a running rope worker process.
pub struct WorkerHandle {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_reader: Option<BufReader<ChildStdout>>,
    /// Next request ID (monotonically increasing).
    next_request_id: u64,
    /// Directory holding the materialized script; removed on drop.
    _script_dir: TempDir,
    worker_version: Option<String>,
}

impl WorkerHandle {
    /// Check if the worker is running.
    pub fn is_running(&self) -> bool {
        self.child.is_some() && self.stdin.is_some() && self.stdout_reader.is_some()
    }

    pub fn worker_version(&self) -> Option<&str> {
        self.worker_version.as_deref()
    }

    /// Send a request and wait for its response.
    pub fn send_request(
        &mut self,
        op: &str,
        params: serde_json::Value,
    ) -> WorkerResult<WorkerResponse> {
        if !self.is_running() {
            return Err(WorkerError::WorkerCrashed {
                reason: "worker is not running".to_string(),
            });
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let mut request = serde_json::json!({
            "id": request_id,
            "op": op,
        });
        if let (serde_json::Value::Object(params_map), serde_json::Value::Object(req_map)) =
            (params, &mut request)
        {
            for (k, v) in params_map {
                req_map.insert(k, v);
            }
        }

        let request_line = serde_json::to_string(&request)?;
        tracing::debug!(op, id = request_id, "worker request");

        let write_result = match self.stdin.as_mut() {
            Some(stdin) => writeln!(stdin, "{}", request_line).and_then(|_| stdin.flush()),
            None => Ok(()),
        };
        if let Err(e) = write_result {
            self.mark_crashed();
            return Err(WorkerError::WorkerCrashed {
                reason: e.to_string(),
            });
        }

        loop {
            let mut line = String::new();
            let read = match self.stdout_reader.as_mut() {
                Some(reader) => reader.read_line(&mut line),
                None => Ok(0),
            };
            match read {
                Ok(0) => {
                    self.mark_crashed();
                    return Err(WorkerError::WorkerCrashed {
                        reason: "unexpected EOF".to_string(),
                    });
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let response: WorkerResponse =
                        serde_json::from_str(line).map_err(|e| WorkerError::InvalidResponse {
                            reason: format!("JSON parse error: {}: {}", e, line),
                        })?;

                    if response.id != Some(request_id) {
                        tracing::warn!(
                            expected = request_id,
                            got = ?response.id,
                            "skipping response for another request"
                        );
                        continue;
                    }

                    if response.status == "error" {
                        return Err(WorkerError::WorkerResponseError {
                            code: response.error_code.unwrap_or_default(),
                            message: response.message.unwrap_or_default(),
                            traceback: response.traceback,
                        });
                    }

                    tracing::debug!(op, id = request_id, "worker response ok");
                    return Ok(response);
                }
                Err(e) => {
                    self.mark_crashed();
                    return Err(WorkerError::WorkerCrashed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    // ========================================================================
    // High-Level Operations
    // ========================================================================

    /// Open a rope project. Returns the root rope reports.
    pub fn open_project(&mut self, root: &Path, ropefolder: Option<&str>) -> WorkerResult<String> {
        let params = serde_json::json!({
            "root": root.to_string_lossy(),
            "ropefolder": ropefolder,
        });
        let response = self.send_request("open_project", params)?;
        string_field(&response, "root", "open_project")
    }

    /// Create a move operation for a resource and optional character offset.
    pub fn create_move(&mut self, path: &str, offset: Option<usize>) -> WorkerResult<MoveInfo> {
        let params = serde_json::json!({
            "path": path,
            "offset": offset,
        });
        let response = self.send_request("create_move", params)?;
        Ok(serde_json::from_value(response.data)?)
    }

    /// Ask rope whether a resource is a Python source file.
    pub fn is_python_file(&mut self, path: &str, kind: &str) -> WorkerResult<bool> {
        let params = serde_json::json!({
            "path": path,
            "kind": kind,
        });
        let response = self.send_request("is_python_file", params)?;
        Ok(response
            .data
            .get("python_file")
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// Compute the change set for a pending move.
    pub fn get_changes(
        &mut self,
        move_handle: &str,
        destination: &str,
        kind: &str,
    ) -> WorkerResult<ChangesInfo> {
        let params = serde_json::json!({
            "move": move_handle,
            "destination": destination,
            "kind": kind,
        });
        let response = self.send_request("get_changes", params)?;
        Ok(serde_json::from_value(response.data)?)
    }

    /// Apply a previously computed change set.
    pub fn apply_changes(&mut self, changes_handle: &str) -> WorkerResult<()> {
        let params = serde_json::json!({ "changes": changes_handle });
        self.send_request("apply_changes", params)?;
        Ok(())
    }

    /// Query the autoimport index for modules defining `name`.
    pub fn import_candidates(&mut self, name: &str) -> WorkerResult<Vec<String>> {
        let params = serde_json::json!({ "name": name });
        let response = self.send_request("import_candidates", params)?;
        let modules = response
            .data
            .get("modules")
            .cloned()
            .unwrap_or_else(|| serde_json::json!([]));
        Ok(serde_json::from_value(modules)?)
    }

    /// Gracefully shutdown the worker.
    pub fn shutdown(&mut self) -> WorkerResult<()> {
        if !self.is_running() {
            return Ok(());
        }

        let _ = self.send_request("shutdown", serde_json::json!({}));

        // Closing stdin ends the worker's read loop even if shutdown failed.
        self.stdin = None;
        self.stdout_reader = None;
        if let Some(mut child) = self.child.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    let _ = child.wait();
                }
            }
        }

        tracing::debug!("rope worker shut down");
        Ok(())
    }

    // ========================================================================
    // Internal Methods
    // ========================================================================

    /// Mark worker as crashed (clear handles).
    fn mark_crashed(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stdin = None;
        self.stdout_reader = None;
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn string_field(response: &WorkerResponse, field: &str, op: &str) -> WorkerResult<String> {
    response
        .data
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| WorkerError::InvalidResponse {
            reason: format!("missing {} in {} response", field, op),
        })
}

// ============================================================================
// Spawn Function
// ============================================================================

/// Spawn a rope worker process.
///
/// This function:
/// 1. Materializes the worker script into a private temporary directory
/// 2. Spawns the Python process
/// 3. Waits for the ready message
pub fn spawn_worker(python_path: &Path) -> WorkerResult<WorkerHandle> {
    if !python_path.exists() {
        return Err(WorkerError::PythonNotFound {
            path: python_path.to_path_buf(),
        });
    }

    let script_dir = tempfile::Builder::new().prefix("ropify-").tempdir()?;
    let script_path = materialize_worker_script(script_dir.path())?;

    let mut child = Command::new(python_path)
        .arg("-u")
        .arg(&script_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| WorkerError::SpawnFailed {
            reason: e.to_string(),
        })?;

    let stdin = child.stdin.take().ok_or_else(|| WorkerError::SpawnFailed {
        reason: "failed to capture stdin".to_string(),
    })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| WorkerError::SpawnFailed {
            reason: "failed to capture stdout".to_string(),
        })?;

    tracing::info!(pid = child.id(), python = %python_path.display(), "spawned rope worker");

    let mut handle = WorkerHandle {
        child: Some(child),
        stdin: Some(stdin),
        stdout_reader: Some(BufReader::new(stdout)),
        next_request_id: 1,
        _script_dir: script_dir,
        worker_version: None,
    };

    wait_for_ready(&mut handle)?;
    Ok(handle)
}

/// Wait for the worker to send its ready message.
fn wait_for_ready(handle: &mut WorkerHandle) -> WorkerResult<()> {
    loop {
        let mut line = String::new();
        let read = match handle.stdout_reader.as_mut() {
            Some(reader) => reader.read_line(&mut line),
            None => Ok(0),
        };
        match read {
            Ok(0) => {
                handle.mark_crashed();
                return Err(WorkerError::SpawnFailed {
                    reason: "worker exited before sending ready message".to_string(),
                });
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Ok(ready) = serde_json::from_str::<ReadyMessage>(line) {
                    if ready.status == "ready" {
                        tracing::debug!(
                            worker = %ready.version,
                            rope = %ready.rope_version,
                            "rope worker ready"
                        );
                        handle.worker_version = Some(ready.version);
                        return Ok(());
                    }
                }

                if let Ok(error) = serde_json::from_str::<WorkerResponse>(line) {
                    if error.status == "error" {
                        handle.mark_crashed();
                        return Err(WorkerError::SpawnFailed {
                            reason: error.message.unwrap_or_else(|| "unknown error".to_string()),
                        });
                    }
                }

                tracing::warn!(line, "ignoring unexpected worker output before ready");
            }
            Err(e) => {
                handle.mark_crashed();
                return Err(WorkerError::SpawnFailed {
                    reason: format!("error reading from worker: {}", e),
                });
            }
        }
    }
}

/// Write the embedded worker script into `dir`.
fn materialize_worker_script(dir: &Path) -> WorkerResult<PathBuf> {
    let script_path = dir.join(WORKER_SCRIPT_NAME);
    std::fs::write(&script_path, WORKER_SCRIPT)?;
    Ok(script_path)
}

// ============================================================================
// Tests
// ============================================================================
