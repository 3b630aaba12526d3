//! Neovide capture: working directory plus a best-effort remote session
//! dump via the editor's control socket.
//!
//! Every socket/IPC step here is time-bounded; on any failure the handler
//! falls back to recording just the working directory rather than blocking
//! the rest of the save pipeline.

use super::{base_record, CaptureContext, CaptureHandler, HandlerOutcome};
use crate::compositor::ClientWindow;
use crate::error::Error;
use crate::model::NeovideSession;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Overall budget for socket discovery + remote write + poll: editor IPC
/// never blocks the pipeline past this ceiling.
const IPC_BUDGET: Duration = Duration::from_secs(10);
/// How long to wait for the session file to appear once the write request
/// has been dispatched.
const SESSION_FILE_WAIT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct EditorHandler;

impl CaptureHandler for EditorHandler {
    fn capture(&self, window: &ClientWindow, ctx: &CaptureContext<'_>) -> HandlerOutcome {
        let mut record = base_record(window);
        let mut warnings = Vec::new();

        let working_directory = ctx.introspector.working_directory(window.pid);
        if working_directory.is_none() {
            warnings.push(format!(
                "could not read working directory for neovide pid {}",
                window.pid
            ));
        }

        let session_file = match &working_directory {
            Some(_) => capture_session_file(window.pid, ctx, &mut warnings),
            None => None,
        };

        record.neovide_session = working_directory.map(|working_directory| NeovideSession {
            working_directory,
            session_file,
        });

        HandlerOutcome { record, warnings }
    }
}

fn capture_session_file(
    pid: i32,
    ctx: &CaptureContext<'_>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let deadline = Instant::now() + IPC_BUDGET;

    let socket = match discover_socket(pid, ctx) {
        Some(socket) => socket,
        None => {
            warnings.push(format!("no editor control socket found for pid {pid}"));
            return None;
        }
    };

    let file_name = format!("neovide-session-{pid}.vim");
    let target_path = ctx.session_dir.join(&file_name);

    if let Err(e) = request_session_write(&socket, &target_path) {
        warnings.push(format!("editor session write request failed: {e}"));
        return None;
    }

    let poll_deadline = (Instant::now() + SESSION_FILE_WAIT).min(deadline);
    while Instant::now() < poll_deadline {
        if target_path.exists() {
            return Some(file_name);
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    let timed_out = Error::TimedOut(format!(
        "editor session file for pid {pid} did not appear within the time budget"
    ));
    warnings.push(timed_out.to_string());
    None
}

/// Looks for a Neovim msgpack-RPC socket under the well-known per-user
/// runtime directory, named after `pid` or one of its descendants (Neovide
/// spawns Neovim as a child process).
fn discover_socket(pid: i32, ctx: &CaptureContext<'_>) -> Option<PathBuf> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").ok()?;
    let mut candidate_pids = vec![pid];
    candidate_pids.extend(ctx.introspector.children(pid));

    for candidate in candidate_pids {
        let direct = PathBuf::from(&runtime_dir).join(format!("nvim.{candidate}.0"));
        if direct.exists() {
            return Some(direct);
        }
    }

    // Fall back to scanning the runtime dir for any nvim socket; Neovide
    // does not always name the socket after a pid we can derive directly.
    scan_runtime_dir_for_nvim_socket(Path::new(&runtime_dir))
}

fn scan_runtime_dir_for_nvim_socket(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("nvim.") {
            return Some(entry.path());
        }
    }
    None
}

fn request_session_write(socket: &Path, target_path: &Path) -> Result<(), String> {
    let expr = format!("execute('mksession! {}')", target_path.display());
    let output = Command::new("nvim")
        .args([
            "--server",
            &socket.to_string_lossy(),
            "--remote-expr",
            &expr,
        ])
        .output()
        .map_err(|e| e.to_string())?;

    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(())
}
