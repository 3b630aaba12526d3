//! Capture orchestration: enumerates the active workspace, runs each
//! window through its handler, detects groups, and writes the session
//! directory atomically.

use crate::compositor::{ClientWindow, CompositorClient};
use crate::error::{Error, Result};
use crate::handlers::{self, CaptureContext};
use crate::launch::build_launch_command;
use crate::model::{Group, Session};
use crate::paths;
use crate::process::ProcessIntrospector;
use crate::result::OperationResult;
use crate::validator::validate_session_name;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

pub struct SessionSaver<'a> {
    root: &'a Path,
    compositor: CompositorClient,
    introspector: ProcessIntrospector,
}

impl<'a> SessionSaver<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            compositor: CompositorClient::new(),
            introspector: ProcessIntrospector::new(),
        }
    }

    pub fn save(&self, name: &str) -> Result<OperationResult> {
        let mut result = OperationResult::new("save");
        validate_session_name(name)?;

        let session_dir = paths::session_dir(self.root, name);
        fs::create_dir_all(&session_dir).map_err(|e| Error::io(&session_dir, e))?;

        let tmp_marker = session_dir.join("session.json.tmp");
        let exclusivity = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_marker);
        let _exclusivity_file = match exclusivity {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::Conflict(format!(
                    "a save for '{name}' is already in progress"
                )));
            }
            Err(e) => return Err(Error::io(&tmp_marker, e)),
        };
        // Guarantees removal of the exclusivity marker on every exit path,
        // including the early returns from capture failures below.
        let _guard = TempMarkerGuard(&tmp_marker);

        let windows = self
            .compositor
            .query_active_workspace_windows()
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_marker);
                e
            })?;

        let group_assignments = detect_groups(&windows);

        let ctx = CaptureContext {
            session_dir: &session_dir,
            compositor: &self.compositor,
            introspector: &self.introspector,
        };

        let mut records = Vec::with_capacity(windows.len());
        for window in &windows {
            let outcome = handlers::capture_window(window, &ctx);
            for warning in &outcome.warnings {
                result.push_warning(warning.clone(), Some(window.class.clone()));
            }
            let mut record = outcome.record;
            record.group_id = group_assignments.get(&window.address).copied();
            record.launch_command = build_launch_command(&record);
            records.push(record);
        }

        let groups = build_groups(&windows, &group_assignments);
        let active_workspace = windows.first().map(|w| w.workspace_id).unwrap_or(0);

        let session = Session {
            windows: records,
            groups,
            workspace: active_workspace,
        };

        write_session_atomically(&session_dir, &session)?;

        result.push_success(
            format!("saved session '{name}' with {} windows", session.windows.len()),
            None,
        );
        result.set_data(serde_json::json!({ "name": name, "window_count": session.windows.len() }));
        Ok(result)
    }
}

struct TempMarkerGuard<'a>(&'a Path);

impl<'a> Drop for TempMarkerGuard<'a> {
    fn drop(&mut self) {
        let _ = fs::remove_file(self.0);
    }
}

/// Assigns a synthetic group id to every window address reported by the
/// compositor as grouped with at least one other window on the workspace.
fn detect_groups(windows: &[ClientWindow]) -> HashMap<String, u32> {
    let mut assignments = HashMap::new();
    let mut next_id = 1u32;
    let mut seen_addresses: HashMap<String, u32> = HashMap::new();

    for window in windows {
        if window.grouped_with.is_empty() {
            continue;
        }
        let existing_id = window
            .grouped_with
            .iter()
            .chain(std::iter::once(&window.address))
            .find_map(|addr| seen_addresses.get(addr).copied());

        let group_id = existing_id.unwrap_or_else(|| {
            let id = next_id;
            next_id += 1;
            id
        });

        assignments.insert(window.address.clone(), group_id);
        seen_addresses.insert(window.address.clone(), group_id);
        for addr in &window.grouped_with {
            seen_addresses.insert(addr.clone(), group_id);
        }
    }

    assignments
}

fn build_groups(windows: &[ClientWindow], assignments: &HashMap<String, u32>) -> Vec<Group> {
    let mut by_group: HashMap<u32, Vec<usize>> = HashMap::new();
    for (index, window) in windows.iter().enumerate() {
        if let Some(&group_id) = assignments.get(&window.address) {
            by_group.entry(group_id).or_default().push(index);
        }
    }
    let mut groups: Vec<Group> = by_group
        .into_iter()
        .map(|(id, window_indices)| Group { id, window_indices })
        .collect();
    groups.sort_by_key(|g| g.id);
    groups
}

fn write_session_atomically(session_dir: &Path, session: &Session) -> Result<()> {
    let final_path = paths::session_json_path(session_dir);
    let temp_path = final_path.with_extension("json.write-tmp");

    let content = serde_json::to_string_pretty(session)
        .map_err(|e| Error::Internal(format!("failed to serialize session: {e}")))?;

    fs::write(&temp_path, &content).map_err(|e| Error::io(&temp_path, e))?;

    // fsync the temp file before rename so the atomic-rename guarantee
    // actually reflects durable content, not just a renamed empty file.
    if let Ok(file) = File::open(&temp_path) {
        let _ = file.sync_all();
    }

    fs::rename(&temp_path, &final_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&final_path, e)
    })?;

    Ok(())
}
