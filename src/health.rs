//! Interrupted-operation detection and the aggregate health-check command.

use crate::config::Config;
use crate::model::RecoveryMarker;
use crate::paths;
use crate::result::OperationResult;
use std::fs;
use std::path::Path;

const MARKER_PREFIX: &str = ".recovery-in-progress-";
const MARKER_SUFFIX: &str = ".tmp";

/// Names of sessions with a recovery marker still present in `active/`.
pub fn list_interrupted_recoveries(root: &Path) -> Vec<String> {
    let active = paths::active_dir(root);
    let Ok(entries) = fs::read_dir(&active) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            name.strip_prefix(MARKER_PREFIX)
                .and_then(|s| s.strip_suffix(MARKER_SUFFIX))
                .map(str::to_string)
        })
        .collect()
}

pub fn marker_info(root: &Path, target_name: &str) -> Option<RecoveryMarker> {
    let path = paths::recovery_marker_path(root, target_name);
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Removes a recovery marker. Never touches session data — the caller is
/// responsible for having already verified the marker is safe to clear.
/// Not wired to a CLI verb (there is no "clear marker" command); kept for
/// the GUI front-end this crate's JSON output feeds.
#[allow(dead_code)]
pub fn cleanup_interrupted_recovery(root: &Path, target_name: &str) -> std::io::Result<()> {
    let path = paths::recovery_marker_path(root, target_name);
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn directory_accessible(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let probe = path.join(".hypr-sessions-health-probe");
    let writable = fs::write(&probe, b"").is_ok();
    let _ = fs::remove_file(&probe);
    writable
}

/// Runs every health check and folds the outcome into a single
/// `OperationResult`: directory accessibility, config bounds, interrupted
/// recoveries, and cleanup-lock presence.
pub fn run_health_check(root: &Path, config: &Config) -> OperationResult {
    let mut result = OperationResult::new("health");

    let active = paths::active_dir(root);
    let archived = paths::archived_dir(root);

    for (label, dir) in [("root", root), ("active", &active), ("archived", &archived)] {
        if directory_accessible(dir) {
            result.push_success(format!("{label} directory is accessible"), None);
        } else {
            result.push_error(format!("{label} directory is not accessible"), None);
        }
    }

    for problem in config.validate_bounds() {
        result.push_error(format!("configuration: {problem}"), None);
    }

    let interrupted = list_interrupted_recoveries(root);
    let mut marker_details = Vec::with_capacity(interrupted.len());
    if interrupted.is_empty() {
        result.push_success("no interrupted recoveries".to_string(), None);
    } else {
        for name in &interrupted {
            result.push_warning(
                format!("interrupted recovery marker present for '{name}'"),
                None,
            );
            marker_details.push(marker_info(root, name));
        }
    }

    let lock_path = paths::cleanup_lock_path(root);
    if lock_path.exists() {
        result.push_warning(
            "archive cleanup lock file is present (may indicate a crashed cleanup, or one in progress)".to_string(),
            None,
        );
    }

    result.set_data(serde_json::json!({
        "interrupted_recoveries": interrupted,
        "interrupted_recovery_markers": marker_details,
    }));

    result
}
