//! Store root resolution and the one-time legacy-layout migration.
//!
//! Pure "compute path" helpers are kept separate from explicit "ensure
//! exists" actions — validation and path computation never create
//! directories; only `ensure_layout` does.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const STORE_DIR_NAME: &str = "hypr-sessions";
const ROOT_OVERRIDE_ENV: &str = "HYPR_SESSIONS_ROOT";
const SESSION_FILE: &str = "session.json";

/// Resolves the store root, honoring `HYPR_SESSIONS_ROOT` for test isolation
/// and power users who keep XDG config elsewhere. Does not touch the
/// filesystem.
pub fn store_root() -> Result<PathBuf> {
    if let Ok(over) = std::env::var(ROOT_OVERRIDE_ENV) {
        if !over.trim().is_empty() {
            return Ok(PathBuf::from(over));
        }
    }
    let config_home = dirs::config_dir().ok_or_else(|| {
        Error::Internal("could not determine the user's config directory".to_string())
    })?;
    Ok(config_home.join(STORE_DIR_NAME))
}

pub fn active_dir(root: &Path) -> PathBuf {
    root.join("active")
}

pub fn archived_dir(root: &Path) -> PathBuf {
    root.join("archived")
}

pub fn session_dir(root: &Path, name: &str) -> PathBuf {
    active_dir(root).join(name)
}

pub fn archived_session_dir(root: &Path, archived_name: &str) -> PathBuf {
    archived_dir(root).join(archived_name)
}

pub fn session_json_path(session_dir: &Path) -> PathBuf {
    session_dir.join(SESSION_FILE)
}

pub fn archive_metadata_path(session_dir: &Path) -> PathBuf {
    session_dir.join(".archive-metadata.json")
}

pub fn cleanup_lock_path(root: &Path) -> PathBuf {
    archived_dir(root).join(".archive-cleanup.lock")
}

pub fn recovery_marker_path(root: &Path, target_name: &str) -> PathBuf {
    active_dir(root).join(format!(".recovery-in-progress-{target_name}.tmp"))
}

/// Ensures `root`, `active/`, and `archived/` exist, then runs the legacy
/// flat-layout migration. Idempotent: running it twice has the same effect
/// as once, because step 3 only ever looks at entries that are not
/// `active/`/`archived/` and only moves entries that contain `session.json`.
pub fn ensure_layout(root: &Path) -> Result<MigrationReport> {
    fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;

    let active = active_dir(root);
    let archived = archived_dir(root);
    fs::create_dir_all(&active).map_err(|e| Error::io(&active, e))?;
    fs::create_dir_all(&archived).map_err(|e| Error::io(&archived, e))?;

    migrate_legacy_layout(root, &active)
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub migrated: Vec<String>,
}

/// Moves any legacy flat-layout session directory (a directory directly
/// under `root` that is neither `active/` nor `archived/` and contains a
/// `session.json`) into `active/`.
///
/// Errors partway through leave each entry either fully in its original
/// location or fully in `active/` — never straddling both, because the
/// move is a single `rename` per entry.
fn migrate_legacy_layout(root: &Path, active: &Path) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(Error::io(root, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name == "active" || name == "archived" {
            continue;
        }
        if !path.join(SESSION_FILE).exists() {
            continue;
        }

        let destination = active.join(&name);
        if destination.exists() {
            tracing::warn!(
                session = %name,
                "legacy session collides with an existing active session; leaving in place"
            );
            continue;
        }

        fs::rename(&path, &destination).map_err(|e| Error::io(&path, e))?;
        tracing::info!(session = %name, "migrated legacy session into active/");
        report.migrated.push(name);
    }

    Ok(report)
}

/// Moves `from` to `to`, falling back to a recursive copy-then-delete when
/// the two paths are not on the same filesystem (`EXDEV`).
///
/// Detected via the raw OS error code rather than `ErrorKind`, since the
/// `rename(2)` EXDEV case surfaces as a plain errno on every Unix target
/// this crate runs on (Hyprland is Linux-only).
pub fn move_dir(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => copy_dir_recursive(from, to)
            .and_then(|()| fs::remove_dir_all(from).map_err(|e| Error::io(from, e))),
        Err(e) => Err(Error::io(from, e)),
    }
}

fn is_cross_device(err: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(18) // EXDEV on Linux and most Unix-likes.
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| Error::io(to, e))?;
    for entry in fs::read_dir(from).map_err(|e| Error::io(from, e))? {
        let entry = entry.map_err(|e| Error::io(from, e))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if src.is_dir() {
            copy_dir_recursive(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|e| Error::io(&src, e))?;
        }
    }
    Ok(())
}
