//! The "delete" action: archives a session (move to `archived/`,
//! metadata-first) and runs bounded, lock-serialized cleanup.
//!
//! The CLI verb stays `delete` for backwards compatibility; the JSON
//! `operation` field reports what actually happens, `archive`.

use crate::config::{CleanupStrategy, Config};
use crate::error::{Error, Result};
use crate::model::ArchiveMetadata;
use crate::paths;
use crate::result::OperationResult;
use crate::store;
use crate::validator::validate_session_name;
use chrono::Utc;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::Path;

pub struct SessionArchiver<'a> {
    root: &'a Path,
    config: &'a Config,
}

impl<'a> SessionArchiver<'a> {
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }

    pub fn archive(&self, name: &str) -> Result<OperationResult> {
        let mut result = OperationResult::new("archive");

        if !self.config.archive_enabled {
            return Err(Error::Conflict(
                "archiving is disabled by configuration".to_string(),
            ));
        }

        validate_session_name(name)?;
        store::ensure_exists_active(self.root, name)?;

        let source_dir = paths::session_dir(self.root, name);
        let archived_name = unique_archived_name(self.root, name, now_timestamp_suffix());
        let destination_dir = paths::archived_session_dir(self.root, &archived_name);

        let file_count = count_files(&source_dir)?;
        let metadata = ArchiveMetadata::new(name, &archived_name, now_iso8601(), file_count);
        let metadata_path = paths::archive_metadata_path(&source_dir);
        write_metadata(&metadata_path, &metadata)?;

        if let Err(e) = paths::move_dir(&source_dir, &destination_dir) {
            let _ = fs::remove_file(&metadata_path);
            return Err(e);
        }

        result.push_success(
            format!("archived '{name}' as '{archived_name}'"),
            None,
        );
        result.set_data(serde_json::json!({
            "original_name": name,
            "archived_name": archived_name,
        }));

        if self.config.archive_auto_cleanup {
            match run_cleanup(self.root, self.config) {
                Ok(report) => {
                    if !report.removed.is_empty() {
                        result.push_success(
                            format!("cleanup removed {} archive(s)", report.removed.len()),
                            None,
                        );
                    }
                }
                Err(CleanupOutcome::LockHeld) => {
                    result.push_warning(
                        "archive cleanup skipped: cleanup lock already held".to_string(),
                        None,
                    );
                }
                Err(CleanupOutcome::Error(e)) => {
                    result.push_warning(format!("archive cleanup failed: {e}"), None);
                }
            }
        }

        Ok(result)
    }
}

fn now_timestamp_suffix() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Appends a numeric disambiguator (`-01`, `-02`, ...) when the timestamp
/// alone collides with an existing archived directory — same-second
/// archives of the same name are rare but not impossible at this
/// resolution.
fn unique_archived_name(root: &Path, name: &str, timestamp_suffix: String) -> String {
    let base = format!("{name}-{timestamp_suffix}");
    if !paths::archived_session_dir(root, &base).exists() {
        return base;
    }
    for n in 1..100u32 {
        let candidate = format!("{base}-{n:02}");
        if !paths::archived_session_dir(root, &candidate).exists() {
            return candidate;
        }
    }
    format!("{base}-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

fn count_files(dir: &Path) -> Result<u64> {
    let mut count = 0u64;
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if entry.path().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

fn write_metadata(path: &Path, metadata: &ArchiveMetadata) -> Result<()> {
    let content = serde_json::to_string_pretty(metadata)
        .map_err(|e| Error::Internal(format!("failed to serialize archive metadata: {e}")))?;
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

struct CleanupEntry {
    path: std::path::PathBuf,
    archive_timestamp: Option<String>,
    mtime: std::time::SystemTime,
    name: String,
}

pub struct CleanupReport {
    pub removed: Vec<String>,
}

enum CleanupOutcome {
    LockHeld,
    Error(Error),
}

impl From<Error> for CleanupOutcome {
    fn from(e: Error) -> Self {
        CleanupOutcome::Error(e)
    }
}

/// Runs bounded cleanup under an advisory exclusive lock. If the lock is
/// already held by another process, this skips with `LockHeld` rather than
/// blocking another cleanup in progress.
fn run_cleanup(root: &Path, config: &Config) -> std::result::Result<CleanupReport, CleanupOutcome> {
    let lock_path = paths::cleanup_lock_path(root);
    let lock_file = File::create(&lock_path).map_err(|e| Error::io(&lock_path, e))?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {}
        Err(_) => return Err(CleanupOutcome::LockHeld),
    }

    let report = do_cleanup(root, config).map_err(CleanupOutcome::Error);
    let _ = lock_file.unlock();
    report
}

fn do_cleanup(root: &Path, config: &Config) -> Result<CleanupReport> {
    let archived = paths::archived_dir(root);
    let mut entries = Vec::new();

    let dir_entries = match fs::read_dir(&archived) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CleanupReport { removed: Vec::new() })
        }
        Err(e) => return Err(Error::io(&archived, e)),
    };

    for entry in dir_entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let metadata_path = paths::archive_metadata_path(&path);
        let parsed: Option<ArchiveMetadata> = fs::read_to_string(&metadata_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok());

        // Entries with missing/invalid metadata are never touched by the
        // normal cleanup pass; they require an explicit orphan pass.
        let Some(parsed) = parsed else { continue };

        let mtime = fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        entries.push(CleanupEntry {
            path,
            archive_timestamp: Some(parsed.archive_timestamp),
            mtime,
            name,
        });
    }

    let max = config.archive_max_sessions as usize;
    if entries.len() <= max {
        return Ok(CleanupReport { removed: Vec::new() });
    }

    match config.archive_cleanup_strategy {
        CleanupStrategy::OldestFirst => {
            entries.sort_by(|a, b| {
                a.archive_timestamp
                    .cmp(&b.archive_timestamp)
                    .then(a.mtime.cmp(&b.mtime))
                    .then(a.name.cmp(&b.name))
            });
        }
    }

    let remove_count = entries.len() - max;
    let mut removed = Vec::with_capacity(remove_count);
    for entry in entries.into_iter().take(remove_count) {
        if fs::remove_dir_all(&entry.path).is_ok() {
            removed.push(entry.name);
        }
    }

    Ok(CleanupReport { removed })
}

/// Sweeps archived directories whose metadata is missing or unreadable.
/// Kept separate from `run_cleanup`: unreadable-metadata directories must
/// never be deleted in the same pass as normal bounded cleanup. Not wired
/// to a CLI verb — exposed for callers who have already decided an orphan
/// pass is warranted.
#[allow(dead_code)]
pub fn cleanup_orphans(root: &Path) -> Result<Vec<String>> {
    let archived = paths::archived_dir(root);
    let mut removed = Vec::new();

    let entries = match fs::read_dir(&archived) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(Error::io(&archived, e)),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let metadata_path = paths::archive_metadata_path(&path);
        let readable = fs::read_to_string(&metadata_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<ArchiveMetadata>(&raw).ok())
            .is_some();
        if readable {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            let name = name.to_string();
            if fs::remove_dir_all(&path).is_ok() {
                removed.push(name);
            }
        }
    }

    Ok(removed)
}
