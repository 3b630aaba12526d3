//! Recovers an archived session back into `active/` via a metadata-first,
//! marker-guarded atomic protocol with best-effort rollback.

use crate::error::{Error, Result};
use crate::model::{ArchiveMetadata, RecoveryMarker};
use crate::paths;
use crate::result::OperationResult;
use crate::store;
use crate::validator::{validate_archived_name, validate_session_name};
use chrono::Utc;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const FALLBACK_NAME: &str = "recovered-session";

fn archived_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.+-\d{8}-\d{6}(-\d{2})?$").expect("valid regex")
    })
}

/// Pre-validates `archived_name` against the timestamp-suffix shape before
/// any filesystem interaction: this is the first line of defense against
/// path-traversal-style arguments.
pub fn validate_archived_name_format(archived_name: &str) -> Result<()> {
    if !archived_name_pattern().is_match(archived_name) {
        return Err(Error::invalid_input(
            archived_name,
            "does not match the '<name>-YYYYMMDD-HHMMSS[-NN]' archived-session pattern",
        ));
    }
    validate_archived_name(archived_name)?;
    Ok(())
}

/// Strips the trailing `-YYYYMMDD-HHMMSS[-NN]` suffix and validates what
/// remains as a session name. Falls back to the constant recovered-session
/// name (itself re-validated) when the prefix is empty or otherwise
/// invalid — the safe-extraction path that keeps a corrupt or hostile
/// archived name from ever reaching the filesystem as-is.
fn safe_original_name(archived_name: &str) -> String {
    let without_suffix = strip_timestamp_suffix(archived_name);
    match validate_session_name(&without_suffix) {
        Ok(()) => without_suffix,
        Err(_) => FALLBACK_NAME.to_string(),
    }
}

fn strip_timestamp_suffix(archived_name: &str) -> String {
    let suffix_pattern = Regex::new(r"-\d{8}-\d{6}(-\d{2})?$").expect("valid regex");
    suffix_pattern.replace(archived_name, "").into_owned()
}

/// Derives the original name to use when metadata is missing or corrupt:
/// re-runs the safe extraction over the archived directory name rather
/// than trusting an unparsable file.
fn original_name_from_metadata_or_fallback(
    metadata: Option<&ArchiveMetadata>,
    archived_name: &str,
) -> (String, Option<String>) {
    if let Some(metadata) = metadata {
        if validate_session_name(&metadata.original_name).is_ok() {
            return (metadata.original_name.clone(), None);
        }
    }
    let safe = safe_original_name(archived_name);
    let warning = Some(format!(
        "archive metadata missing or invalid; used safe-extracted name '{safe}'"
    ));
    (safe, warning)
}

pub struct SessionRecover<'a> {
    root: &'a Path,
}

impl<'a> SessionRecover<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    pub fn recover(&self, archived_name: &str, new_name: Option<&str>) -> Result<OperationResult> {
        let mut result = OperationResult::new("recover");

        validate_archived_name_format(archived_name)?;
        store::ensure_exists_archived(self.root, archived_name)?;
        if let Some(new_name) = new_name {
            validate_session_name(new_name)?;
        }

        let archived_dir = paths::archived_session_dir(self.root, archived_name);
        let metadata_path = paths::archive_metadata_path(&archived_dir);
        let metadata = read_metadata(&metadata_path, &mut result);

        let target_name = match new_name {
            Some(explicit) => explicit.to_string(),
            None => {
                let (name, warning) =
                    original_name_from_metadata_or_fallback(metadata.as_ref(), archived_name);
                if let Some(warning) = warning {
                    result.push_warning(warning, None);
                }
                name
            }
        };

        store::ensure_absent_active(self.root, &target_name)?;

        let target_dir = paths::session_dir(self.root, &target_name);
        let marker_path = paths::recovery_marker_path(self.root, &target_name);
        let file_count = metadata.as_ref().map(|m| m.file_count).unwrap_or(0);

        write_marker(&marker_path, &target_name, &archived_dir, file_count)?;

        if let Err(move_err) = paths::move_dir(&archived_dir, &target_dir) {
            // Nothing moved yet; just drop the marker.
            let _ = fs::remove_file(&marker_path);
            return Err(move_err);
        }

        let moved_metadata_path = paths::archive_metadata_path(&target_dir);
        if let Err(remove_err) = fs::remove_file(&moved_metadata_path) {
            if remove_err.kind() != std::io::ErrorKind::NotFound {
                // Attempt rollback: move the directory back to the archive.
                if paths::move_dir(&target_dir, &archived_dir).is_ok() {
                    let _ = fs::remove_file(&marker_path);
                    result.push_warning(
                        "metadata removal failed after the move; rolled back to archived/"
                            .to_string(),
                        None,
                    );
                } else {
                    result.push_warning(
                        "rollback after metadata-removal failure did not fully succeed; recovery marker retained for the health check".to_string(),
                        None,
                    );
                }
                return Err(Error::io(&moved_metadata_path, remove_err));
            }
        }

        let _ = fs::remove_file(&marker_path);

        result.push_success(
            format!("recovered '{archived_name}' as '{target_name}'"),
            None,
        );
        result.set_data(serde_json::json!({
            "archived_name": archived_name,
            "target_name": target_name,
        }));
        Ok(result)
    }
}

fn read_metadata(path: &Path, result: &mut OperationResult) -> Option<ArchiveMetadata> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ArchiveMetadata>(&raw) {
        Ok(metadata) => Some(metadata),
        Err(_) => {
            result.push_warning(
                "archive metadata is present but not in the expected shape".to_string(),
                Some("corrupt".to_string()),
            );
            None
        }
    }
}

fn write_marker(path: &Path, target_name: &str, archived_dir: &Path, file_count: u64) -> Result<()> {
    let marker = RecoveryMarker::new(
        target_name,
        archived_dir.to_string_lossy().into_owned(),
        Utc::now().to_rfc3339(),
        file_count,
    );
    let content = serde_json::to_string_pretty(&marker)
        .map_err(|e| Error::Internal(format!("failed to serialize recovery marker: {e}")))?;
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rejects_archived_name_without_timestamp_suffix() {
        assert!(validate_archived_name_format("../../../etc-passwd").is_err());
    }

    #[test]
    fn accepts_well_formed_archived_name() {
        assert!(validate_archived_name_format("work-20240101-120000").is_ok());
        assert!(validate_archived_name_format("work-20240101-120000-01").is_ok());
    }

    #[test]
    fn safe_original_name_strips_timestamp() {
        assert_eq!(safe_original_name("work-20240101-120000"), "work");
    }

    #[test]
    fn safe_original_name_falls_back_when_prefix_invalid() {
        assert_eq!(
            safe_original_name("../escape-20240101-120000"),
            FALLBACK_NAME
        );
    }

    #[test]
    fn recover_restores_directory_and_removes_metadata() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let archived_dir = paths::archived_session_dir(root.path(), "work-20240101-120000");
        fs::create_dir_all(&archived_dir).unwrap();
        fs::write(paths::session_json_path(&archived_dir), "{}").unwrap();
        let metadata = ArchiveMetadata::new("work", "work-20240101-120000", "2024-01-01T12:00:00Z", 1);
        fs::write(
            paths::archive_metadata_path(&archived_dir),
            serde_json::to_string(&metadata).unwrap(),
        )
        .unwrap();

        let recover = SessionRecover::new(root.path());
        let result = recover.recover("work-20240101-120000", None).unwrap();
        assert!(result.success);

        let active_dir = paths::session_dir(root.path(), "work");
        assert!(active_dir.join("session.json").exists());
        assert!(!paths::archive_metadata_path(&active_dir).exists());
        assert!(!archived_dir.exists());
        assert!(!paths::recovery_marker_path(root.path(), "work").exists());
    }

    #[test]
    fn recover_with_new_name_targets_that_name() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let archived_dir = paths::archived_session_dir(root.path(), "work-20240101-120000");
        fs::create_dir_all(&archived_dir).unwrap();
        fs::write(paths::session_json_path(&archived_dir), "{}").unwrap();

        let recover = SessionRecover::new(root.path());
        let result = recover
            .recover("work-20240101-120000", Some("renamed"))
            .unwrap();
        assert!(result.success);
        assert!(paths::session_dir(root.path(), "renamed").is_dir());
    }

    #[test]
    fn recover_with_corrupt_metadata_falls_back_safely() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let archived_dir = paths::archived_session_dir(root.path(), "work-20240101-120000");
        fs::create_dir_all(&archived_dir).unwrap();
        fs::write(paths::session_json_path(&archived_dir), "{}").unwrap();
        fs::write(paths::archive_metadata_path(&archived_dir), "[1,2,3]").unwrap();

        let recover = SessionRecover::new(root.path());
        let result = recover.recover("work-20240101-120000", None).unwrap();
        assert!(result.success);
        assert!(result.summary.warning_count >= 1);
        assert!(paths::session_dir(root.path(), "work").is_dir());
    }

    #[test]
    fn recover_rejects_existing_target() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let archived_dir = paths::archived_session_dir(root.path(), "work-20240101-120000");
        fs::create_dir_all(&archived_dir).unwrap();
        fs::write(paths::session_json_path(&archived_dir), "{}").unwrap();
        fs::create_dir_all(paths::session_dir(root.path(), "work")).unwrap();

        let recover = SessionRecover::new(root.path());
        let err = recover.recover("work-20240101-120000", None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AlreadyExists);
    }
}
