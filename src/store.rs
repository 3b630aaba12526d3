//! CRUD-level read operations over the session store: enumerating active
//! and archived sessions, and the existence checks the validator's
//! `ensure_*` contract requires before mutating operations proceed.

use crate::error::{Error, Result};
use crate::paths;
use crate::validator::validate_session_name;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActiveSessionSummary {
    pub name: String,
    pub window_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArchivedSessionSummary {
    pub archived_name: String,
    pub original_name: Option<String>,
    pub archive_timestamp: Option<String>,
}

/// Lists active sessions. Tolerates a directory disappearing between
/// enumeration and stat — readers never take a lock and never error on
/// transient inconsistency.
pub fn list_active(root: &Path) -> Result<Vec<ActiveSessionSummary>> {
    let active = paths::active_dir(root);
    let mut out = Vec::new();

    let entries = match fs::read_dir(&active) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(Error::io(&active, e)),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let session_json = paths::session_json_path(&path);
        let window_count = fs::read_to_string(&session_json)
            .ok()
            .and_then(|raw| serde_json::from_str::<crate::model::Session>(&raw).ok())
            .map(|s| s.windows.len())
            .unwrap_or(0);
        out.push(ActiveSessionSummary { name, window_count });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub fn list_archived(root: &Path) -> Result<Vec<ArchivedSessionSummary>> {
    let archived = paths::archived_dir(root);
    let mut out = Vec::new();

    let entries = match fs::read_dir(&archived) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(Error::io(&archived, e)),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(archived_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
        else {
            continue;
        };
        let metadata_path = paths::archive_metadata_path(&path);
        let metadata = fs::read_to_string(&metadata_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<crate::model::ArchiveMetadata>(&raw).ok());

        out.push(ArchivedSessionSummary {
            archived_name,
            original_name: metadata.as_ref().map(|m| m.original_name.clone()),
            archive_timestamp: metadata.map(|m| m.archive_timestamp),
        });
    }

    out.sort_by(|a, b| a.archived_name.cmp(&b.archived_name));
    Ok(out)
}

pub fn ensure_exists_active(root: &Path, name: &str) -> Result<()> {
    validate_session_name(name)?;
    if !paths::session_dir(root, name).is_dir() {
        return Err(Error::not_found(name, "active/"));
    }
    Ok(())
}

pub fn ensure_absent_active(root: &Path, name: &str) -> Result<()> {
    validate_session_name(name)?;
    if paths::session_dir(root, name).is_dir() {
        return Err(Error::already_exists(name, "active/"));
    }
    Ok(())
}

pub fn ensure_exists_archived(root: &Path, archived_name: &str) -> Result<()> {
    if !paths::archived_session_dir(root, archived_name).is_dir() {
        return Err(Error::not_found(archived_name, "archived/"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn list_active_is_empty_when_missing() {
        let root = tempdir().unwrap();
        assert!(list_active(root.path()).unwrap().is_empty());
    }

    #[test]
    fn list_active_finds_session_with_window_count() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let session_dir = paths::session_dir(root.path(), "work");
        fs::create_dir_all(&session_dir).unwrap();
        fs::write(
            paths::session_json_path(&session_dir),
            r#"{"windows":[],"groups":[],"workspace":1}"#,
        )
        .unwrap();

        let sessions = list_active(root.path()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name, "work");
        assert_eq!(sessions[0].window_count, 0);
    }

    #[test]
    fn ensure_exists_active_rejects_missing() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        assert!(ensure_exists_active(root.path(), "missing").is_err());
    }

    #[test]
    fn ensure_absent_active_rejects_existing() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let session_dir = paths::session_dir(root.path(), "work");
        fs::create_dir_all(&session_dir).unwrap();
        assert!(ensure_absent_active(root.path(), "work").is_err());
    }

    #[test]
    fn list_archived_reads_metadata_when_present() {
        let root = tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let archived_dir = paths::archived_session_dir(root.path(), "work-20240101-000000");
        fs::create_dir_all(&archived_dir).unwrap();
        fs::write(
            paths::archive_metadata_path(&archived_dir),
            r#"{"original_name":"work","archived_name":"work-20240101-000000","archive_timestamp":"2024-01-01T00:00:00Z","file_count":1,"archive_version":"1.0"}"#,
        )
        .unwrap();

        let archived = list_archived(root.path()).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].original_name.as_deref(), Some("work"));
    }
}
