//! Typed data model: the shapes persisted to `session.json`,
//! `.archive-metadata.json`, and recovery markers.
//!
//! Every nested payload is an explicit `Option`, never a loosely-typed map —
//! a shape mismatch on deserialization becomes `Error::Corrupt` rather than
//! a silent `null`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningProgram {
    pub name: String,
    pub args: Vec<String>,
    pub full_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeovideSession {
    pub working_directory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    KeyboardShortcut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserTab {
    pub url: String,
    pub title: String,
    pub active: bool,
    pub pinned: bool,
    pub index: u32,
    pub window_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSession {
    pub browser_type: String,
    pub capture_method: CaptureMethod,
    pub tab_count: usize,
    pub window_id: String,
    pub tabs: Vec<BrowserTab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub class: String,
    pub title: String,
    pub pid: i32,
    pub position: Position,
    pub size: Size,
    pub launch_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_program: Option<RunningProgram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neovide_session: Option<NeovideSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_session: Option<BrowserSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u32>,
}

/// An ordered set of window indices (into `Session::windows`) that must be
/// launched together as a Hyprland group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u32,
    pub window_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub windows: Vec<WindowRecord>,
    pub groups: Vec<Group>,
    pub workspace: i32,
}

impl Session {
    /// Windows that belong to no group, in capture order.
    pub fn ungrouped(&self) -> Vec<&WindowRecord> {
        self.windows
            .iter()
            .filter(|w| w.group_id.is_none())
            .collect()
    }

    pub fn group_members<'a>(&'a self, group: &'a Group) -> Vec<&'a WindowRecord> {
        group
            .window_indices
            .iter()
            .filter_map(|&i| self.windows.get(i))
            .collect()
    }
}

pub const ARCHIVE_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    pub original_name: String,
    pub archived_name: String,
    pub archive_timestamp: String,
    pub file_count: u64,
    pub archive_version: String,
}

impl ArchiveMetadata {
    pub fn new(
        original_name: impl Into<String>,
        archived_name: impl Into<String>,
        archive_timestamp: impl Into<String>,
        file_count: u64,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            archived_name: archived_name.into(),
            archive_timestamp: archive_timestamp.into(),
            file_count,
            archive_version: ARCHIVE_VERSION.to_string(),
        }
    }
}

pub const RECOVERY_MARKER_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMarker {
    pub target_name: String,
    pub archived_dir: String,
    pub recovery_timestamp: String,
    pub recovery_version: String,
    pub file_count: u64,
}

impl RecoveryMarker {
    pub fn new(
        target_name: impl Into<String>,
        archived_dir: impl Into<String>,
        recovery_timestamp: impl Into<String>,
        file_count: u64,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            archived_dir: archived_dir.into(),
            recovery_timestamp: recovery_timestamp.into(),
            recovery_version: RECOVERY_MARKER_VERSION.to_string(),
            file_count,
        }
    }
}
