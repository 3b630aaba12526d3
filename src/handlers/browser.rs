//! Browser tab capture via a keyboard-shortcut trigger to an external
//! extension, which writes a JSON snapshot into the user's Downloads
//! directory.
//!
//! The extension's contract is time- and location-based and therefore
//! inherently racy across concurrent saves; consumption is restricted to
//! files matching the extension's naming pattern whose mtime is newer than
//! a snapshot taken before the trigger.

use super::{base_record, CaptureContext, CaptureHandler, HandlerOutcome};
use crate::compositor::ClientWindow;
use crate::error::Error;
use crate::model::{BrowserSession, BrowserTab, CaptureMethod};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

const FILE_PREFIX: &str = "hypr-session-tabs-";
const POLL_WINDOW: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(150);
/// Keyboard shortcut the extension listens for, dispatched without moving
/// compositor focus.
const CAPTURE_MODS: &str = "CTRL SHIFT";
const CAPTURE_KEY: &str = "S";

pub struct BrowserHandler;

impl CaptureHandler for BrowserHandler {
    fn capture(&self, window: &ClientWindow, ctx: &CaptureContext<'_>) -> HandlerOutcome {
        let mut record = base_record(window);
        let mut warnings = Vec::new();

        let Some(downloads_dir) = dirs::download_dir() else {
            warnings.push("could not determine the Downloads directory".to_string());
            return HandlerOutcome { record, warnings };
        };

        match capture_tabs(&downloads_dir, window, ctx, &mut warnings) {
            Some(session) => record.browser_session = Some(session),
            None => {
                // `capture_tabs` already pushed a specific warning for every
                // failure branch it can take.
            }
        }

        HandlerOutcome { record, warnings }
    }
}

fn capture_tabs(
    downloads_dir: &Path,
    window: &ClientWindow,
    ctx: &CaptureContext<'_>,
    warnings: &mut Vec<String>,
) -> Option<BrowserSession> {
    let before = snapshot_matching_files(downloads_dir);
    let trigger_time = SystemTime::now();

    if let Err(e) =
        ctx.compositor
            .dispatch_send_shortcut(CAPTURE_MODS, CAPTURE_KEY, &window.address)
    {
        warnings.push(format!("failed to trigger tab capture shortcut: {e}"));
        return None;
    }

    let new_file = match poll_for_new_file(downloads_dir, &before, trigger_time) {
        Some(path) => path,
        None => {
            let timed_out = Error::TimedOut(
                "no tab snapshot file appeared from the browser extension".to_string(),
            );
            warnings.push(timed_out.to_string());
            return None;
        }
    };

    let parsed = match parse_snapshot(&new_file) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warnings.push(format!("failed to parse tab snapshot: {e}"));
            let _ = std::fs::remove_file(&new_file);
            return None;
        }
    };

    if let Err(e) = std::fs::remove_file(&new_file) {
        warnings.push(format!("failed to delete consumed tab snapshot: {e}"));
    }

    Some(parsed)
}

fn snapshot_matching_files(dir: &Path) -> HashSet<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return HashSet::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| is_tab_snapshot_name(p))
        .collect()
}

fn is_tab_snapshot_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(".json"))
        .unwrap_or(false)
}

fn poll_for_new_file(
    dir: &Path,
    before: &HashSet<PathBuf>,
    not_older_than: SystemTime,
) -> Option<PathBuf> {
    let deadline = Instant::now() + POLL_WINDOW;
    while Instant::now() < deadline {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !is_tab_snapshot_name(&path) || before.contains(&path) {
                    continue;
                }
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                let Ok(modified) = metadata.modified() else {
                    continue;
                };
                if modified >= not_older_than {
                    return Some(path);
                }
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    None
}

#[derive(Debug, Deserialize)]
struct RawTabSnapshot {
    browser_type: String,
    window_id: String,
    tabs: Vec<RawTab>,
}

#[derive(Debug, Deserialize)]
struct RawTab {
    url: String,
    title: String,
    active: bool,
    pinned: bool,
    index: u32,
    #[serde(rename = "windowId")]
    window_id: String,
    #[serde(default)]
    entries: Option<Vec<String>>,
}

fn parse_snapshot(path: &Path) -> Result<BrowserSession, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let parsed: RawTabSnapshot = serde_json::from_str(&raw).map_err(|e| e.to_string())?;

    let tabs: Vec<BrowserTab> = parsed
        .tabs
        .into_iter()
        .map(|t| BrowserTab {
            url: t.url,
            title: t.title,
            active: t.active,
            pinned: t.pinned,
            index: t.index,
            window_id: t.window_id,
            entries: t.entries,
        })
        .collect();

    Ok(BrowserSession {
        tab_count: tabs.len(),
        browser_type: parsed.browser_type,
        capture_method: CaptureMethod::KeyboardShortcut,
        window_id: parsed.window_id,
        tabs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn is_tab_snapshot_name_matches_pattern() {
        assert!(is_tab_snapshot_name(Path::new(
            "/tmp/hypr-session-tabs-123.json"
        )));
        assert!(!is_tab_snapshot_name(Path::new("/tmp/random.json")));
    }

    #[test]
    fn parse_snapshot_reads_expected_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hypr-session-tabs-1.json");
        std::fs::write(
            &path,
            r#"{"browser_type":"firefox","window_id":"w1","tabs":[
                {"url":"https://example.com","title":"Example","active":true,"pinned":false,"index":0,"windowId":"w1"}
            ]}"#,
        )
        .unwrap();

        let session = parse_snapshot(&path).unwrap();
        assert_eq!(session.browser_type, "firefox");
        assert_eq!(session.tab_count, 1);
        assert_eq!(session.tabs[0].url, "https://example.com");
    }

    #[test]
    fn parse_snapshot_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hypr-session-tabs-2.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(parse_snapshot(&path).is_err());
    }

    #[test]
    fn snapshot_matching_files_ignores_unrelated_entries() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("hypr-session-tabs-a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        let found = snapshot_matching_files(dir.path());
        assert_eq!(found.len(), 1);
    }
}
