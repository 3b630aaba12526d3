//! Per-application capture strategies.
//!
//! The set of handlers is closed: every window class resolves to exactly
//! one of {Terminal, Editor, Browser, Generic}, and each variant implements
//! the same capability trait.

mod browser;
mod editor;
mod terminal;

pub use browser::BrowserHandler;
pub use editor::EditorHandler;
pub use terminal::TerminalHandler;

use crate::compositor::{ClientWindow, CompositorClient};
use crate::model::{Position, Size, WindowRecord};
use crate::process::ProcessIntrospector;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Terminal,
    Editor,
    Browser,
    Generic,
}

const TERMINAL_CLASSES: &[&str] = &["kitty", "alacritty", "foot", "wezterm"];
const EDITOR_CLASSES: &[&str] = &["neovide"];
const BROWSER_CLASSES: &[&str] = &["firefox", "chromium", "brave-browser", "google-chrome"];

pub fn classify(class: &str) -> AppKind {
    let lower = class.to_ascii_lowercase();
    if TERMINAL_CLASSES.contains(&lower.as_str()) {
        AppKind::Terminal
    } else if EDITOR_CLASSES.contains(&lower.as_str()) {
        AppKind::Editor
    } else if BROWSER_CLASSES.contains(&lower.as_str()) {
        AppKind::Browser
    } else {
        AppKind::Generic
    }
}

/// Shared read-only context every handler may consult; nothing here is
/// mutated, so handlers never need interior mutability.
pub struct CaptureContext<'a> {
    pub session_dir: &'a Path,
    pub compositor: &'a CompositorClient,
    pub introspector: &'a ProcessIntrospector,
}

/// What a handler produces: a best-effort `WindowRecord` (minus
/// `launch_command`, filled in later by the launch-command builder) plus
/// any non-fatal warnings encountered along the way.
pub struct HandlerOutcome {
    pub record: WindowRecord,
    pub warnings: Vec<String>,
}

pub trait CaptureHandler {
    fn capture(&self, window: &ClientWindow, ctx: &CaptureContext<'_>) -> HandlerOutcome;
}

/// Base fields every handler starts from, independent of application kind.
pub fn base_record(window: &ClientWindow) -> WindowRecord {
    WindowRecord {
        class: window.class.clone(),
        title: window.title.clone(),
        pid: window.pid,
        position: Position {
            x: window.position.0,
            y: window.position.1,
        },
        size: Size {
            width: window.size.0,
            height: window.size.1,
        },
        launch_command: String::new(),
        working_directory: None,
        running_program: None,
        neovide_session: None,
        browser_session: None,
        group_id: None,
    }
}

pub struct GenericHandler;

impl CaptureHandler for GenericHandler {
    fn capture(&self, window: &ClientWindow, _ctx: &CaptureContext<'_>) -> HandlerOutcome {
        HandlerOutcome {
            record: base_record(window),
            warnings: Vec::new(),
        }
    }
}

/// Dispatches `window` to the most specific handler for its class.
pub fn capture_window(window: &ClientWindow, ctx: &CaptureContext<'_>) -> HandlerOutcome {
    match classify(&window.class) {
        AppKind::Terminal => TerminalHandler.capture(window, ctx),
        AppKind::Editor => EditorHandler.capture(window, ctx),
        AppKind::Browser => BrowserHandler.capture(window, ctx),
        AppKind::Generic => GenericHandler.capture(window, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_known_terminal() {
        assert_eq!(classify("kitty"), AppKind::Terminal);
        assert_eq!(classify("Kitty"), AppKind::Terminal);
    }

    #[test]
    fn classify_falls_back_to_generic() {
        assert_eq!(classify("some-unknown-app"), AppKind::Generic);
    }

    #[test]
    fn classify_recognizes_editor_and_browser() {
        assert_eq!(classify("neovide"), AppKind::Editor);
        assert_eq!(classify("firefox"), AppKind::Browser);
    }
}
