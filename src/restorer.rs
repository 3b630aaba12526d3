//! Restore orchestration: loads a session, launches ungrouped windows
//! first, then launches and locks each group, pacing dispatches with a
//! configurable delay.

use crate::compositor::CompositorClient;
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::model::Session;
use crate::paths;
use crate::result::OperationResult;
use crate::validator::validate_session_name;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub struct SessionRestorer<'a> {
    root: &'a Path,
    config: &'a Config,
    compositor: CompositorClient,
}

impl<'a> SessionRestorer<'a> {
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self {
            root,
            config,
            compositor: CompositorClient::new(),
        }
    }

    pub fn restore(&self, name: &str) -> Result<OperationResult> {
        let mut result = OperationResult::new("restore");
        validate_session_name(name)?;

        let session_dir = paths::session_dir(self.root, name);
        if !session_dir.is_dir() {
            return Err(Error::not_found(name, "active/"));
        }

        let session = load_session(&session_dir)?;
        let delay = Duration::from_secs_f64(self.config.delay_between_instructions);

        for window in session.ungrouped() {
            match self.compositor.dispatch_exec(&window.launch_command) {
                Ok(()) => result.push_success(
                    format!("launched {}", window.class),
                    None,
                ),
                // A compositor failure means hyprctl itself is unreachable or
                // misbehaving, not that this one window failed to launch;
                // every remaining dispatch would fail the same way, so §4.11
                // requires aborting the rest of the operation rather than
                // warning-and-continuing.
                Err(e) if e.kind() == ErrorKind::CompositorFailure => return Err(e),
                Err(e) => result.push_warning(
                    format!("failed to launch {}: {e}", window.class),
                    Some(e.kind().to_string()),
                ),
            }
            sleep(delay);
        }

        for group in &session.groups {
            let members = session.group_members(group);
            if let Err(e) = self.launch_group(&members, delay, &mut result) {
                if e.kind() == ErrorKind::CompositorFailure {
                    return Err(e);
                }
                result.push_error(
                    format!("group {} failed, degrading to ungrouped launches: {e}", group.id),
                    Some(e.kind().to_string()),
                );
                for window in &members {
                    match self.compositor.dispatch_exec(&window.launch_command) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::CompositorFailure => return Err(e),
                        Err(e) => result.push_warning(
                            format!("fallback launch of {} failed: {e}", window.class),
                            None,
                        ),
                    }
                    sleep(delay);
                }
            }
        }

        if !result.has_errors() {
            result.push_success(format!("restored session '{name}'"), None);
        }
        Ok(result)
    }

    fn launch_group(
        &self,
        members: &[&crate::model::WindowRecord],
        delay: Duration,
        result: &mut OperationResult,
    ) -> Result<()> {
        let Some((leader, rest)) = members.split_first() else {
            return Ok(());
        };

        self.compositor.dispatch_exec(&leader.launch_command)?;
        result.push_success(format!("launched group leader {}", leader.class), None);
        sleep(delay);

        self.compositor.dispatch_toggle_group()?;
        sleep(delay);

        for member in rest {
            self.compositor.dispatch_exec(&member.launch_command)?;
            result.push_success(format!("launched group member {}", member.class), None);
            sleep(delay);
        }

        self.compositor.dispatch_lock_active_group()?;
        Ok(())
    }
}

fn sleep(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

fn load_session(session_dir: &Path) -> Result<Session> {
    let path = paths::session_json_path(session_dir);
    let raw = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    serde_json::from_str(&raw).map_err(|e| Error::Corrupt(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Position, Size, WindowRecord};

    fn sample_window(class: &str, group_id: Option<u32>) -> WindowRecord {
        WindowRecord {
            class: class.to_string(),
            title: class.to_string(),
            pid: 1,
            position: Position { x: 0, y: 0 },
            size: Size {
                width: 1,
                height: 1,
            },
            launch_command: class.to_string(),
            working_directory: None,
            running_program: None,
            neovide_session: None,
            browser_session: None,
            group_id,
        }
    }

    #[test]
    fn load_session_surfaces_corrupt_json_as_corrupt_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(paths::session_json_path(dir.path()), "not json").unwrap();
        let err = load_session(dir.path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Corrupt);
    }

    #[test]
    fn restore_missing_session_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let config = Config::default();
        let restorer = SessionRestorer::new(root.path(), &config);
        let err = restorer.restore("missing").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn compositor_failure_aborts_restore_instead_of_warning() {
        // `hyprctl` is not present in the test sandbox, so every dispatch
        // fails with `CompositorFailure`; per §4.11 that must abort the
        // whole restore rather than being downgraded to a per-window
        // warning.
        let root = tempfile::tempdir().unwrap();
        paths::ensure_layout(root.path()).unwrap();
        let session_dir = paths::session_dir(root.path(), "work");
        fs::create_dir_all(&session_dir).unwrap();
        let session = Session {
            windows: vec![sample_window("a", None)],
            groups: vec![],
            workspace: 1,
        };
        fs::write(
            paths::session_json_path(&session_dir),
            serde_json::to_string(&session).unwrap(),
        )
        .unwrap();

        let config = Config::default();
        let restorer = SessionRestorer::new(root.path(), &config);
        let err = restorer.restore("work").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CompositorFailure);
    }

    #[test]
    fn ungrouped_and_group_partition_preserves_order() {
        let session = Session {
            windows: vec![
                sample_window("a", None),
                sample_window("b", Some(1)),
                sample_window("c", Some(1)),
            ],
            groups: vec![Group {
                id: 1,
                window_indices: vec![1, 2],
            }],
            workspace: 1,
        };
        assert_eq!(session.ungrouped().len(), 1);
        assert_eq!(session.group_members(&session.groups[0]).len(), 2);
    }
}
