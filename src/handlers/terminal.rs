//! Terminal emulator capture: working directory plus the foreground program,
//! distinct from the shell itself.

use super::{base_record, CaptureContext, CaptureHandler, HandlerOutcome};
use crate::compositor::ClientWindow;
use crate::model::RunningProgram;

pub struct TerminalHandler;

impl CaptureHandler for TerminalHandler {
    fn capture(&self, window: &ClientWindow, ctx: &CaptureContext<'_>) -> HandlerOutcome {
        let mut record = base_record(window);
        let mut warnings = Vec::new();

        record.working_directory = ctx.introspector.working_directory(window.pid);
        if record.working_directory.is_none() {
            warnings.push(format!(
                "could not read working directory for pid {} ({})",
                window.pid, window.class
            ));
        }

        match ctx.introspector.running_program_for_terminal(window.pid) {
            Some(info) => {
                record.running_program = Some(RunningProgram {
                    name: info.name,
                    args: info.args,
                    full_command: info.full_command,
                    shell_command: info.shell_command,
                });
            }
            None => {
                // A shell sitting idle at a prompt is not a warning-worthy
                // condition; only surface this when a working directory was
                // also unavailable, which usually indicates a deeper read
                // failure rather than "nothing running".
                if record.working_directory.is_none() {
                    warnings.push(format!(
                        "no foreground program detected for pid {}",
                        window.pid
                    ));
                }
            }
        }

        HandlerOutcome { record, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::CompositorClient;
    use crate::process::ProcessIntrospector;
    use std::path::Path;

    #[test]
    fn missing_process_still_produces_a_record() {
        let window = ClientWindow {
            class: "kitty".to_string(),
            title: "term".to_string(),
            pid: i32::MAX,
            position: (0, 0),
            size: (100, 100),
            address: "0x1".to_string(),
            workspace_id: 1,
            grouped_with: Vec::new(),
        };
        let introspector = ProcessIntrospector::new();
        let compositor = CompositorClient::new();
        let ctx = CaptureContext {
            session_dir: Path::new("/tmp"),
            compositor: &compositor,
            introspector: &introspector,
        };
        let outcome = TerminalHandler.capture(&window, &ctx);
        assert_eq!(outcome.record.class, "kitty");
        assert!(outcome.record.working_directory.is_none());
        assert!(!outcome.warnings.is_empty());
    }
}
