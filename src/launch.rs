//! Pure mapping from a captured `WindowRecord` to a restore command string.
//!
//! Never invokes a shell itself — it only produces the string that the
//! compositor client will later hand to `dispatch_exec`. Every user-supplied
//! path, URL, or program argument is POSIX shell-quoted before being
//! embedded.

use crate::handlers::{classify, AppKind};
use crate::model::WindowRecord;

/// Per-terminal-emulator CLI for setting the working directory and for
/// running a command that keeps the terminal alive afterward.
struct TerminalProfile {
    binary: String,
    working_dir_flag: &'static str,
    exec_flag: &'static str,
}

fn terminal_profile(class: &str) -> TerminalProfile {
    let lower = class.to_ascii_lowercase();
    match lower.as_str() {
        "alacritty" => TerminalProfile {
            binary: "alacritty".to_string(),
            working_dir_flag: "--working-directory",
            exec_flag: "-e",
        },
        "foot" => TerminalProfile {
            binary: "foot".to_string(),
            working_dir_flag: "-D",
            exec_flag: "-e",
        },
        "wezterm" => TerminalProfile {
            binary: "wezterm".to_string(),
            working_dir_flag: "--cwd",
            exec_flag: "-e",
        },
        // `kitty`, and any class this mapping doesn't know about, falls
        // back to its own lowercase class string as the binary name.
        other => TerminalProfile {
            binary: other.to_string(),
            working_dir_flag: "--directory",
            exec_flag: "-e",
        },
    }
}

fn editor_binary(class: &str) -> String {
    match class.to_ascii_lowercase().as_str() {
        "neovide" => "neovide".to_string(),
        other => other.to_string(),
    }
}

fn browser_binary(class: &str) -> String {
    match class.to_ascii_lowercase().as_str() {
        "google-chrome" => "google-chrome-stable".to_string(),
        other => other.to_string(),
    }
}

/// Single-quotes `s` for POSIX shells, escaping embedded single quotes with
/// the standard `'\''` idiom.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn build_launch_command(record: &WindowRecord) -> String {
    if let Some(browser) = &record.browser_session {
        let binary = browser_binary(&record.class);
        let urls = browser
            .tabs
            .iter()
            .map(|t| shell_quote(&t.url))
            .collect::<Vec<_>>()
            .join(" ");
        return if urls.is_empty() {
            binary
        } else {
            format!("{binary} {urls}")
        };
    }

    if let Some(neovide) = &record.neovide_session {
        let binary = editor_binary(&record.class);
        return match &neovide.session_file {
            Some(session_file) => format!("{binary} -- -S {}", shell_quote(session_file)),
            None => format!(
                "{binary} {}",
                shell_quote(&neovide.working_directory)
            ),
        };
    }

    if let Some(working_directory) = &record.working_directory {
        let profile = terminal_profile(&record.class);
        let wrapper = match &record.running_program {
            Some(program) => match &program.shell_command {
                Some(shell_command) => format!(
                    "trap 'echo Program interrupted' INT; {shell_command}; exec $SHELL"
                ),
                None => format!("{}; exec $SHELL", program.full_command),
            },
            None => "exec $SHELL".to_string(),
        };
        return format!(
            "{} {} {} {} sh -c {}",
            profile.binary,
            profile.working_dir_flag,
            shell_quote(working_directory),
            profile.exec_flag,
            shell_quote(&wrapper)
        );
    }

    // Reached when a Browser/Editor-classified window's typed capture failed
    // (e.g. the tab-snapshot poll timed out): still canonicalize the binary
    // name per §4.9's unconditional class-to-executable mapping, rather than
    // falling back to the raw class string reserved for truly unknown
    // classes.
    match classify(&record.class) {
        AppKind::Browser => browser_binary(&record.class),
        AppKind::Editor => editor_binary(&record.class),
        AppKind::Terminal | AppKind::Generic => record.class.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BrowserSession, BrowserTab, CaptureMethod, NeovideSession, Position, RunningProgram, Size};

    fn base_record(class: &str) -> WindowRecord {
        WindowRecord {
            class: class.to_string(),
            title: "t".to_string(),
            pid: 1,
            position: Position { x: 0, y: 0 },
            size: Size {
                width: 1,
                height: 1,
            },
            launch_command: String::new(),
            working_directory: None,
            running_program: None,
            neovide_session: None,
            browser_session: None,
            group_id: None,
        }
    }

    #[test]
    fn shell_quote_escapes_embedded_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn terminal_with_shell_command_wraps_with_trap() {
        let mut record = base_record("kitty");
        record.working_directory = Some("/home/user/project".to_string());
        record.running_program = Some(RunningProgram {
            name: "npm".to_string(),
            args: vec!["npm".to_string(), "run".to_string(), "dev".to_string()],
            full_command: "npm run dev".to_string(),
            shell_command: Some("npm run dev".to_string()),
        });
        let command = build_launch_command(&record);
        assert!(command.contains("kitty"));
        assert!(command.contains("--directory"));
        assert!(command.contains("trap 'echo Program interrupted' INT"));
        assert!(command.contains("exec $SHELL"));
    }

    #[test]
    fn terminal_with_direct_program_skips_trap() {
        let mut record = base_record("alacritty");
        record.working_directory = Some("/tmp".to_string());
        record.running_program = Some(RunningProgram {
            name: "vim".to_string(),
            args: vec!["vim".to_string()],
            full_command: "vim".to_string(),
            shell_command: None,
        });
        let command = build_launch_command(&record);
        assert!(command.contains("--working-directory"));
        assert!(!command.contains("trap"));
        assert!(command.contains("exec $SHELL"));
    }

    #[test]
    fn editor_with_session_file_uses_dash_s() {
        let mut record = base_record("neovide");
        record.neovide_session = Some(NeovideSession {
            working_directory: "/tmp".to_string(),
            session_file: Some("neovide-session-1.vim".to_string()),
        });
        let command = build_launch_command(&record);
        assert_eq!(command, "neovide -- -S 'neovide-session-1.vim'");
    }

    #[test]
    fn editor_without_session_file_opens_directory() {
        let mut record = base_record("neovide");
        record.neovide_session = Some(NeovideSession {
            working_directory: "/tmp/work".to_string(),
            session_file: None,
        });
        let command = build_launch_command(&record);
        assert_eq!(command, "neovide '/tmp/work'");
    }

    #[test]
    fn browser_with_tabs_lists_shell_quoted_urls() {
        let mut record = base_record("firefox");
        record.browser_session = Some(BrowserSession {
            browser_type: "firefox".to_string(),
            capture_method: CaptureMethod::KeyboardShortcut,
            tab_count: 2,
            window_id: "w1".to_string(),
            tabs: vec![
                BrowserTab {
                    url: "https://a.example".to_string(),
                    title: "A".to_string(),
                    active: true,
                    pinned: false,
                    index: 0,
                    window_id: "w1".to_string(),
                    entries: None,
                },
                BrowserTab {
                    url: "https://b.example".to_string(),
                    title: "B".to_string(),
                    active: false,
                    pinned: false,
                    index: 1,
                    window_id: "w1".to_string(),
                    entries: None,
                },
            ],
        });
        let command = build_launch_command(&record);
        assert_eq!(
            command,
            "firefox 'https://a.example' 'https://b.example'"
        );
    }

    #[test]
    fn generic_window_falls_back_to_class() {
        let record = base_record("some-app");
        assert_eq!(build_launch_command(&record), "some-app");
    }

    #[test]
    fn browser_window_with_failed_capture_still_canonicalizes_binary() {
        // No `browser_session` captured (e.g. the tab-snapshot poll timed
        // out) — the fallback must still map the class to its canonical
        // executable, not the raw class string.
        let record = base_record("google-chrome");
        assert_eq!(build_launch_command(&record), "google-chrome-stable");
    }

    #[test]
    fn editor_window_with_failed_capture_still_canonicalizes_binary() {
        let record = base_record("neovide");
        assert_eq!(build_launch_command(&record), "neovide");
    }

    /// Inverts `shell_quote`'s escaping for the `'...'\''...'` idiom, used
    /// only to check the round-trip property below.
    fn unquote_posix_single(quoted: &str) -> String {
        let inner = &quoted[1..quoted.len() - 1];
        inner.replace("'\\''", "'")
    }

    proptest::proptest! {
        #[test]
        fn shell_quote_round_trips_arbitrary_paths(s in "[-_a-zA-Z0-9/. '~]{0,40}") {
            let quoted = shell_quote(&s);
            proptest::prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
            proptest::prop_assert_eq!(unquote_posix_single(&quoted), s);
        }
    }
}
