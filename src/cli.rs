//! Command-line surface: save/restore/list/delete/recover/health.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hypr-sessions")]
#[command(about = "Capture, restore, and archive Hyprland workspace sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity for this invocation without touching RUST_LOG.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit the full structured result as pretty JSON instead of a summary.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Capture the active workspace into a named session.
    Save { name: String },

    /// Relaunch a previously saved session.
    Restore { name: String },

    /// List sessions.
    List {
        #[arg(long)]
        archived: bool,
        #[arg(long)]
        all: bool,
    },

    /// Archive a session (the CLI verb stays `delete` for compatibility).
    Delete { name: String },

    /// Recover an archived session back into `active/`.
    Recover {
        archived_name: String,
        new_name: Option<String>,
    },

    /// Aggregate health check: directory access, config bounds, markers.
    Health,
}
