mod archive;
mod cli;
mod compositor;
mod config;
mod error;
mod handlers;
mod health;
mod launch;
mod model;
mod paths;
mod process;
mod recover;
mod restorer;
mod result;
mod saver;
mod store;
mod validator;

use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use error::Error;
use result::{OperationResult, Status};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let (config, config_warnings) = Config::from_env();

    let root = match paths::store_root() {
        Ok(root) => root,
        Err(e) => {
            emit(&error_result("startup", &e), cli.json);
            std::process::exit(1);
        }
    };

    let migration = match paths::ensure_layout(&root) {
        Ok(report) => report,
        Err(e) => {
            emit(&error_result("startup", &e), cli.json);
            std::process::exit(1);
        }
    };

    let mut result = run_command(&cli.command, &root, &config);
    for name in &migration.migrated {
        result.push_success(
            format!("migrated legacy session '{name}' into active/"),
            Some("migration".to_string()),
        );
    }
    for warning in &config_warnings {
        result.push_warning(
            format!("ignoring {} = '{}': {}", warning.var, warning.raw_value, warning.reason),
            Some("config".to_string()),
        );
    }

    let exit_code = result.exit_code();
    emit(&result, cli.json);
    std::process::exit(exit_code);
}

fn run_command(command: &Command, root: &std::path::Path, config: &Config) -> OperationResult {
    match command {
        Command::Save { name } => saver::SessionSaver::new(root)
            .save(name)
            .unwrap_or_else(|e| error_result("save", &e)),
        Command::Restore { name } => restorer::SessionRestorer::new(root, config)
            .restore(name)
            .unwrap_or_else(|e| error_result("restore", &e)),
        Command::Delete { name } => archive::SessionArchiver::new(root, config)
            .archive(name)
            .unwrap_or_else(|e| error_result("archive", &e)),
        Command::Recover {
            archived_name,
            new_name,
        } => recover::SessionRecover::new(root)
            .recover(archived_name, new_name.as_deref())
            .unwrap_or_else(|e| error_result("recover", &e)),
        Command::List { archived, all } => run_list(root, *archived, *all),
        Command::Health => health::run_health_check(root, config),
    }
}

fn run_list(root: &std::path::Path, archived: bool, all: bool) -> OperationResult {
    let mut result = OperationResult::new("list");

    let active = if archived && !all {
        Vec::new()
    } else {
        match store::list_active(root) {
            Ok(sessions) => sessions,
            Err(e) => return error_result("list", &e),
        }
    };

    let archived_sessions = if archived || all {
        match store::list_archived(root) {
            Ok(sessions) => sessions,
            Err(e) => return error_result("list", &e),
        }
    } else {
        Vec::new()
    };

    result.push_success(
        format!(
            "{} active, {} archived",
            active.len(),
            archived_sessions.len()
        ),
        None,
    );
    result.set_data(serde_json::json!({
        "active": active,
        "archived": archived_sessions,
    }));
    result
}

fn error_result(operation: &str, err: &Error) -> OperationResult {
    let mut result = OperationResult::new(operation);
    result.push_error_from(err);
    result
}

fn emit(result: &OperationResult, json: bool) {
    if json {
        match result.to_json_pretty() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize result: {e}"),
        }
    } else {
        println!("{}", result.human_summary());
        for message in &result.messages {
            match message.status {
                Status::Success => {}
                Status::Warning => eprintln!("warning: {}", message.message),
                Status::Error => eprintln!("error: {}", message.message),
            }
        }
    }
}

/// Installs a process-scoped `tracing` subscriber honoring `RUST_LOG`;
/// `--debug` raises the default filter floor for this invocation without
/// mutating the environment or any global outside this call.
fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
