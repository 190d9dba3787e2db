use cctree::cli::{Cli, Commands, ListArgs};
use cctree::config::{build_config, AppConfig};
use cctree::index::{build_index, IndexFilter};
use cctree::logging;
use cctree::parser::ConversationSummary;
use cctree::tui;
use chrono::Local;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = build_config(&cli);

    // Keep the guard alive so buffered log lines are flushed at exit.
    let log_guard = match logging::default_log_dir() {
        Some(dir) => match logging::init(&dir, app_config.verbose) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("cc-tree: warning: logging disabled: {}", e);
                None
            }
        },
        None => None,
    };
    tracing::debug!(config = ?app_config, "effective config");

    match cli.command {
        Some(Commands::List(ref args)) => run_list(&app_config, args),
        None => match tui::run_tui(app_config) {
            Ok(code) => {
                drop(log_guard);
                std::process::exit(code);
            }
            Err(e) => {
                eprintln!("cc-tree: {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Print the conversation list without starting the TUI.
fn run_list(config: &AppConfig, args: &ListArgs) {
    let Some(root) = config.projects_dir.as_deref() else {
        eprintln!("cc-tree: no projects directory found; pass --projects-dir");
        std::process::exit(1);
    };
    let filter = IndexFilter {
        project: config.project.clone(),
    };
    let index = build_index(root, &filter);
    let limit = args.limit.unwrap_or(index.len());
    for summary in index.iter().take(limit) {
        println!("{}", list_line(summary, &config.display.timestamp_format));
    }
}

fn list_line(summary: &ConversationSummary, timestamp_format: &str) -> String {
    let when = summary
        .last_timestamp
        .map(|t| t.with_timezone(&Local).format(timestamp_format).to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {}  {:>3} prompts  {}  {}",
        when,
        summary.project_name,
        summary.message_count,
        summary.session_id,
        summary.title()
    )
}
