use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Browse Claude Code conversation history as a navigable tree
#[derive(Parser, Debug)]
#[command(
    name = "cc-tree",
    version,
    about = "Browse Claude Code conversation history as a navigable tree"
)]
pub struct Cli {
    /// Root directory holding one subdirectory per project.
    /// Default: ~/.claude/projects
    #[arg(long, value_name = "DIR")]
    pub projects_dir: Option<PathBuf>,

    /// Only list conversations whose project path starts with PATH.
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Log debug details to the log file.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Color theme: dark or light
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Draw with ASCII symbols only.
    #[arg(long, default_value_t = false)]
    pub ascii: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the conversation list to stdout and exit
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print at most N conversations
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let cli = Cli::try_parse_from(["cc-tree"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.ascii);
        assert_eq!(cli.projects_dir, None);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "cc-tree",
            "--projects-dir",
            "/logs",
            "--project",
            "/work/app",
            "--verbose",
            "--theme",
            "light",
            "--ascii",
        ])
        .unwrap();
        assert_eq!(cli.projects_dir, Some(PathBuf::from("/logs")));
        assert_eq!(cli.project, Some(PathBuf::from("/work/app")));
        assert!(cli.verbose);
        assert!(cli.ascii);
        assert_eq!(cli.theme, Some(Theme::Light));
    }

    #[test]
    fn test_parse_list_subcommand() {
        let cli = Cli::try_parse_from(["cc-tree", "list", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::List(args)) => assert_eq!(args.limit, Some(5)),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_theme_rejected() {
        assert!(Cli::try_parse_from(["cc-tree", "--theme", "solarized"]).is_err());
    }
}
