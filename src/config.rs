use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Theme};
use crate::project_path::default_projects_dir;

// ---------------------------------------------------------------------------
// TOML-deserializable config (intermediate representation)
// ---------------------------------------------------------------------------

/// Raw config as parsed from the TOML file.
/// All fields are optional so that missing keys fall through to defaults.
/// Unknown keys are silently ignored by serde.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    verbose: Option<bool>,
    theme: Option<String>,
    projects_dir: Option<PathBuf>,
    display: FileDisplayConfig,
    commands: FileCommandsConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileDisplayConfig {
    timestamp_format: Option<String>,
    ascii: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileCommandsConfig {
    resume: Option<String>,
    editor: Option<String>,
}

// ---------------------------------------------------------------------------
// Effective (merged) config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Root of the conversation logs. `None` only when no home directory
    /// can be found and nothing was configured.
    pub projects_dir: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub verbose: bool,
    pub theme: Theme,
    pub display: DisplayConfig,
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub timestamp_format: String,
    pub ascii: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandsConfig {
    /// Program run as `<resume> --resume <session id>`.
    pub resume: String,
    /// Editor used when neither `$VISUAL` nor `$EDITOR` is set.
    pub editor: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            project: None,
            verbose: false,
            theme: Theme::Dark,
            display: DisplayConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
            ascii: false,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            resume: "claude".to_string(),
            editor: "vi".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Returns the default config file path: `~/.config/cc-tree/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cc-tree").join("config.toml"))
}

/// Load the config file from the given path.
/// Returns the parsed `FileConfig`, or `None` if the file does not exist
/// or cannot be parsed.
fn load_file_config(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!(
                    "cc-tree: warning: failed to parse config file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        },
        Err(e) => {
            eprintln!(
                "cc-tree: warning: failed to read config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Parse a theme string from the config file into a `Theme` enum.
/// Returns `None` if the string is not recognized (caller uses default).
fn parse_theme(s: &str) -> Option<Theme> {
    match s.to_lowercase().as_str() {
        "dark" => Some(Theme::Dark),
        "light" => Some(Theme::Light),
        other => {
            eprintln!(
                "cc-tree: warning: unknown theme \"{}\", using default",
                other
            );
            None
        }
    }
}

/// Expand a leading `~/` in a configured path.
fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|h| h.join(rest)).unwrap_or(path),
        Err(_) => path,
    }
}

/// Build the effective `AppConfig` by merging defaults, config file, and CLI args.
///
/// Precedence (highest wins):
/// 1. CLI flags (if explicitly provided)
/// 2. Config file values
/// 3. Hardcoded defaults
pub fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::default();

    let config_path = cli.config.clone().or_else(default_config_path);

    if let Some(ref path) = config_path {
        if let Some(file_cfg) = load_file_config(path) {
            apply_file_config(&mut config, file_cfg);
        } else if cli.config.is_some() && !path.exists() {
            eprintln!(
                "cc-tree: warning: config file not found: {}",
                path.display()
            );
        }
    }

    if cli.projects_dir.is_some() {
        config.projects_dir = cli.projects_dir.clone();
    }
    if let Some(ref project) = cli.project {
        // Log paths are absolute; a relative `--project .` is resolved here.
        config.project = Some(std::fs::canonicalize(project).unwrap_or_else(|_| project.clone()));
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(ref theme) = cli.theme {
        config.theme = theme.clone();
    }
    if cli.ascii {
        config.display.ascii = true;
    }

    config
}

fn apply_file_config(config: &mut AppConfig, file_cfg: FileConfig) {
    if let Some(v) = file_cfg.verbose {
        config.verbose = v;
    }
    if let Some(ref t) = file_cfg.theme {
        if let Some(theme) = parse_theme(t) {
            config.theme = theme;
        }
    }
    if let Some(dir) = file_cfg.projects_dir {
        config.projects_dir = Some(expand_home(dir));
    }
    if let Some(fmt) = file_cfg.display.timestamp_format {
        config.display.timestamp_format = fmt;
    }
    if let Some(ascii) = file_cfg.display.ascii {
        config.display.ascii = ascii;
    }
    if let Some(resume) = file_cfg.commands.resume.filter(|s| !s.trim().is_empty()) {
        config.commands.resume = resume;
    }
    if let Some(editor) = file_cfg.commands.editor.filter(|s| !s.trim().is_empty()) {
        config.commands.editor = editor;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
