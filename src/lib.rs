pub mod cli;
pub mod config;
pub mod content_render;
pub mod error;
pub mod grouping;
pub mod index;
pub mod launch;
pub mod loader;
pub mod log_entry;
pub mod logging;
pub mod navigation;
pub mod parser;
pub mod project_path;
pub mod symbols;
pub mod theme;
pub mod tool_summary;
pub mod tui;
pub mod viewport;
