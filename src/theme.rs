//! Theme support for the TUI.
//!
//! Provides a [`ThemeColors`] struct containing all color definitions used
//! by the conversation list, the detail view, the status bar and the help
//! overlay. Two constructors are provided: [`ThemeColors::dark()`] and
//! [`ThemeColors::light()`].
//!
//! All colors use the 16 basic ANSI palette for maximum terminal compatibility.

use ratatui::style::Color;

use crate::cli::Theme;

// ---------------------------------------------------------------------------
// ThemeColors
// ---------------------------------------------------------------------------

/// All color definitions for the TUI, grouped by component.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    // -- Borders -----------------------------------------------------------
    pub border_focused: Color,
    pub border_unfocused: Color,

    // -- Selection ---------------------------------------------------------
    pub selected_fg: Color,
    pub selected_bg: Color,

    // -- Conversation list -------------------------------------------------
    /// Placeholder text (e.g. "No conversations found").
    pub list_placeholder: Color,
    pub list_title: Color,
    pub list_project: Color,
    pub list_timestamp: Color,
    /// Prompt count column.
    pub list_count: Color,

    // -- Detail view -------------------------------------------------------
    pub role_user: Color,
    pub role_assistant: Color,
    /// Tool call summaries and tool-run headers.
    pub tool_use: Color,
    pub thinking: Color,
    pub message_text: Color,
    pub message_timestamp: Color,
    /// First line shown for a collapsed message.
    pub collapsed_preview: Color,
    /// Marker on items that lead into a sidechain.
    pub sidechain_marker: Color,
    /// "conversation failed to load" and similar.
    pub error_text: Color,

    // -- Status bar --------------------------------------------------------
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_separator: Color,
    pub status_shortcut_key: Color,
    pub status_loading: Color,

    // -- Help overlay ------------------------------------------------------
    pub overlay_bg: Color,
    pub overlay_fg: Color,
    pub overlay_key: Color,
}

impl ThemeColors {
    /// Construct the theme colors from the CLI/config theme enum.
    pub fn from_theme(theme: &Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            selected_fg: Color::White,
            selected_bg: Color::DarkGray,

            list_placeholder: Color::DarkGray,
            list_title: Color::White,
            list_project: Color::Cyan,
            list_timestamp: Color::DarkGray,
            list_count: Color::Yellow,

            role_user: Color::Blue,
            role_assistant: Color::Green,
            tool_use: Color::Yellow,
            thinking: Color::Magenta,
            message_text: Color::White,
            message_timestamp: Color::DarkGray,
            collapsed_preview: Color::Gray,
            sidechain_marker: Color::LightMagenta,
            error_text: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_separator: Color::Gray,
            status_shortcut_key: Color::Yellow,
            status_loading: Color::LightCyan,

            overlay_bg: Color::Black,
            overlay_fg: Color::White,
            overlay_key: Color::Yellow,
        }
    }

    /// Light theme: adjusted for readability on light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            border_focused: Color::Blue,
            border_unfocused: Color::Gray,

            selected_fg: Color::White,
            selected_bg: Color::Blue,

            list_placeholder: Color::Gray,
            list_title: Color::Black,
            list_project: Color::Blue,
            list_timestamp: Color::DarkGray,
            list_count: Color::Magenta,

            role_user: Color::Blue,
            role_assistant: Color::Green,
            tool_use: Color::Magenta,
            thinking: Color::DarkGray,
            message_text: Color::Black,
            message_timestamp: Color::Gray,
            collapsed_preview: Color::DarkGray,
            sidechain_marker: Color::Magenta,
            error_text: Color::Red,

            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_separator: Color::DarkGray,
            status_shortcut_key: Color::Blue,
            status_loading: Color::Blue,

            overlay_bg: Color::White,
            overlay_fg: Color::Black,
            overlay_key: Color::Blue,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_theme_differs_from_dark() {
        let dark = ThemeColors::dark();
        let light = ThemeColors::light();
        assert_ne!(dark.message_text, light.message_text);
        assert_ne!(dark.status_bar_bg, light.status_bar_bg);
        assert_ne!(dark.overlay_bg, light.overlay_bg);
    }

    #[test]
    fn test_from_theme() {
        assert_eq!(ThemeColors::from_theme(&Theme::Dark), ThemeColors::dark());
        assert_eq!(ThemeColors::from_theme(&Theme::Light), ThemeColors::light());
    }

    #[test]
    fn test_no_reset_colors() {
        for t in [ThemeColors::dark(), ThemeColors::light()] {
            assert_ne!(t.border_focused, Color::Reset);
            assert_ne!(t.message_text, Color::Reset);
            assert_ne!(t.selected_bg, Color::Reset);
            assert_ne!(t.overlay_bg, Color::Reset);
        }
    }
}
