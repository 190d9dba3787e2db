//! Symbol set for TUI rendering.
//!
//! Unicode mode uses prettier glyphs; ASCII mode uses basic characters
//! for better compatibility with terminals that lack Unicode support.

/// Symbol set for TUI rendering.
#[derive(Debug, Clone)]
pub struct Symbols {
    /// Expanded item (Unicode: `▼` / ASCII: `v`)
    pub expanded: &'static str,
    /// Collapsed item (Unicode: `▶` / ASCII: `>`)
    pub collapsed: &'static str,
    /// Tree connector for tool-run members (Unicode: `└` / ASCII: `` `- ``)
    pub tree_connector: &'static str,
    /// Item that leads into a sidechain (Unicode: `↳` / ASCII: `->`)
    pub sidechain: &'static str,
    /// Separator between breadcrumb levels (Unicode: `›` / ASCII: `>`)
    pub breadcrumb: &'static str,
    /// Truncation suffix (Unicode: `…` / ASCII: `...`)
    pub ellipsis: &'static str,
}

impl Symbols {
    /// When `ascii_mode` is `true`, returns ASCII-safe characters.
    pub fn new(ascii_mode: bool) -> Self {
        if ascii_mode {
            Self::ascii()
        } else {
            Self::unicode()
        }
    }

    pub fn unicode() -> Self {
        Self {
            expanded: "\u{25bc}",       // ▼
            collapsed: "\u{25b6}",      // ▶
            tree_connector: "\u{2514}", // └
            sidechain: "\u{21b3}",      // ↳
            breadcrumb: "\u{203a}",     // ›
            ellipsis: "\u{2026}",       // …
        }
    }

    pub fn ascii() -> Self {
        Self {
            expanded: "v",
            collapsed: ">",
            tree_connector: "`-",
            sidechain: "->",
            breadcrumb: ">",
            ellipsis: "...",
        }
    }

    /// Marker for an item in the given expansion state.
    pub fn fold(&self, expanded: bool) -> &'static str {
        if expanded {
            self.expanded
        } else {
            self.collapsed
        }
    }
}
