//! Layout and rendering for the TUI.
//!
//! Two screens share one layout:
//! - **Main panel** (fills): the conversation list, or the conversation on
//!   top of the navigation stack
//! - **Status bar** (bottom, height 1): load state, position and key hints
//!
//! The detail view is virtualised: only items in the viewport's visible
//! range are turned into lines. Each of them is measured at the current
//! wrap width and reported back through
//! [`SelectableViewport::resolve_height`] before anything is painted.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::content_render::{preview_line, render_content, RenderedLine};
use crate::grouping::ListItem;
use crate::loader::LoadTarget;
use crate::parser::{extract_user_text, Message};
use crate::symbols::Symbols;
use crate::theme::ThemeColors;
use crate::tool_summary::sanitize_for_terminal;
use crate::tui::app::{App, Conversation, Screen};
use crate::viewport::SelectableViewport;

/// Upper bound on measure/scroll rounds per frame.
const MAX_LAYOUT_PASSES: usize = 8;

/// Indent of message bodies under their header line.
const BODY_INDENT: &str = "  ";

// ---------------------------------------------------------------------------
// Main draw function
// ---------------------------------------------------------------------------

/// Draw the entire TUI frame.
///
/// Splits the terminal into the main panel (fills) and the status bar
/// (1 row), then draws the help overlay on top when visible.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(size);

    let main_area = vertical_chunks[0];
    let status_area = vertical_chunks[1];

    match app.screen {
        Screen::Index => draw_index(frame, app, main_area),
        Screen::Detail => draw_detail(frame, app, main_area),
    }

    draw_status_bar(frame, app, status_area);

    if app.help_overlay_visible {
        draw_help_overlay(frame, app, size);
    }
}

/// Bordered panel used by both screens.
fn panel<'a>(title: String, theme: &ThemeColors) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
}

fn draw_placeholder(frame: &mut Frame, block: Block, text: &str, style: Style, area: Rect) {
    let placeholder = Paragraph::new(text.to_string())
        .style(style)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(placeholder, area);
}

// ---------------------------------------------------------------------------
// Conversation list
// ---------------------------------------------------------------------------

/// Draw the conversation list. Each entry is two rows: the title, then
/// project, last activity and prompt count.
fn draw_index(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme_colors;
    let title = if app.index_loading {
        " Conversations ".to_string()
    } else {
        format!(" Conversations ({}) ", app.index.len())
    };
    let block = panel(title, theme);

    if app.index_loading {
        let style = Style::default().fg(theme.status_loading);
        draw_placeholder(frame, block, "Loading conversations...", style, area);
        return;
    }
    if app.index.is_empty() {
        let style = Style::default().fg(theme.list_placeholder);
        draw_placeholder(frame, block, "No conversations found", style, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let viewport = &mut app.index_viewport;
    viewport.set_viewport_height(inner.height as usize);
    let width = inner.width as usize;
    let selected = viewport.selected();

    for i in viewport.visible_range() {
        let summary = &app.index[i];
        let is_selected = selected == Some(i);

        let mut title_style = Style::default().fg(theme.list_title);
        if is_selected {
            title_style = title_style
                .fg(theme.selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        let meta = format!(
            "{}{} \u{00b7} {} \u{00b7} {} prompts",
            BODY_INDENT,
            summary.project_name,
            format_timestamp(summary.last_timestamp, &app.config.display.timestamp_format),
            summary.message_count,
        );
        let lines = vec![
            Line::from(Span::styled(
                fit(summary.title(), width, app.symbols.ellipsis),
                title_style,
            )),
            Line::from(Span::styled(
                fit(&meta, width, app.symbols.ellipsis),
                Style::default().fg(theme.list_project),
            )),
        ];

        let mut paragraph = Paragraph::new(lines);
        if is_selected {
            paragraph = paragraph.style(Style::default().bg(theme.selected_bg));
        }
        paint_item(frame, inner, viewport, i, paragraph);
    }
}

// ---------------------------------------------------------------------------
// Conversation detail
// ---------------------------------------------------------------------------

/// Draw the conversation on top of the navigation stack, or a loading or
/// error placeholder.
fn draw_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme_colors;
    let symbols = &app.symbols;

    let mut crumbs: Vec<&str> = app.nav.breadcrumbs().map(|c| c.title.as_str()).collect();
    if let Some(pending) = &app.pending {
        if pending.target == LoadTarget::Root {
            crumbs.clear();
        }
        crumbs.push(pending.title.as_str());
    }
    let separator = format!(" {} ", symbols.breadcrumb);
    let title = format!(" {} ", crumbs.join(&separator));
    let block = panel(fit(&title, area.width.saturating_sub(2) as usize, symbols.ellipsis), theme);

    let nothing_open = app.nav.is_empty();
    if nothing_open {
        let text = if app.pending.is_some() {
            "Loading conversation..."
        } else {
            "No conversation open"
        };
        draw_placeholder(frame, block, text, Style::default().fg(theme.status_loading), area);
        return;
    }

    let inner = block.inner(area);

    let Some((conv, viewport)) = app.nav.top_with_viewport() else {
        return;
    };
    if let Some(error) = &conv.load_error {
        draw_placeholder(frame, block, error, Style::default().fg(theme.error_text), area);
        return;
    }
    if conv.items.is_empty() {
        let style = Style::default().fg(theme.list_placeholder);
        draw_placeholder(frame, block, "No messages", style, area);
        return;
    }

    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let ctx = RenderCtx {
        theme,
        symbols,
        timestamp_format: &app.config.display.timestamp_format,
        width: inner.width as usize,
    };

    if conv.measured_width != Some(inner.width) {
        viewport.invalidate_all();
        conv.measured_width = Some(inner.width);
    }
    viewport.set_viewport_height(inner.height as usize);
    settle_heights(conv, viewport, inner.width, &ctx);

    let selected = viewport.selected();
    for i in viewport.visible_range() {
        let mut paragraph = Paragraph::new(Text::from(item_lines(conv, i, &ctx)))
            .wrap(Wrap { trim: false });
        if selected == Some(i) {
            paragraph = paragraph.style(Style::default().bg(theme.selected_bg));
        }
        paint_item(frame, inner, viewport, i, paragraph);
    }
}

/// Measure every visible item and feed the heights back until the window
/// stops moving.
fn settle_heights(
    conv: &Conversation,
    viewport: &mut SelectableViewport,
    width: u16,
    ctx: &RenderCtx,
) {
    for _ in 0..MAX_LAYOUT_PASSES {
        let mut changed = false;
        let mut pending: Vec<usize> = viewport.visible_range().collect();
        if let Some(selected) = viewport.selected() {
            if !viewport.is_resolved(selected) {
                pending.push(selected);
            }
        }
        for i in pending {
            if viewport.is_resolved(i) {
                continue;
            }
            let height = measure(item_lines(conv, i, ctx), width);
            changed |= viewport.resolve_height(i, height);
        }
        if !changed {
            break;
        }
    }
}

/// Rows `lines` take when wrapped at `width`.
fn measure(lines: Vec<Line<'static>>, width: u16) -> usize {
    Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .line_count(width)
}

/// Paint item `i` at its position relative to the window, cutting off
/// whatever lies outside it.
fn paint_item(
    frame: &mut Frame,
    area: Rect,
    viewport: &SelectableViewport,
    i: usize,
    paragraph: Paragraph,
) {
    let top = viewport.position(i);
    let scroll_y = viewport.scroll_y();
    let skip = scroll_y.saturating_sub(top);
    let y = top.saturating_sub(scroll_y);
    let window = area.height as usize;
    if y >= window {
        return;
    }
    let rows = viewport.height(i).saturating_sub(skip).min(window - y);
    if rows == 0 {
        return;
    }
    let rect = Rect::new(area.x, area.y + y as u16, area.width, rows as u16);
    frame.render_widget(paragraph.scroll((skip as u16, 0)), rect);
}

// ---------------------------------------------------------------------------
// Item rendering
// ---------------------------------------------------------------------------

/// Shared rendering inputs.
struct RenderCtx<'a> {
    theme: &'a ThemeColors,
    symbols: &'a Symbols,
    timestamp_format: &'a str,
    /// Wrap width; collapsed previews are cut to stay on one row.
    width: usize,
}

/// Lines of item `i`: a header line, then the body when expanded.
fn item_lines(conv: &Conversation, i: usize, ctx: &RenderCtx) -> Vec<Line<'static>> {
    let Some(item) = conv.items.get(i) else {
        return Vec::new();
    };
    let theme = ctx.theme;
    let expanded = conv.is_expanded(item);
    let fold = Span::styled(
        format!("{} ", ctx.symbols.fold(expanded)),
        Style::default().fg(theme.border_unfocused),
    );
    let sidechain = conv.sidechain_of(item).map(|agent| {
        Span::styled(
            format!("  {} agent {}", ctx.symbols.sidechain, agent),
            Style::default().fg(theme.sidechain_marker),
        )
    });

    let (message_index, nested) = match item {
        ListItem::GroupHeader { stats, .. } => {
            let mut text = format!(
                "Tool run: {} messages, {} tool calls",
                stats.message_count, stats.tool_count
            );
            if let Some(first) = &stats.first_tool {
                text.push_str(&format!(" ({})", first));
            }
            let mut spans = vec![
                fold,
                Span::styled(
                    text,
                    Style::default()
                        .fg(theme.tool_use)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            spans.extend(sidechain);
            return vec![Line::from(spans)];
        }
        ListItem::User { message } | ListItem::Final { message } => (*message, false),
        ListItem::Intermediate { message, group } => {
            (*message, conv.groups.get(*group).is_some_and(|g| g.len() > 1))
        }
    };
    let Some(message) = conv.messages.get(message_index) else {
        return Vec::new();
    };

    let indent = if nested {
        format!("{} ", ctx.symbols.tree_connector)
    } else {
        String::new()
    };
    let mut header = vec![Span::raw(indent.clone()), fold];
    header.extend(role_spans(message, ctx));
    header.extend(sidechain);
    let mut header = Line::from(header);
    if !expanded {
        let room = ctx.width.saturating_sub(header.width() + 2);
        if room > 0 {
            header.push_span(Span::styled(
                format!("  {}", fit(&preview_line(&message.content), room, ctx.symbols.ellipsis)),
                Style::default().fg(theme.collapsed_preview),
            ));
        }
    }

    let mut lines = vec![header];
    if expanded {
        let pad = " ".repeat(indent.chars().count()) + BODY_INDENT;
        lines.extend(body_lines(message, ctx).into_iter().map(|line| {
            let mut spans = vec![Span::raw(pad.clone())];
            spans.extend(line.spans);
            Line::from(spans)
        }));
    }
    lines
}

/// Role label and timestamp.
fn role_spans(message: &Message, ctx: &RenderCtx) -> Vec<Span<'static>> {
    let theme = ctx.theme;
    let (label, color) = if message.is_user() {
        ("You", theme.role_user)
    } else {
        ("Claude", theme.role_assistant)
    };
    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    let ts = format_timestamp(message.timestamp, ctx.timestamp_format);
    if !ts.is_empty() {
        spans.push(Span::styled(
            format!("  {}", ts),
            Style::default().fg(theme.message_timestamp),
        ));
    }
    spans
}

fn body_lines(message: &Message, ctx: &RenderCtx) -> Vec<Line<'static>> {
    let theme = ctx.theme;
    if message.is_user() {
        return sanitize_for_terminal(&extract_user_text(&message.content))
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.message_text))))
            .collect();
    }
    render_content(&message.content)
        .into_iter()
        .map(|rl| match rl {
            RenderedLine::Text(s) => Line::from(Span::styled(s, Style::default().fg(theme.message_text))),
            RenderedLine::Thinking(s) => Line::from(Span::styled(
                s,
                Style::default()
                    .fg(theme.thinking)
                    .add_modifier(Modifier::ITALIC),
            )),
            RenderedLine::ToolUse(s) => Line::from(Span::styled(s, Style::default().fg(theme.tool_use))),
        })
        .collect()
}

/// Local time in `format`, or an empty string without a timestamp.
fn format_timestamp(ts: Option<DateTime<Utc>>, format: &str) -> String {
    ts.map(|t| t.with_timezone(&Local).format(format).to_string())
        .unwrap_or_default()
}

/// Cut `s` to `width` characters, ending in `ellipsis` when cut.
fn fit(s: &str, width: usize, ellipsis: &str) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(ellipsis.chars().count());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ellipsis);
    out
}

// ---------------------------------------------------------------------------
// Help overlay
// ---------------------------------------------------------------------------

/// Key bindings listed by the help overlay.
const SHORTCUTS: &[(&str, &str)] = &[
    ("j / Down", "Next item"),
    ("k / Up", "Previous item"),
    ("PgDn / PgUp", "Page down / up"),
    ("Ctrl+D / U", "Half page down / up"),
    ("g / G", "First / last item"),
    ("Enter", "Open (list) / resume (conversation)"),
    ("r", "Resume session"),
    ("Space", "Collapse / expand"),
    ("o", "Open agent conversation"),
    ("e", "Open log file in editor"),
    ("q / Esc", "Back / quit"),
    ("Ctrl+C", "Quit"),
    ("?", "Show this help"),
];

/// Draw the help overlay modal showing all keyboard shortcuts.
///
/// Any key press dismisses the overlay (handled in `App::on_key()`).
fn draw_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;

    if area.width < 5 || area.height < 5 {
        return;
    }

    let content_width: u16 = 52;
    let overlay_width = (content_width + 4).min(area.width);
    // title + blank + shortcuts + blank + footer, plus borders
    let content_lines = SHORTCUTS.len() as u16 + 4;
    let overlay_height = (content_lines + 2).min(area.height);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        " Keyboard Shortcuts",
        Style::default()
            .fg(theme.overlay_fg)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    for (key, desc) in SHORTCUTS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:14}", key),
                Style::default()
                    .fg(theme.overlay_key)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(desc.to_string(), Style::default().fg(theme.overlay_fg)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press any key to close",
        Style::default()
            .fg(theme.overlay_fg)
            .add_modifier(Modifier::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.overlay_bg).fg(theme.overlay_fg))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, inner);
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

/// Separator string used between status bar segments.
const SEPARATOR: &str = " | ";

fn shortcuts_text(screen: Screen) -> &'static str {
    match screen {
        Screen::Index => " enter:open r:resume e:edit ?:help q:quit",
        Screen::Detail => " space:fold o:agent enter:resume e:edit ?:help q:back",
    }
}

/// `"3/120"` on the list, `"3/40 depth:2"` in a conversation.
fn position_text(app: &App) -> Option<String> {
    match app.screen {
        Screen::Index => {
            let selected = app.index_viewport.selected()?;
            Some(format!("{}/{}", selected + 1, app.index.len()))
        }
        Screen::Detail => {
            let viewport = app.nav.viewport();
            let selected = viewport.selected()?;
            let mut text = format!("{}/{}", selected + 1, viewport.item_count());
            if app.nav.depth() > 1 {
                text.push_str(&format!(" depth:{}", app.nav.depth()));
            }
            Some(text)
        }
    }
}

/// Append `text` if it fits in what is left of `width`, separated from
/// earlier segments. Returns whether it was added.
fn push_segment(
    spans: &mut Vec<Span<'static>>,
    used: &mut usize,
    width: usize,
    text: String,
    style: Style,
    separator_style: Style,
) -> bool {
    let sep = if *used > 0 { SEPARATOR } else { " " };
    let cost = sep.chars().count() + text.chars().count();
    if *used + cost > width {
        return false;
    }
    spans.push(Span::styled(sep, separator_style));
    spans.push(Span::styled(text, style));
    *used += cost;
    true
}

/// Compute the status bar layout and return the composed `Line`.
///
/// Segments in priority order, each dropped when it no longer fits:
/// 1. **Status message** (transient)
/// 2. **Loading indicator**
/// 3. **Position** in the current list
/// 4. **Keyboard shortcuts**
fn build_status_bar_line(app: &App, width: usize) -> Line<'static> {
    if width == 0 {
        return Line::from(vec![]);
    }

    let theme = &app.theme_colors;
    let sep_style = Style::default().fg(theme.status_separator);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut used: usize = 0;

    if let Some(msg) = &app.status_message {
        push_segment(
            &mut spans,
            &mut used,
            width,
            msg.clone(),
            Style::default()
                .fg(theme.error_text)
                .add_modifier(Modifier::BOLD),
            sep_style,
        );
    }

    let loading = if app.index_loading && app.screen == Screen::Index {
        Some("loading conversations")
    } else if app.is_loading() {
        Some("loading")
    } else {
        None
    };
    if let Some(text) = loading {
        push_segment(
            &mut spans,
            &mut used,
            width,
            text.to_string(),
            Style::default()
                .fg(theme.status_loading)
                .add_modifier(Modifier::BOLD),
            sep_style,
        );
    }

    if let Some(position) = position_text(app) {
        push_segment(
            &mut spans,
            &mut used,
            width,
            position,
            Style::default().fg(theme.status_bar_fg),
            sep_style,
        );
    }

    push_segment(
        &mut spans,
        &mut used,
        width,
        shortcuts_text(app.screen).trim_start().to_string(),
        Style::default().fg(theme.status_shortcut_key),
        sep_style,
    );

    Line::from(spans)
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = build_status_bar_line(app, area.width as usize);
    let bar = Paragraph::new(line).style(
        Style::default()
            .bg(app.theme_colors.status_bar_bg)
            .fg(app.theme_colors.status_bar_fg),
    );
    frame.render_widget(bar, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
