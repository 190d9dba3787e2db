//! Application state for the TUI.
//!
//! The [`App`] struct owns all mutable state that drives the TUI: the
//! conversation list, the navigation stack of open conversations, the
//! pending background load, and the quit flag. It never touches the
//! terminal or spawns work itself; the event loop in [`super`] drains
//! [`App::take_requests`] and [`App::take_external`] and feeds load
//! completions back through [`App::on_load_event`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::grouping::{group_messages, project_items, ListItem, MessageGroup};
use crate::index::resolve_sidechain;
use crate::loader::{ConversationRequest, LoadEvent, LoadTarget};
use crate::navigation::{NavigationStack, PopOutcome};
use crate::parser::{ConversationSummary, Message, ParsedConversation};
use crate::symbols::Symbols;
use crate::theme::ThemeColors;
use crate::viewport::{SelectableViewport, ViewportState};

/// Rows taken by one entry of the conversation list.
pub const INDEX_ENTRY_HEIGHT: usize = 2;

/// Shown in place of the message list when parsing failed.
pub const LOAD_FAILED_TEXT: &str = "conversation failed to load";

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// The conversation list.
    Index,
    /// The conversation on top of the navigation stack.
    Detail,
}

/// Work that needs the terminal handed over to another program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalAction {
    /// Leave the TUI and resume a session; the process exits with the
    /// resumed program's exit code.
    Resume { session_id: String, cwd: PathBuf },
    /// Suspend the TUI while an editor is open on `path`.
    Edit { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A loaded conversation and its display projection.
#[derive(Debug)]
pub struct Conversation {
    pub path: PathBuf,
    pub title: String,
    /// Directory searched for this conversation's sidechains.
    pub project_dir: PathBuf,
    pub session_id: Option<String>,
    pub messages: Vec<Message>,
    pub sidechain_links: BTreeMap<usize, String>,
    pub groups: Vec<MessageGroup>,
    pub items: Vec<ListItem>,
    /// Tool-run groups whose members are listed under their header.
    pub expanded_groups: HashSet<usize>,
    /// Messages whose expansion differs from their default.
    pub toggled_messages: HashSet<usize>,
    pub load_error: Option<String>,
    /// Wrap width the cached item heights were measured at.
    pub measured_width: Option<u16>,
}

impl Conversation {
    pub fn from_parsed(request: &ConversationRequest, parsed: ParsedConversation) -> Self {
        let groups = group_messages(&parsed.messages);
        let expanded_groups = HashSet::new();
        let items = project_items(&groups, &parsed.messages, &expanded_groups);
        Self {
            path: request.path.clone(),
            title: request.title.clone(),
            project_dir: request.project_dir.clone(),
            session_id: parsed.session_id.or_else(|| request.session_hint.clone()),
            messages: parsed.messages,
            sidechain_links: parsed.sidechain_links,
            groups,
            items,
            expanded_groups,
            toggled_messages: HashSet::new(),
            load_error: None,
            measured_width: None,
        }
    }

    /// An empty conversation standing in for one that could not be read.
    pub fn failed(request: &ConversationRequest) -> Self {
        Self {
            path: request.path.clone(),
            title: request.title.clone(),
            project_dir: request.project_dir.clone(),
            session_id: request.session_hint.clone(),
            messages: Vec::new(),
            sidechain_links: BTreeMap::new(),
            groups: Vec::new(),
            items: Vec::new(),
            expanded_groups: HashSet::new(),
            toggled_messages: HashSet::new(),
            load_error: Some(LOAD_FAILED_TEXT.to_string()),
            measured_width: None,
        }
    }

    /// Whether `item` currently shows its full content.
    pub fn is_expanded(&self, item: &ListItem) -> bool {
        match item {
            ListItem::GroupHeader { group, .. } => self.expanded_groups.contains(group),
            ListItem::User { message }
            | ListItem::Intermediate { message, .. }
            | ListItem::Final { message } => {
                item.expanded_by_default() != self.toggled_messages.contains(message)
            }
        }
    }

    /// Agent id of the first message behind `item` that leads into a
    /// sidechain.
    pub fn sidechain_of(&self, item: &ListItem) -> Option<&str> {
        item.message_range(&self.groups)
            .find_map(|i| self.sidechain_links.get(&i))
            .map(String::as_str)
    }

    /// Flip item `index` between collapsed and expanded.
    ///
    /// Returns the new item list's heights remapped from `heights`, with
    /// the toggled item and any new rows unknown.
    fn toggle(&mut self, index: usize, heights: &[Option<usize>]) -> Vec<Option<usize>> {
        let Some(item) = self.items.get(index).cloned() else {
            return heights.to_vec();
        };
        match item {
            ListItem::GroupHeader { group, .. } => {
                if !self.expanded_groups.remove(&group) {
                    self.expanded_groups.insert(group);
                }
                let known: HashMap<ItemKey, Option<usize>> = self
                    .items
                    .iter()
                    .zip(heights.iter().copied())
                    .map(|(item, h)| (ItemKey::of(item), h))
                    .collect();
                self.items = project_items(&self.groups, &self.messages, &self.expanded_groups);
                let toggled = ItemKey::of(&item);
                self.items
                    .iter()
                    .map(|item| {
                        let key = ItemKey::of(item);
                        if key == toggled {
                            None
                        } else {
                            known.get(&key).copied().flatten()
                        }
                    })
                    .collect()
            }
            ListItem::User { message }
            | ListItem::Intermediate { message, .. }
            | ListItem::Final { message } => {
                if !self.toggled_messages.remove(&message) {
                    self.toggled_messages.insert(message);
                }
                let mut out = heights.to_vec();
                if let Some(h) = out.get_mut(index) {
                    *h = None;
                }
                out
            }
        }
    }
}

/// Identity of a list item across re-projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ItemKey {
    Message(usize),
    Header(usize),
}

impl ItemKey {
    fn of(item: &ListItem) -> Self {
        match item {
            ListItem::GroupHeader { group, .. } => ItemKey::Header(*group),
            ListItem::User { message }
            | ListItem::Intermediate { message, .. }
            | ListItem::Final { message } => ItemKey::Message(*message),
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
pub struct App {
    pub config: AppConfig,
    pub theme_colors: ThemeColors,
    pub symbols: Symbols,

    pub screen: Screen,

    /// Conversation list, most recent first.
    pub index: Vec<ConversationSummary>,
    pub index_loading: bool,
    pub index_viewport: SelectableViewport,

    pub nav: NavigationStack<Conversation>,
    /// The list entry the navigation stack was opened from.
    pub opened: Option<ConversationSummary>,

    /// The load whose completion will be applied; others are stale.
    pub pending: Option<ConversationRequest>,
    next_request_id: u64,
    requests: Vec<ConversationRequest>,
    external: Option<ExternalAction>,

    pub help_overlay_visible: bool,
    /// Transient message shown in the status bar until the next key.
    pub status_message: Option<String>,
    pub should_quit: bool,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let theme_colors = ThemeColors::from_theme(&config.theme);
        let symbols = Symbols::new(config.display.ascii);
        Self {
            config,
            theme_colors,
            symbols,
            screen: Screen::Index,
            index: Vec::new(),
            index_loading: true,
            index_viewport: SelectableViewport::new(INDEX_ENTRY_HEIGHT),
            nav: NavigationStack::new(),
            opened: None,
            pending: None,
            next_request_id: 0,
            requests: Vec::new(),
            external: None,
            help_overlay_visible: false,
            status_message: None,
            should_quit: false,
            needs_redraw: true,
        }
    }

    // -- event loop interface -------------------------------------------------

    /// Loads the event loop should start.
    pub fn take_requests(&mut self) -> Vec<ConversationRequest> {
        std::mem::take(&mut self.requests)
    }

    /// External program the event loop should run.
    pub fn take_external(&mut self) -> Option<ExternalAction> {
        self.external.take()
    }

    /// Apply a finished background load.
    pub fn on_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Index(summaries) => {
                info!(count = summaries.len(), "index loaded");
                self.index = summaries;
                self.index_loading = false;
                self.index_viewport.set_item_count(self.index.len());
            }
            LoadEvent::Conversation { request, result } => {
                if self.pending.as_ref().map(|p| p.id) != Some(request.id) {
                    debug!(id = request.id, "dropping superseded conversation load");
                    return;
                }
                self.pending = None;
                let conversation = match result {
                    Ok(parsed) => Conversation::from_parsed(&request, parsed),
                    Err(_) => Conversation::failed(&request),
                };
                let count = conversation.items.len();
                match request.target {
                    LoadTarget::Root => self.nav.open_root(conversation),
                    LoadTarget::Sidechain => self.nav.push(conversation),
                }
                self.nav.viewport_mut().set_item_count(count);
                self.screen = Screen::Detail;
            }
        }
        self.needs_redraw = true;
    }

    /// Whether a conversation load is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    // -- key handling ---------------------------------------------------------

    /// Handle a key event.
    pub fn on_key(&mut self, key: KeyEvent) {
        self.needs_redraw = true;
        self.status_message = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Any key dismisses the help overlay.
        if self.help_overlay_visible {
            self.help_overlay_visible = false;
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') => self.active_viewport().half_page_move(1),
                KeyCode::Char('u') => self.active_viewport().half_page_move(-1),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('?') => self.help_overlay_visible = true,
            KeyCode::Char('q') | KeyCode::Esc => self.back(),
            KeyCode::Up | KeyCode::Char('k') => self.active_viewport().move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.active_viewport().move_selection(1),
            KeyCode::PageUp => self.active_viewport().page_move(-1),
            KeyCode::PageDown => self.active_viewport().page_move(1),
            KeyCode::Home | KeyCode::Char('g') => self.active_viewport().select_first(),
            KeyCode::End | KeyCode::Char('G') => self.active_viewport().select_last(),
            KeyCode::Char('e') => self.edit_selected(),
            _ => match self.screen {
                Screen::Index => self.on_index_key(key.code),
                Screen::Detail => self.on_detail_key(key.code),
            },
        }
    }

    fn on_index_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('r') => {
                if let Some(summary) = self.selected_summary().cloned() {
                    self.resume(&summary);
                }
            }
            _ => {}
        }
    }

    fn on_detail_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Enter | KeyCode::Char('r') => {
                if let Some(summary) = self.opened.clone() {
                    self.resume(&summary);
                }
            }
            KeyCode::Char('o') => self.open_sidechain(),
            _ => {}
        }
    }

    /// The viewport of the screen currently shown.
    pub fn active_viewport(&mut self) -> &mut SelectableViewport {
        match self.screen {
            Screen::Index => &mut self.index_viewport,
            Screen::Detail => self.nav.viewport_mut(),
        }
    }

    pub fn selected_summary(&self) -> Option<&ConversationSummary> {
        self.index_viewport.selected().and_then(|i| self.index.get(i))
    }

    // -- actions --------------------------------------------------------------

    /// `q`/`Esc`: cancel a pending load, else leave the current level.
    fn back(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(id = pending.id, "load cancelled");
            if self.nav.is_empty() {
                self.screen = Screen::Index;
            }
            return;
        }
        match self.screen {
            Screen::Index => self.should_quit = true,
            Screen::Detail => {
                if self.nav.pop() == PopOutcome::ReturnToIndex {
                    self.opened = None;
                    self.screen = Screen::Index;
                }
            }
        }
    }

    /// Open the selected list entry as the root of the navigation stack.
    fn open_selected(&mut self) {
        let Some(summary) = self.selected_summary().cloned() else {
            return;
        };
        let project_dir = summary
            .project_dir()
            .map(PathBuf::from)
            .unwrap_or_default();
        let request = self.request(
            summary.file_path.clone(),
            summary.title().to_string(),
            project_dir,
            Some(summary.session_id.clone()),
            LoadTarget::Root,
        );
        self.opened = Some(summary);
        self.nav = NavigationStack::new();
        self.screen = Screen::Detail;
        self.submit(request);
    }

    /// Descend into the sidechain behind the selected item. A missing
    /// link or file leaves everything as it is.
    fn open_sidechain(&mut self) {
        let Some(selected) = self.nav.viewport().selected() else {
            return;
        };
        let Some(conv) = self.nav.top() else {
            return;
        };
        let Some(agent_id) = conv.items.get(selected).and_then(|i| conv.sidechain_of(i)) else {
            return;
        };
        let session = conv.session_id.clone().unwrap_or_default();
        let Some(path) = resolve_sidechain(&conv.project_dir, &session, agent_id) else {
            debug!(agent_id, "sidechain file not found");
            return;
        };
        let title = format!("agent {}", agent_id);
        let project_dir = conv.project_dir.clone();
        let request = self.request(
            path,
            title,
            project_dir,
            Some(session),
            LoadTarget::Sidechain,
        );
        self.submit(request);
    }

    fn toggle_selected(&mut self) {
        let Some((conv, viewport)) = self.nav.top_with_viewport() else {
            return;
        };
        let Some(selected) = viewport.selected() else {
            return;
        };
        let mut state = viewport.snapshot();
        state.item_heights = conv.toggle(selected, &state.item_heights);
        viewport.restore(ViewportState {
            selected_index: selected,
            ..state
        });
    }

    fn edit_selected(&mut self) {
        let path = match self.screen {
            Screen::Index => self.selected_summary().map(|s| s.file_path.clone()),
            Screen::Detail => self.nav.top().map(|c| c.path.clone()),
        };
        if let Some(path) = path {
            self.external = Some(ExternalAction::Edit { path });
        }
    }

    fn resume(&mut self, summary: &ConversationSummary) {
        self.external = Some(ExternalAction::Resume {
            session_id: summary.session_id.clone(),
            cwd: summary.project_path.clone(),
        });
    }

    fn request(
        &mut self,
        path: PathBuf,
        title: String,
        project_dir: PathBuf,
        session_hint: Option<String>,
        target: LoadTarget,
    ) -> ConversationRequest {
        self.next_request_id += 1;
        ConversationRequest {
            id: self.next_request_id,
            path,
            title,
            project_dir,
            session_hint,
            target,
        }
    }

    fn submit(&mut self, request: ConversationRequest) {
        debug!(id = request.id, path = %request.path.display(), "requesting conversation");
        self.pending = Some(request.clone());
        self.requests.push(request);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Theme;
    use crate::config::{CommandsConfig, DisplayConfig};
    use crate::error::LoadError;
    use crate::log_entry::MessageContent;
    use crate::parser::Role;
    use std::fs;
    use tempfile::TempDir;

    fn test_config() -> AppConfig {
        AppConfig {
            projects_dir: None,
            project: None,
            verbose: false,
            theme: Theme::Dark,
            display: DisplayConfig::default(),
            commands: CommandsConfig::default(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn summary(dir: &std::path::Path, id: &str) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            file_path: dir.join(format!("{id}.jsonl")),
            project_path: PathBuf::from("/work/app"),
            project_name: "app".to_string(),
            session_id: format!("session-{id}"),
            summary: Some(format!("title {id}")),
            first_user_message: None,
            last_user_message: None,
            first_timestamp: None,
            last_timestamp: None,
            message_count: 1,
            total_messages: 2,
            agent_ids: Vec::new(),
        }
    }

    fn message(role: Role, json: &str) -> Message {
        Message {
            role,
            content: serde_json::from_str::<MessageContent>(json).unwrap(),
            timestamp: None,
            model: None,
        }
    }

    /// user, tool, tool, text reply, user
    fn parsed() -> ParsedConversation {
        let tool = r#"[{"type":"tool_use","name":"Bash","input":{"command":"ls"}}]"#;
        let mut links = BTreeMap::new();
        links.insert(1, "abc".to_string());
        ParsedConversation {
            messages: vec![
                message(Role::User, r#""do it""#),
                message(Role::Assistant, tool),
                message(Role::Assistant, tool),
                message(Role::Assistant, r#"[{"type":"text","text":"done"}]"#),
                message(Role::User, r#""thanks""#),
            ],
            sidechain_links: links,
            session_id: Some("s1".to_string()),
            is_sidechain: false,
        }
    }

    /// App with one list entry, opened and loaded.
    fn opened_app(dir: &std::path::Path) -> App {
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir, "one")]));
        app.on_key(key(KeyCode::Enter));
        let request = app.take_requests().pop().unwrap();
        app.on_load_event(LoadEvent::Conversation {
            request,
            result: Ok(parsed()),
        });
        app
    }

    // -- 1. Basics --

    #[test]
    fn test_new_defaults() {
        let app = App::new(test_config());
        assert_eq!(app.screen, Screen::Index);
        assert!(app.index_loading);
        assert!(!app.should_quit);
        assert!(!app.help_overlay_visible);
        assert!(app.needs_redraw);
        assert!(app.nav.is_empty());
    }

    #[test]
    fn test_on_key_q_on_index_quits() {
        let mut app = App::new(test_config());
        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_on_key_ctrl_c_quits_anywhere() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_overlay_any_key_dismisses() {
        let mut app = App::new(test_config());
        app.on_key(key(KeyCode::Char('?')));
        assert!(app.help_overlay_visible);
        app.on_key(key(KeyCode::Char('q')));
        assert!(!app.help_overlay_visible);
        assert!(!app.should_quit);
    }

    // -- 2. Index screen --

    #[test]
    fn test_index_load_sets_item_count() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![
            summary(dir.path(), "a"),
            summary(dir.path(), "b"),
        ]));
        assert!(!app.index_loading);
        assert_eq!(app.index_viewport.item_count(), 2);
        app.on_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_summary().unwrap().id, "b");
    }

    #[test]
    fn test_enter_queues_root_load() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir.path(), "one")]));
        app.on_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Detail);
        assert!(app.is_loading());
        let requests = app.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, LoadTarget::Root);
        assert_eq!(requests[0].title, "title one");
        assert_eq!(requests[0].project_dir, dir.path());
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_enter_on_empty_index_is_noop() {
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(Vec::new()));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Index);
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_r_on_index_resumes_selected() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir.path(), "one")]));
        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(
            app.take_external(),
            Some(ExternalAction::Resume {
                session_id: "session-one".to_string(),
                cwd: PathBuf::from("/work/app"),
            })
        );
    }

    #[test]
    fn test_e_on_index_edits_file() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir.path(), "one")]));
        app.on_key(key(KeyCode::Char('e')));
        assert_eq!(
            app.take_external(),
            Some(ExternalAction::Edit {
                path: dir.path().join("one.jsonl")
            })
        );
    }

    // -- 3. Loading --

    #[test]
    fn test_conversation_load_builds_items() {
        let dir = TempDir::new().unwrap();
        let app = opened_app(dir.path());
        let conv = app.nav.top().unwrap();
        // user, header(tool run of 2), final, user
        assert_eq!(conv.items.len(), 4);
        assert!(matches!(conv.items[1], ListItem::GroupHeader { .. }));
        assert_eq!(app.nav.viewport().item_count(), 4);
        assert!(!app.is_loading());
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir.path(), "one")]));
        app.on_key(key(KeyCode::Enter));
        let first = app.take_requests().pop().unwrap();
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Index);

        app.on_load_event(LoadEvent::Conversation {
            request: first,
            result: Ok(parsed()),
        });
        assert!(app.nav.is_empty());
        assert_eq!(app.screen, Screen::Index);
    }

    #[test]
    fn test_failed_load_shows_placeholder() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(test_config());
        app.on_load_event(LoadEvent::Index(vec![summary(dir.path(), "one")]));
        app.on_key(key(KeyCode::Enter));
        let request = app.take_requests().pop().unwrap();
        let missing = request.path.clone();
        app.on_load_event(LoadEvent::Conversation {
            request,
            result: Err(LoadError::NotFound(missing)),
        });
        let conv = app.nav.top().unwrap();
        assert_eq!(conv.load_error.as_deref(), Some(LOAD_FAILED_TEXT));
        assert!(conv.items.is_empty());
        assert_eq!(app.nav.viewport().selected(), None);
    }

    // -- 4. Detail screen --

    #[test]
    fn test_toggle_header_expands_members() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.nav.viewport_mut().resolve_height(0, 3);
        app.nav.viewport_mut().resolve_height(3, 5);
        app.on_key(key(KeyCode::Char('j')));
        app.on_key(key(KeyCode::Char(' ')));

        let conv = app.nav.top().unwrap();
        assert_eq!(conv.items.len(), 6);
        assert!(conv.is_expanded(&conv.items[1]));
        let vp = app.nav.viewport();
        assert_eq!(vp.item_count(), 6);
        assert_eq!(vp.selected(), Some(1));
        assert!(vp.is_resolved(0));
        assert!(!vp.is_resolved(1));
        // The trailing user message moved from 3 to 5 and kept its height.
        assert_eq!(vp.height(5), 5);

        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.nav.top().unwrap().items.len(), 4);
        assert_eq!(app.nav.viewport().height(3), 5);
    }

    #[test]
    fn test_toggle_message_flips_default() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.nav.viewport_mut().resolve_height(0, 4);
        let conv = app.nav.top().unwrap();
        assert!(conv.is_expanded(&conv.items[0]));

        app.on_key(key(KeyCode::Char(' ')));
        let conv = app.nav.top().unwrap();
        assert!(!conv.is_expanded(&conv.items[0]));
        assert!(!app.nav.viewport().is_resolved(0));
    }

    #[test]
    fn test_enter_on_detail_resumes_root_session() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Enter));
        assert_eq!(
            app.take_external(),
            Some(ExternalAction::Resume {
                session_id: "session-one".to_string(),
                cwd: PathBuf::from("/work/app"),
            })
        );
    }

    #[test]
    fn test_open_sidechain_queues_push() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("agent-abc.jsonl"), "").unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('j')));
        app.on_key(key(KeyCode::Char('o')));

        let request = app.take_requests().pop().unwrap();
        assert_eq!(request.target, LoadTarget::Sidechain);
        assert_eq!(request.path, dir.path().join("agent-abc.jsonl"));
        assert_eq!(request.session_hint.as_deref(), Some("s1"));

        app.on_load_event(LoadEvent::Conversation {
            request,
            result: Ok(parsed()),
        });
        assert_eq!(app.nav.depth(), 2);
        assert_eq!(app.nav.viewport().selected(), Some(0));

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.nav.depth(), 1);
        assert_eq!(app.nav.viewport().selected(), Some(1));
        assert_eq!(app.screen, Screen::Detail);
    }

    #[test]
    fn test_open_sidechain_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('j')));
        app.on_key(key(KeyCode::Char('o')));
        assert!(app.take_requests().is_empty());
        assert!(!app.is_loading());
        assert_eq!(app.nav.depth(), 1);
    }

    #[test]
    fn test_open_sidechain_without_link_is_noop() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("agent-abc.jsonl"), "").unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('o')));
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_back_from_root_returns_to_index() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::Index);
        assert!(app.nav.is_empty());
        assert!(app.opened.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_reopening_resets_viewport() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('G')));
        assert_eq!(app.nav.viewport().selected(), Some(3));
        app.on_key(key(KeyCode::Esc));
        app.on_key(key(KeyCode::Enter));
        let request = app.take_requests().pop().unwrap();
        app.on_load_event(LoadEvent::Conversation {
            request,
            result: Ok(parsed()),
        });
        assert_eq!(app.nav.viewport().selected(), Some(0));
        assert_eq!(app.nav.viewport().scroll_y(), 0);
    }

    #[test]
    fn test_navigation_keys_move_selection() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::End));
        assert_eq!(app.nav.viewport().selected(), Some(3));
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.nav.viewport().selected(), Some(2));
        app.on_key(key(KeyCode::Home));
        assert_eq!(app.nav.viewport().selected(), Some(0));
        app.on_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(app.nav.viewport().selected(), Some(1));
    }

    #[test]
    fn test_unknown_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut app = opened_app(dir.path());
        app.on_key(key(KeyCode::Char('z')));
        assert_eq!(app.nav.viewport().selected(), Some(0));
        assert!(app.take_requests().is_empty());
        assert!(app.take_external().is_none());
    }
}
