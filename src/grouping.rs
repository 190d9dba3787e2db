//! Grouping of a flat message stream into collapsible display groups.
//!
//! User prompts stand alone. Between two prompts, the assistant turns form
//! a run: everything up to and including the last tool call (plus any
//! thinking that directly follows it) is scaffolding and becomes one
//! `ToolRun` group; every assistant turn after that boundary is a `Reply`
//! the reader always wants to see.

use std::collections::HashSet;
use std::ops::Range;

use crate::parser::{Message, Role};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    User,
    Reply,
    ToolRun,
}

/// A contiguous, non-empty range of message indices that render together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGroup {
    pub kind: GroupKind,
    pub range: Range<usize>,
}

impl MessageGroup {
    fn solo(kind: GroupKind, index: usize) -> Self {
        Self {
            kind,
            range: index..index + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn messages<'a>(&self, all: &'a [Message]) -> &'a [Message] {
        &all[self.range.clone()]
    }
}

/// Summary shown on a collapsed tool-run header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolRunStats {
    pub message_count: usize,
    pub tool_count: usize,
    pub first_tool: Option<String>,
}

impl ToolRunStats {
    pub fn of(group: &MessageGroup, all: &[Message]) -> Self {
        let mut stats = ToolRunStats {
            message_count: group.len(),
            ..Default::default()
        };
        for message in group.messages(all) {
            for name in message.content.tool_names() {
                stats.tool_count += 1;
                if stats.first_tool.is_none() {
                    stats.first_tool = Some(name.to_string());
                }
            }
        }
        stats
    }
}

/// One selectable row of the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    User { message: usize },
    /// Scaffolding turn: a member of a tool run.
    Intermediate { message: usize, group: usize },
    Final { message: usize },
    /// Stand-in for a multi-message tool run.
    GroupHeader { group: usize, stats: ToolRunStats },
}

impl ListItem {
    /// Messages this item stands for.
    pub fn message_range(&self, groups: &[MessageGroup]) -> Range<usize> {
        match self {
            ListItem::User { message }
            | ListItem::Intermediate { message, .. }
            | ListItem::Final { message } => *message..*message + 1,
            ListItem::GroupHeader { group, .. } => groups[*group].range.clone(),
        }
    }

    /// Whether the item shows its full content before the user toggles it.
    pub fn expanded_by_default(&self) -> bool {
        matches!(self, ListItem::User { .. } | ListItem::Final { .. })
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Partition `messages` into display groups, preserving order.
pub fn group_messages(messages: &[Message]) -> Vec<MessageGroup> {
    let mut groups = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, message) in messages.iter().enumerate() {
        match message.role {
            Role::User => {
                if let Some(start) = run_start.take() {
                    flush_run(messages, start..i, &mut groups);
                }
                groups.push(MessageGroup::solo(GroupKind::User, i));
            }
            Role::Assistant => {
                run_start.get_or_insert(i);
            }
        }
    }
    if let Some(start) = run_start {
        flush_run(messages, start..messages.len(), &mut groups);
    }

    groups
}

fn flush_run(messages: &[Message], run: Range<usize>, groups: &mut Vec<MessageGroup>) {
    let last_tool = run
        .clone()
        .rev()
        .find(|&i| messages[i].content.has_tool_use());

    let Some(last_tool) = last_tool else {
        groups.extend(run.map(|i| MessageGroup::solo(GroupKind::Reply, i)));
        return;
    };

    let mut boundary = last_tool;
    while boundary + 1 < run.end && messages[boundary + 1].content.is_thinking_only() {
        boundary += 1;
    }

    groups.push(MessageGroup {
        kind: GroupKind::ToolRun,
        range: run.start..boundary + 1,
    });
    groups.extend((boundary + 1..run.end).map(|i| MessageGroup::solo(GroupKind::Reply, i)));
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Flatten groups into the selectable rows of the detail view.
///
/// `expanded_groups` holds the indices of tool-run groups whose members
/// are listed under their header.
pub fn project_items(
    groups: &[MessageGroup],
    messages: &[Message],
    expanded_groups: &HashSet<usize>,
) -> Vec<ListItem> {
    let mut items = Vec::with_capacity(messages.len());

    for (g, group) in groups.iter().enumerate() {
        match group.kind {
            GroupKind::User => items.push(ListItem::User {
                message: group.range.start,
            }),
            GroupKind::Reply => items.push(ListItem::Final {
                message: group.range.start,
            }),
            GroupKind::ToolRun if group.len() == 1 => items.push(ListItem::Intermediate {
                message: group.range.start,
                group: g,
            }),
            GroupKind::ToolRun => {
                items.push(ListItem::GroupHeader {
                    group: g,
                    stats: ToolRunStats::of(group, messages),
                });
                if expanded_groups.contains(&g) {
                    items.extend(
                        group
                            .range
                            .clone()
                            .map(|message| ListItem::Intermediate { message, group: g }),
                    );
                }
            }
        }
    }

    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
