//! Turns accumulated session state into the HTML text of the status message.
//!
//! Rendering is a pure function of its inputs; the dispatcher calls it once
//! per delivery cycle.

pub mod arguments;

use std::fmt::Write;

use crate::config::{StatusConfig, ToolDisplayConfig, MAX_MESSAGE_LENGTH};
use crate::state::{CompletedToolEntry, SessionState, ToolEntry};

use self::arguments::{display_argument, escape_html, escaped_len};

/// Completed tools beyond this many are dropped from the display, oldest first.
pub const MAX_COMPLETED_SHOWN: usize = 10;

/// Room kept free for the heading and tool lines when sizing the thinking
/// block.
const THINKING_RESERVE: usize = 200;

const ELLIPSIS: &str = "...";
const THINKING_HEADING: &str = "<b>💭 Thinking</b>";
const QUOTE_OPEN: &str = "<blockquote>";
const QUOTE_CLOSE: &str = "</blockquote>";
const SECTION_SEPARATOR: &str = "\n\n";
const PLACEHOLDER: &str = "⏳ <i>Working...</i>";

/// Marker shown in front of each tool line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMarker {
    Running,
    Success,
    Failure,
}

impl ToolMarker {
    pub fn symbol(self) -> &'static str {
        match self {
            ToolMarker::Running => "⏳",
            ToolMarker::Success => "✅",
            ToolMarker::Failure => "❌",
        }
    }
}

/// Render the status message text.
///
/// `max_length` sizes the thinking block; the result as a whole never exceeds
/// [`MAX_MESSAGE_LENGTH`] characters. The thinking block is shortened further
/// when its escaped form would not fit next to the tool lines, so the final
/// cap never cuts into the quoted block.
pub fn render<'a>(
    thinking: Option<&str>,
    active: impl IntoIterator<Item = &'a ToolEntry>,
    completed: &[CompletedToolEntry],
    tools: &ToolDisplayConfig,
    max_length: usize,
) -> String {
    let tool_section = if tools.shows_tools() {
        let lines = tool_lines(active, completed, tools);
        (!lines.is_empty()).then(|| lines.join("\n"))
    } else {
        None
    };

    let mut sections: Vec<String> = Vec::new();
    if let Some(text) = thinking {
        let reserved = tool_section
            .as_ref()
            .map_or(0, |section| section.chars().count() + SECTION_SEPARATOR.len());
        let room = MAX_MESSAGE_LENGTH.saturating_sub(reserved + thinking_frame_len());
        sections.push(thinking_block(text, max_length, room));
    }
    sections.extend(tool_section);

    if sections.is_empty() {
        return PLACEHOLDER.to_string();
    }

    cap_length(sections.join(SECTION_SEPARATOR))
}

/// Render a session with the display settings of `config`.
pub fn render_session(state: &SessionState, config: &StatusConfig) -> String {
    let thinking = state
        .thinking()
        .filter(|_| config.thinking.shows_thinking());
    render(
        thinking,
        state.active_tools(),
        state.completed_tools(),
        &config.tools,
        config.thinking.max_length,
    )
}

/// Default final text for a collapsed status message.
pub fn render_summary(completed_count: usize) -> String {
    let noun = if completed_count == 1 { "tool" } else { "tools" };
    format!("✅ <b>Done</b> · {completed_count} {noun} used")
}

fn thinking_frame_len() -> usize {
    THINKING_HEADING.chars().count() + 1 + QUOTE_OPEN.len() + QUOTE_CLOSE.len()
}

/// `room` bounds the escaped quote content.
fn thinking_block(text: &str, max_length: usize, room: usize) -> String {
    let budget = max_length.saturating_sub(THINKING_RESERVE);
    let mut block = String::new();
    let _ = write!(
        block,
        "{THINKING_HEADING}\n{QUOTE_OPEN}{}{QUOTE_CLOSE}",
        escaped_tail(text, budget, room)
    );
    block
}

/// Escape the last `budget` characters of `text`, marking a cut with a
/// leading ellipsis. Characters are dropped from the front, never inside an
/// entity, until the escaped result is at most `room` characters.
fn escaped_tail(text: &str, budget: usize, room: usize) -> String {
    let total = text.chars().count();
    let escaped_total: usize = text.chars().map(escaped_len).sum();
    if total <= budget && escaped_total <= room {
        return escape_html(text);
    }

    let room = room.saturating_sub(ELLIPSIS.len());
    let mut start = text.len();
    let mut kept = 0;
    let mut used = 0;
    for (idx, ch) in text.char_indices().rev() {
        let width = escaped_len(ch);
        if kept == budget || used + width > room {
            break;
        }
        start = idx;
        kept += 1;
        used += width;
    }
    format!("{ELLIPSIS}{}", escape_html(&text[start..]))
}

fn tool_lines<'a>(
    active: impl IntoIterator<Item = &'a ToolEntry>,
    completed: &[CompletedToolEntry],
    config: &ToolDisplayConfig,
) -> Vec<String> {
    let window_start = completed.len().saturating_sub(MAX_COMPLETED_SHOWN);
    let mut lines: Vec<String> = completed[window_start..]
        .iter()
        .map(|done| {
            let marker = if done.failed {
                ToolMarker::Failure
            } else {
                ToolMarker::Success
            };
            tool_line(marker, &done.tool, config)
        })
        .collect();

    lines.extend(
        active
            .into_iter()
            .map(|tool| tool_line(ToolMarker::Running, tool, config)),
    );
    lines
}

fn tool_line(marker: ToolMarker, tool: &ToolEntry, config: &ToolDisplayConfig) -> String {
    let mut line = format!("{} <code>{}</code>", marker.symbol(), escape_html(&tool.name));
    if let Some(arg) = display_argument(&tool.name, tool.args.as_ref(), config) {
        let _ = write!(line, " {arg}");
    }
    line
}

/// Keep at most the first `MAX_MESSAGE_LENGTH - 3` characters plus an
/// ellipsis. The cut backs off to the last line break so no tag or entity is
/// split.
fn cap_length(text: String) -> String {
    if text.char_indices().nth(MAX_MESSAGE_LENGTH).is_none() {
        return text;
    }
    let keep = MAX_MESSAGE_LENGTH - ELLIPSIS.len();
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let cut = text[..cut].rfind('\n').map_or(cut, |newline| newline + 1);
    format!("{}{ELLIPSIS}", &text[..cut])
}
