//! Picks the one argument worth showing next to a tool name.
//!
//! Shows a key identifier (a path, a pattern, a URL) and never the full
//! argument payload.

use serde_json::Value;

use crate::config::ToolDisplayConfig;
use crate::state::ToolArgs;

/// Representative argument for a tool line, truncated and escaped, or `None`
/// when argument display is off or nothing string-shaped is available.
pub fn display_argument(
    tool_name: &str,
    args: Option<&ToolArgs>,
    config: &ToolDisplayConfig,
) -> Option<String> {
    if !config.show_args {
        return None;
    }
    let raw = extract_argument(tool_name, args?, config.candidate_keys(tool_name))?;
    Some(escape_html(&truncate_chars(raw, config.max_arg_length)))
}

/// Configured keys are tried in order and the first non-empty string wins;
/// otherwise the first string value in the mapping, empty or not.
fn extract_argument<'a>(
    tool_name: &str,
    args: &'a ToolArgs,
    candidate_keys: &[String],
) -> Option<&'a str> {
    candidate_keys
        .iter()
        .find_map(|key| args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .or_else(|| {
            let fallback = args.values().find_map(Value::as_str);
            if fallback.is_some() && !candidate_keys.is_empty() {
                tracing::trace!(tool = tool_name, "no configured argument key matched");
            }
            fallback
        })
}

/// Keep at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Characters `ch` occupies once escaped.
pub fn escaped_len(ch: char) -> usize {
    match ch {
        '&' => 5,
        '<' | '>' => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn configured_key_wins_over_mapping_order() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"limit": "20", "pattern": "fn main", "path": "src/"}));
        assert_eq!(
            display_argument("grep", Some(&a), &config).as_deref(),
            Some("fn main")
        );
    }

    #[test]
    fn empty_candidate_falls_through_to_next_key() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"path": "", "file_path": "/etc/hosts"}));
        assert_eq!(
            display_argument("read", Some(&a), &config).as_deref(),
            Some("/etc/hosts")
        );
    }

    #[test]
    fn falls_back_to_first_string_argument() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"count": 3, "flag": true, "target": "db", "other": "x"}));
        assert_eq!(
            display_argument("custom_tool", Some(&a), &config).as_deref(),
            Some("db")
        );
    }

    #[test]
    fn fallback_follows_caller_key_order() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"zeta": "first", "alpha": "second"}));
        assert_eq!(a.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(
            display_argument("custom_tool", Some(&a), &config).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn fallback_takes_blank_string_values() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"note": "  ", "target": "db"}));
        assert_eq!(
            display_argument("custom_tool", Some(&a), &config).as_deref(),
            Some("  ")
        );
    }

    #[test]
    fn escaped_len_matches_escape_html() {
        let text = "a<b && c>d";
        let widths: usize = text.chars().map(escaped_len).sum();
        assert_eq!(widths, escape_html(text).chars().count());
    }

    #[test]
    fn non_string_arguments_yield_nothing() {
        let config = ToolDisplayConfig::default();
        let a = args(json!({"count": 3, "items": ["a"]}));
        assert_eq!(display_argument("custom_tool", Some(&a), &config), None);
        assert_eq!(display_argument("custom_tool", None, &config), None);
    }

    #[test]
    fn hidden_when_args_disabled() {
        let config = ToolDisplayConfig {
            show_args: false,
            ..ToolDisplayConfig::default()
        };
        let a = args(json!({"path": "/a"}));
        assert_eq!(display_argument("read", Some(&a), &config), None);
    }

    #[test]
    fn long_argument_is_truncated_then_escaped() {
        let config = ToolDisplayConfig {
            max_arg_length: 5,
            ..ToolDisplayConfig::default()
        };
        let a = args(json!({"command": "a<b && c > d"}));
        assert_eq!(
            display_argument("bash", Some(&a), &config).as_deref(),
            Some("a&lt;b &amp;...")
        );
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("short", 5), "short");
    }
}
