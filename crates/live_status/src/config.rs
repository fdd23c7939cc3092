//! Display configuration for a status message.
//!
//! Every field has a default, so a config file only needs to name the values
//! it overrides:
//!
//! ```json
//! { "thinking": { "interval_ms": 1200 }, "tools": { "show_args": false } }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound imposed by the transport on a single message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub thinking: ThinkingConfig,
    pub tools: ToolDisplayConfig,
}

impl StatusConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config at `path`, or from the default location when `path` is
    /// `None`. A missing default file yields the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// `<config dir>/live-status/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("live-status").join("config.json"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingMode {
    #[default]
    Stream,
    Off,
}

/// What happens to the status message when the run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionBehavior {
    #[default]
    Delete,
    Summary,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkingConfig {
    pub enabled: bool,
    pub mode: ThinkingMode,
    /// Minimum spacing between two remote updates, in milliseconds.
    pub interval_ms: u64,
    /// Budget for the rendered thinking block; 200 chars are reserved for the
    /// heading and the tool lines.
    pub max_length: usize,
    pub on_complete: CompletionBehavior,
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ThinkingMode::Stream,
            interval_ms: 800,
            max_length: 3800,
            on_complete: CompletionBehavior::Delete,
        }
    }
}

impl ThinkingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn shows_thinking(&self) -> bool {
        self.enabled && self.mode == ThinkingMode::Stream
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolDisplayMode {
    #[default]
    Inline,
    Separate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDisplayConfig {
    pub enabled: bool,
    pub mode: ToolDisplayMode,
    pub show_args: bool,
    pub max_arg_length: usize,
    /// Candidate argument keys per tool name, most preferred first.
    pub arg_keys: IndexMap<String, Vec<String>>,
}

impl Default for ToolDisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ToolDisplayMode::Inline,
            show_args: true,
            max_arg_length: 150,
            arg_keys: default_arg_keys(),
        }
    }
}

impl ToolDisplayConfig {
    pub fn shows_tools(&self) -> bool {
        self.enabled && self.mode == ToolDisplayMode::Inline
    }

    pub fn candidate_keys(&self, tool_name: &str) -> &[String] {
        self.arg_keys
            .get(tool_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn default_arg_keys() -> IndexMap<String, Vec<String>> {
    const PATH_KEYS: &[&str] = &["path", "file_path", "filePath", "file"];
    const PATTERN_KEYS: &[&str] = &["pattern", "query", "regex"];

    let table: &[(&str, &[&str])] = &[
        ("read", PATH_KEYS),
        ("write", PATH_KEYS),
        ("edit", PATH_KEYS),
        ("multiedit", PATH_KEYS),
        ("ls", &["path", "dir"]),
        ("list", &["path", "dir"]),
        ("grep", PATTERN_KEYS),
        ("search", PATTERN_KEYS),
        ("glob", &["pattern", "path"]),
        ("bash", &["command", "cmd"]),
        ("shell", &["command", "cmd"]),
        ("web_search", &["query"]),
        ("websearch", &["query"]),
        ("web_fetch", &["url"]),
        ("webfetch", &["url"]),
        ("task", &["description", "prompt"]),
    ];

    table
        .iter()
        .map(|(tool, keys)| {
            (
                tool.to_string(),
                keys.iter().map(|key| key.to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = StatusConfig::default();
        assert_eq!(config.thinking.interval(), Duration::from_millis(800));
        assert_eq!(config.thinking.max_length, 3800);
        assert_eq!(config.thinking.on_complete, CompletionBehavior::Delete);
        assert!(config.tools.show_args);
        assert_eq!(config.tools.max_arg_length, 150);
        assert_eq!(config.tools.candidate_keys("read")[0], "path");
        assert!(config.tools.candidate_keys("unknown_tool").is_empty());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"thinking": {{"interval_ms": 1500, "on_complete": "summary"}},
               "tools": {{"mode": "separate", "arg_keys": {{"fetch": ["href"]}}}}}}"#
        )
        .unwrap();

        let config = StatusConfig::load(file.path()).unwrap();
        assert_eq!(config.thinking.interval_ms, 1500);
        assert_eq!(config.thinking.on_complete, CompletionBehavior::Summary);
        assert_eq!(config.thinking.max_length, 3800);
        assert!(!config.tools.shows_tools());
        assert_eq!(config.tools.candidate_keys("fetch"), ["href".to_string()]);
        // An explicit table replaces the built-in one.
        assert!(config.tools.candidate_keys("read").is_empty());
    }

    #[test]
    fn thinking_off_hides_block() {
        let config: StatusConfig =
            serde_json::from_str(r#"{"thinking": {"mode": "off"}}"#).unwrap();
        assert!(!config.thinking.shows_thinking());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = StatusConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StatusConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
