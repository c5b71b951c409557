//! 同步设置模块：替换组与启用开关
//!
//! 存储中的 JSON 由设置编辑器写入，读取时宽松处理：缺失或格式错误的字段
//! 回退到默认值而不是报错；没有 `replacementGroups` 时读取旧版单组键。

pub mod store;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rewrite::config::constants;

pub use store::{migrate_legacy_settings, MemoryStore, SettingsStore};

/// One rule set: words to find, their replacement and the matching flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementGroup {
    pub replacement: String,
    pub words: Vec<String>,
    pub match_whole_words: bool,
    pub case_insensitive: bool,
}

impl ReplacementGroup {
    pub fn new(replacement: &str, words: &[&str]) -> Self {
        Self {
            replacement: replacement.to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
            match_whole_words: true,
            case_insensitive: true,
        }
    }

    pub fn with_whole_words(mut self, match_whole_words: bool) -> Self {
        self.match_whole_words = match_whole_words;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Reads a group from stored JSON, defaulting whatever is missing or malformed.
    pub fn from_value(value: &Value, fallback_replacement: &str) -> Self {
        let replacement = value
            .get("replacement")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let group = Self {
            replacement: replacement.to_string(),
            words: value.get("words").map(parse_words).unwrap_or_default(),
            match_whole_words: read_flag(value.get("matchWholeWords")),
            case_insensitive: read_flag(value.get("caseInsensitive")),
        };

        group.normalized(fallback_replacement)
    }

    /// Trims words, drops empty ones and substitutes an empty replacement.
    pub fn normalized(mut self, fallback_replacement: &str) -> Self {
        self.words = self
            .words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        if self.replacement.trim().is_empty() {
            self.replacement = fallback_replacement.to_string();
        }

        self
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Effective configuration driving the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub enabled: bool,
    pub groups: Vec<ReplacementGroup>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: true,
            groups: Vec::new(),
        }
    }
}

impl Configuration {
    /// Keys the engine requests from the store.
    pub fn storage_keys() -> Vec<&'static str> {
        let mut keys = vec![constants::KEY_ENABLED, constants::KEY_REPLACEMENT_GROUPS];
        keys.extend_from_slice(constants::LEGACY_KEYS);
        keys
    }

    /// Builds the effective configuration from a store snapshot.
    pub fn from_storage(items: &Map<String, Value>, fallback_replacement: &str) -> Self {
        let enabled = items
            .get(constants::KEY_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let groups = match items.get(constants::KEY_REPLACEMENT_GROUPS) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter(|entry| entry.is_object())
                .map(|entry| ReplacementGroup::from_value(entry, fallback_replacement))
                .collect(),
            Some(other) if !other.is_null() => {
                tracing::warn!("ignoring malformed replacementGroups: {}", other);
                Vec::new()
            }
            _ => legacy_group(items, fallback_replacement).into_iter().collect(),
        };

        Self { enabled, groups }
    }

    pub fn has_words(&self) -> bool {
        self.groups.iter().any(|g| !g.is_empty())
    }
}

/// The single implicit group described by the legacy top-level keys.
pub fn legacy_group(items: &Map<String, Value>, fallback_replacement: &str) -> Option<ReplacementGroup> {
    let words = items.get(constants::LEGACY_KEY_WORDS)?;

    let group = ReplacementGroup {
        replacement: items
            .get(constants::LEGACY_KEY_REPLACEMENT)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        words: parse_words(words),
        match_whole_words: read_flag(items.get(constants::LEGACY_KEY_MATCH_WHOLE_WORDS)),
        case_insensitive: read_flag(items.get(constants::LEGACY_KEY_CASE_INSENSITIVE)),
    };

    Some(group.normalized(fallback_replacement))
}

/// Words may be stored as an array or, by older editors, as one
/// comma/newline separated string.
fn parse_words(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) => s
            .split(|c| c == ',' || c == '\n')
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn read_flag(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(true)
}

/// Storage area a change notification originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Sync,
    Local,
    Session,
    Managed,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

/// A change notification: `{key: {newValue, oldValue}}` scoped to an area.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub changes: HashMap<String, ValueChange>,
}

impl StorageChange {
    pub fn from_json(area: StorageArea, changes: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            area,
            changes: serde_json::from_str(changes)?,
        })
    }

    /// True when the change is synchronized and touches a key the engine reads.
    pub fn affects_configuration(&self) -> bool {
        self.area == StorageArea::Sync
            && Configuration::storage_keys()
                .iter()
                .any(|key| self.changes.contains_key(*key))
    }
}
