use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs for instrumentation fallbacks and report rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordConfig {
    /// Separator used when a key is flattened into a single string.
    pub key_separator: String,
    /// Caller label for instrumented calls without a describable receiver.
    /// `None` falls back to the origin of the instrumented method.
    pub caller_fallback: Option<String>,
    pub table_separator: String,
    pub csv_separator: String,
    /// Spaces after each `|` in the tree view.
    pub tree_indent: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            key_separator: "|".to_string(),
            caller_fallback: None,
            table_separator: " | ".to_string(),
            csv_separator: ";".to_string(),
            tree_indent: 1,
        }
    }
}

impl RecordConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
