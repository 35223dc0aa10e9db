use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assembler::DEFAULT_KEYWORD;
use crate::error::Error;

/// Host-tunable knobs for a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormConfig {
    /// How long a revision counts as "recently updated", in milliseconds.
    pub recent_update_ms: u64,

    /// Keyword prepended to signatures typed without one.
    pub default_keyword: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            recent_update_ms: 2000,
            default_keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}

impl FormConfig {
    /// Parse a config from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn recent_update_window(&self) -> Duration {
        Duration::from_millis(self.recent_update_ms)
    }
}
