//! Deliberation and history settings from TOML
//! (`[deliberation]` and `[history]` sections)

use council_application::config::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_TURNS, DEFAULT_ROUND_TIMEOUT,
};
use council_application::{DeliberationParams, HistoryParams};
use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw deliberation configuration from TOML
///
/// # Example
///
/// ```toml
/// [deliberation]
/// max_turns = 3
/// round_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    pub max_turns: usize,
    pub round_timeout_secs: u64,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            round_timeout_secs: DEFAULT_ROUND_TIMEOUT.as_secs(),
        }
    }
}

impl FileDeliberationConfig {
    /// The fixed threshold stays unset here; `[consensus]` owns the default
    /// and the CLI can pin one per run.
    pub fn to_params(&self) -> DeliberationParams {
        DeliberationParams::default()
            .with_max_turns(self.max_turns)
            .with_round_timeout(Duration::from_secs(self.round_timeout_secs))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.round_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "deliberation.round_timeout_secs".to_string(),
                },
                "deliberation.round_timeout_secs cannot be 0",
            ));
        }
        issues
    }
}

/// `[history]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Decisions kept before the oldest are dropped
    pub capacity: usize,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl FileHistoryConfig {
    pub fn to_params(&self) -> HistoryParams {
        HistoryParams {
            capacity: self.capacity,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.capacity == 0 {
            vec![ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "history.capacity".to_string(),
                },
                "history.capacity is 0; only the latest decision will be kept",
            )]
        } else {
            vec![]
        }
    }
}
