//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly, validated as a whole, and then converted
//! into the typed application configuration.

mod agents;
mod consensus;
mod council;
mod deliberation;
mod executor;

pub use agents::{FileAgentEntry, validate_roster};
pub use consensus::FileConsensusConfig;
pub use council::{FileCouncilConfig, FileFormationWeights};
pub use deliberation::{FileDeliberationConfig, FileHistoryConfig};
pub use executor::{DEFAULT_EXECUTOR_TIMEOUT_SECS, FileExecutorConfig, FileLoggingConfig};

use council_application::CouncilConfig;
use council_domain::core::validation::{ConfigIssue, has_errors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when the configuration contains at least one error-level issue.
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .messages.join("; "))]
pub struct ConfigValidationError {
    pub messages: Vec<String>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council sizing, formation weights and cache
    pub council: FileCouncilConfig,
    /// Threshold, weighting and outlier detection
    pub consensus: FileConsensusConfig,
    /// Round count and timeout
    pub deliberation: FileDeliberationConfig,
    /// Vote history retention
    pub history: FileHistoryConfig,
    /// External task runner; absent means no executor is wired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<FileExecutorConfig>,
    /// Decision log location
    pub logging: FileLoggingConfig,
    /// Static roster
    pub agents: Vec<FileAgentEntry>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Section-level checks run first (bounds, enum strings, roster,
    /// executor), followed by the semantic checks of the assembled
    /// [`CouncilConfig`].
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.council.validate());
        issues.extend(self.consensus.validate());
        issues.extend(self.deliberation.validate());
        issues.extend(self.history.validate());
        if let Some(executor) = &self.executor {
            issues.extend(executor.validate());
        }
        issues.extend(validate_roster(&self.agents));

        issues.extend(self.to_council_config().validate());

        issues
    }

    /// Validate and return the warnings, or fail on the first error level.
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let issues = self.validate();
        if has_errors(&issues) {
            return Err(ConfigValidationError {
                messages: issues
                    .into_iter()
                    .filter(ConfigIssue::is_error)
                    .map(|i| i.message)
                    .collect(),
            });
        }
        Ok(issues)
    }

    /// Convert into the typed configuration consumed by the use cases.
    ///
    /// Unparseable enum strings fall back to their defaults; call
    /// [`FileConfig::validate`] to surface them.
    pub fn to_council_config(&self) -> CouncilConfig {
        CouncilConfig::new(
            self.council.to_formation_config(),
            self.consensus.to_consensus_config(),
            self.deliberation.to_params(),
            self.history.to_params(),
        )
        .with_cache_capacity(self.council.cache_capacity)
    }
}
