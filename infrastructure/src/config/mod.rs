//! Configuration file loading for agent-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNCIL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_EXECUTOR_TIMEOUT_SECS, FileAgentEntry, FileConfig,
    FileConsensusConfig, FileCouncilConfig, FileDeliberationConfig, FileExecutorConfig,
    FileFormationWeights, FileHistoryConfig, FileLoggingConfig, validate_roster,
};
pub use loader::ConfigLoader;
