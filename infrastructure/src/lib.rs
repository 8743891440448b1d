//! Infrastructure layer for agent-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file loading, roster bootstrap,
//! a process-backed task executor and the JSONL decision log.

pub mod config;
pub mod executor;
pub mod logging;
pub mod roster;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentEntry, FileConfig, FileExecutorConfig,
};
pub use executor::CommandExecutor;
pub use logging::JsonlDecisionLog;
pub use roster::bootstrap_roster;
