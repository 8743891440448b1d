//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod agent_executor;
pub mod decision_sink;
pub mod progress;
pub mod vote_source;
