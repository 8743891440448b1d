//! Agent roster domain.
//!
//! - [`entities::Agent`]: a roster member with domain, expertise and performance
//! - [`entities::AgentStatus`]: `active | idle | busy | error`
//! - [`value_objects::Quota`]: per-agent concurrency quota
//! - [`value_objects::TaskStats`]: success counters used as formation history

pub mod entities;
pub mod value_objects;

pub use entities::{Agent, AgentStatus, PerformanceMetrics};
pub use value_objects::{AgentId, Quota, TaskStats};
