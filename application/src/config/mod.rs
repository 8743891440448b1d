//! Application-level configuration.
//!
//! - [`DeliberationParams`]: round count, threshold override, round timeout
//! - [`HistoryParams`]: vote history retention
//! - [`CouncilConfig`]: container for all typed slices

pub mod council_config;
pub mod deliberation_params;

pub use council_config::{ConsensusConfig, CouncilConfig};
pub use deliberation_params::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_TURNS, DEFAULT_ROUND_TIMEOUT, DeliberationParams,
    HistoryParams,
};
