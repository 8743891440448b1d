//! Deliberation and history parameters.
//!
//! These control the deliberation loop and the history store. They are
//! application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_TURNS: usize = 3;
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Deliberation loop control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliberationParams {
    /// Maximum number of voting rounds.
    pub max_turns: usize,
    /// Fixed threshold overriding the complexity-adaptive one.
    pub threshold: Option<f64>,
    /// Budget for one round; a round that overruns is discarded.
    pub round_timeout: Duration,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            threshold: None,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
        }
    }
}

impl DeliberationParams {
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// Overall time budget: `max_turns × round_timeout`.
    pub fn time_limit(&self) -> Duration {
        self.round_timeout * self.max_turns.max(1) as u32
    }
}

/// Vote history retention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of decisions kept; oldest are dropped first.
    pub capacity: usize,
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DeliberationParams::default();
        assert_eq!(params.max_turns, 3);
        assert!(params.threshold.is_none());
        assert_eq!(params.time_limit(), Duration::from_secs(90));
        assert_eq!(HistoryParams::default().capacity, 100);
    }

    #[test]
    fn test_builder() {
        let params = DeliberationParams::default()
            .with_max_turns(5)
            .with_threshold(0.7)
            .with_round_timeout(Duration::from_secs(10));
        assert_eq!(params.max_turns, 5);
        assert_eq!(params.threshold, Some(0.7));
        assert_eq!(params.time_limit(), Duration::from_secs(50));
    }
}
