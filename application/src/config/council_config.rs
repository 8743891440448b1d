//! Council configuration container.
//!
//! [`CouncilConfig`] groups the typed configuration slices that the use
//! cases need. Each use case receives only the slice it consumes; the
//! binary holds the full container.

use crate::config::{DeliberationParams, HistoryParams};
use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use council_domain::quorum::outlier::DEFAULT_SIGMA;
use council_domain::{
    ConsensusEngine, FormationConfig, OutlierStrategy, ThresholdPolicy, VoteWeightCalculator,
    WeightStrategy,
};
use council_domain::council::DEFAULT_COUNCIL_CACHE_CAPACITY;

/// Tolerance when checking that formation weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Consensus settings: threshold policy, weighting and outlier detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusConfig {
    pub policy: ThresholdPolicy,
    pub weight_strategy: WeightStrategy,
    pub outlier_strategy: OutlierStrategy,
    pub sigma: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            policy: ThresholdPolicy::default(),
            weight_strategy: WeightStrategy::default(),
            outlier_strategy: OutlierStrategy::default(),
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl ConsensusConfig {
    pub fn engine(&self) -> ConsensusEngine {
        ConsensusEngine::new(self.policy)
    }

    pub fn weight_calculator(&self) -> VoteWeightCalculator {
        VoteWeightCalculator::new(self.weight_strategy)
    }
}

/// Configuration container handed out by the composition root.
#[derive(Debug, Clone, Default)]
pub struct CouncilConfig {
    formation: FormationConfig,
    consensus: ConsensusConfig,
    deliberation: DeliberationParams,
    history: HistoryParams,
    cache_capacity: Option<usize>,
}

impl CouncilConfig {
    pub fn new(
        formation: FormationConfig,
        consensus: ConsensusConfig,
        deliberation: DeliberationParams,
        history: HistoryParams,
    ) -> Self {
        Self {
            formation,
            consensus,
            deliberation,
            history,
            cache_capacity: None,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    // ==================== Accessors ====================

    pub fn formation(&self) -> &FormationConfig {
        &self.formation
    }

    pub fn consensus(&self) -> &ConsensusConfig {
        &self.consensus
    }

    pub fn deliberation(&self) -> &DeliberationParams {
        &self.deliberation
    }

    pub fn deliberation_mut(&mut self) -> &mut DeliberationParams {
        &mut self.deliberation
    }

    pub fn history(&self) -> &HistoryParams {
        &self.history
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(DEFAULT_COUNCIL_CACHE_CAPACITY)
    }

    /// Semantic checks on the assembled configuration.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let weights = &self.formation.weights;
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::WeightsNotNormalized,
                format!(
                    "council.weights sum to {:.3}; scores are no longer on a 0-1 scale",
                    weights.sum()
                ),
            ));
        }

        let thresholds = [
            ("consensus.threshold", Some(self.consensus.policy.default_threshold)),
            ("deliberation.threshold", self.deliberation.threshold),
        ];
        for (field, value) in thresholds {
            if let Some(v) = value
                && !(0.0..=1.0).contains(&v)
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                    },
                    format!("{field} must be between 0 and 1, got {v}"),
                ));
            }
        }

        if self.deliberation.max_turns == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "deliberation.max_turns".to_string(),
                },
                "deliberation.max_turns must be at least 1",
            ));
        }

        if self.cache_capacity == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "council.cache_capacity".to_string(),
                },
                "council.cache_capacity must be at least 1",
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::core::validation::has_errors;

    #[test]
    fn test_default_is_valid() {
        let config = CouncilConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.cache_capacity(), 10);
        assert_eq!(config.deliberation().max_turns, 3);
        assert_eq!(config.consensus().policy.default_threshold, 0.8);
    }

    #[test]
    fn test_validate_detects_issues() {
        let mut config = CouncilConfig::default().with_cache_capacity(0);
        config.deliberation_mut().threshold = Some(1.5);
        config.deliberation_mut().max_turns = 0;

        let issues = config.validate();
        assert_eq!(issues.len(), 3);
        assert!(has_errors(&issues));
    }
}
