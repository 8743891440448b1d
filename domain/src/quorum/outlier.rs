//! Outlier detection over vote confidences.
//!
//! Two detectors are available. [`StatisticalDetector`] flags votes whose
//! confidence lies more than `sigma` standard deviations from the round mean,
//! and also flags saturated confidences. [`FixedThresholdDetector`] flags
//! only saturated confidences.

use super::vote::Vote;
use crate::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence above this is treated as saturated.
pub const SATURATION_HIGH: f64 = 0.95;
/// Confidence below this is treated as saturated.
pub const SATURATION_LOW: f64 = 0.05;
/// Default z-score cutoff.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Why a vote was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierReason {
    /// Farther than `sigma` standard deviations from the mean
    Deviation,
    /// Confidence above [`SATURATION_HIGH`]
    Overconfident,
    /// Confidence below [`SATURATION_LOW`]
    Underconfident,
}

impl OutlierReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierReason::Deviation => "deviation",
            OutlierReason::Overconfident => "overconfident",
            OutlierReason::Underconfident => "underconfident",
        }
    }
}

impl fmt::Display for OutlierReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flagged vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousVote {
    pub agent_id: AgentId,
    pub confidence: f64,
    pub reason: OutlierReason,
}

/// Flags votes with anomalous confidence.
pub trait OutlierDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the flagged votes, in input order, at most once per vote.
    fn detect(&self, votes: &[Vote]) -> Vec<SuspiciousVote>;
}

fn saturation(confidence: f64) -> Option<OutlierReason> {
    if confidence > SATURATION_HIGH {
        Some(OutlierReason::Overconfident)
    } else if confidence < SATURATION_LOW {
        Some(OutlierReason::Underconfident)
    } else {
        None
    }
}

/// Z-score detector using the population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalDetector {
    pub sigma: f64,
    /// Below this many votes no statistics are computed
    pub min_votes: usize,
}

impl StatisticalDetector {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }
}

impl Default for StatisticalDetector {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            min_votes: 3,
        }
    }
}

impl OutlierDetector for StatisticalDetector {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn detect(&self, votes: &[Vote]) -> Vec<SuspiciousVote> {
        if votes.len() < self.min_votes {
            return Vec::new();
        }

        let n = votes.len() as f64;
        let mean = votes.iter().map(|v| v.confidence).sum::<f64>() / n;
        let variance = votes
            .iter()
            .map(|v| (v.confidence - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        votes
            .iter()
            .filter_map(|vote| {
                let deviates =
                    std_dev > f64::EPSILON && ((vote.confidence - mean) / std_dev).abs() > self.sigma;
                let reason = saturation(vote.confidence)
                    .or(deviates.then_some(OutlierReason::Deviation));
                reason.map(|reason| SuspiciousVote {
                    agent_id: vote.agent_id.clone(),
                    confidence: vote.confidence,
                    reason,
                })
            })
            .collect()
    }
}

/// Flags confidences outside [`SATURATION_LOW`, `SATURATION_HIGH`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedThresholdDetector;

impl OutlierDetector for FixedThresholdDetector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn detect(&self, votes: &[Vote]) -> Vec<SuspiciousVote> {
        votes
            .iter()
            .filter_map(|vote| {
                saturation(vote.confidence).map(|reason| SuspiciousVote {
                    agent_id: vote.agent_id.clone(),
                    confidence: vote.confidence,
                    reason,
                })
            })
            .collect()
    }
}

/// Which detector to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierStrategy {
    #[default]
    Statistical,
    Fixed,
}

impl OutlierStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierStrategy::Statistical => "statistical",
            OutlierStrategy::Fixed => "fixed",
        }
    }

    pub fn detector(&self, sigma: f64) -> Box<dyn OutlierDetector> {
        match self {
            OutlierStrategy::Statistical => Box::new(StatisticalDetector::new(sigma)),
            OutlierStrategy::Fixed => Box::new(FixedThresholdDetector),
        }
    }
}

impl fmt::Display for OutlierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutlierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "statistical" | "zscore" | "z-score" => Ok(OutlierStrategy::Statistical),
            "fixed" | "threshold" => Ok(OutlierStrategy::Fixed),
            other => Err(format!("unknown outlier strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(confidences: &[f64]) -> Vec<Vote> {
        confidences
            .iter()
            .enumerate()
            .map(|(i, c)| Vote::new(format!("agent-{i}"), "X", *c))
            .collect()
    }

    #[test]
    fn test_statistical_flags_saturated_vote() {
        let flagged = StatisticalDetector::default().detect(&votes(&[0.6, 0.6, 0.6, 0.6, 0.99]));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].agent_id.as_str(), "agent-4");
        assert_eq!(flagged[0].reason, OutlierReason::Overconfident);
    }

    #[test]
    fn test_statistical_flags_deviation_in_large_round() {
        let mut confidences = vec![0.5; 9];
        confidences.push(0.9);
        let flagged = StatisticalDetector::default().detect(&votes(&confidences));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].reason, OutlierReason::Deviation);
    }

    #[test]
    fn test_statistical_needs_minimum_votes() {
        let flagged = StatisticalDetector::default().detect(&votes(&[0.99, 0.01]));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_uniform_votes_not_flagged() {
        let flagged = StatisticalDetector::default().detect(&votes(&[0.7, 0.7, 0.7, 0.7]));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_fixed_threshold() {
        let flagged = FixedThresholdDetector.detect(&votes(&[0.99, 0.5, 0.01]));
        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].reason, OutlierReason::Overconfident);
        assert_eq!(flagged[1].reason, OutlierReason::Underconfident);
        // Boundaries are not saturated.
        assert!(FixedThresholdDetector.detect(&votes(&[0.95, 0.05])).is_empty());
    }

    #[test]
    fn test_both_detectors_flag_saturated_pair() {
        let round = votes(&[0.99, 0.98, 0.6, 0.6, 0.6]);
        let detectors: [Box<dyn OutlierDetector>; 2] = [
            Box::new(StatisticalDetector::default()),
            Box::new(FixedThresholdDetector),
        ];

        for detector in &detectors {
            let flagged = detector.detect(&round);
            let ids: Vec<&str> = flagged.iter().map(|s| s.agent_id.as_str()).collect();
            assert_eq!(ids, vec!["agent-0", "agent-1"], "{}", detector.name());
            assert!(flagged.iter().all(|s| s.reason == OutlierReason::Overconfident));
        }
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("statistical".parse(), Ok(OutlierStrategy::Statistical));
        assert_eq!("Fixed".parse(), Ok(OutlierStrategy::Fixed));
        assert!("median".parse::<OutlierStrategy>().is_err());
        assert_eq!(OutlierStrategy::Fixed.detector(2.0).name(), "fixed");
    }
}
