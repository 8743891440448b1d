//! Weighted consensus over one round of votes.
//!
//! Votes are grouped by exact string equality of their suggestion. Each
//! group's weighted score is `Σ weight·confidence` over its votes, and the
//! round's confidence is the leading group's share of the total weighted
//! mass of all votes.

use super::vote::Vote;
use crate::agent::AgentId;
use crate::complexity::{ComplexityBand, ComplexityLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default confidence required for consensus.
pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.8;

/// Weight used for a voter missing from the weight map.
const DEFAULT_VOTE_WEIGHT: f64 = 1.0;

/// Optional per-band thresholds that replace the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityOverride {
    pub low: Option<f64>,
    pub medium: Option<f64>,
    pub high: Option<f64>,
}

/// Adaptive consensus threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub default_threshold: f64,
    pub complexity_override: ComplexityOverride,
}

impl ThresholdPolicy {
    pub fn fixed(threshold: f64) -> Self {
        Self {
            default_threshold: threshold,
            complexity_override: ComplexityOverride::default(),
        }
    }

    pub fn with_override(mut self, complexity_override: ComplexityOverride) -> Self {
        self.complexity_override = complexity_override;
        self
    }

    /// Threshold for a council formed at the given complexity.
    pub fn threshold_for(&self, level: ComplexityLevel) -> f64 {
        let o = &self.complexity_override;
        let overridden = match level.band() {
            ComplexityBand::Low => o.low,
            ComplexityBand::Medium => o.medium,
            ComplexityBand::High => o.high,
        };
        overridden.unwrap_or(self.default_threshold)
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_CONSENSUS_THRESHOLD)
    }
}

/// Aggregate for one distinct suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionTally {
    pub suggestion: String,
    pub weighted_score: f64,
    pub supporters: Vec<AgentId>,
}

/// Result of evaluating one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Leading suggestion, empty when there were no votes
    pub consensus: String,
    /// Leading group's share of the total weighted mass, 0.0 to 1.0
    pub confidence: f64,
    /// Tallies in descending score order (first appearance breaks ties)
    pub tallies: Vec<SuggestionTally>,
}

impl ConsensusResult {
    pub fn empty() -> Self {
        Self {
            consensus: String::new(),
            confidence: 0.0,
            tallies: Vec::new(),
        }
    }

    pub fn leader(&self) -> Option<&SuggestionTally> {
        self.tallies.first()
    }
}

/// Computes weighted consensus and threshold checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusEngine {
    policy: ThresholdPolicy,
}

impl ConsensusEngine {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    pub fn threshold_for(&self, level: ComplexityLevel) -> f64 {
        self.policy.threshold_for(level)
    }

    /// Group, weigh and score one round of votes.
    pub fn evaluate(&self, votes: &[Vote], weights: &HashMap<AgentId, f64>) -> ConsensusResult {
        if votes.is_empty() {
            return ConsensusResult::empty();
        }

        let mut tallies: Vec<SuggestionTally> = Vec::new();
        let mut total_mass = 0.0;

        for vote in votes {
            let weight = weights
                .get(&vote.agent_id)
                .copied()
                .unwrap_or(DEFAULT_VOTE_WEIGHT);
            let mass = weight * vote.confidence;
            total_mass += mass;

            match tallies.iter_mut().find(|t| t.suggestion == vote.suggestion) {
                Some(tally) => {
                    tally.weighted_score += mass;
                    tally.supporters.push(vote.agent_id.clone());
                }
                None => tallies.push(SuggestionTally {
                    suggestion: vote.suggestion.clone(),
                    weighted_score: mass,
                    supporters: vec![vote.agent_id.clone()],
                }),
            }
        }

        // Stable sort: equal scores keep first-appearance order.
        tallies.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

        let confidence = match tallies.first() {
            Some(leader) if total_mass > 0.0 => (leader.weighted_score / total_mass).clamp(0.0, 1.0),
            _ => 0.0,
        };
        let consensus = tallies
            .first()
            .map(|t| t.suggestion.clone())
            .unwrap_or_default();

        ConsensusResult {
            consensus,
            confidence,
            tallies,
        }
    }

    /// `confidence >= threshold`
    pub fn is_consensus_reached(confidence: f64, threshold: f64) -> bool {
        confidence >= threshold
    }
}
