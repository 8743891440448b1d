//! Vote weighting strategies.
//!
//! Two strategies ship with the crate and a third composes them:
//!
//! | Strategy | Formula |
//! |----------|---------|
//! | [`ExpertiseWeighting`] | `0.6 + 0.4·match` plus performance bonuses, clamped to [0.5, 1.0] |
//! | [`ConfidenceWeighting`] | `0.6 + 0.3·confidence` |
//! | [`AutoWeighting`] | expertise when the agent has history, confidence otherwise |

use crate::agent::{Agent, TaskStats};
use crate::core::string::{contains_either, shares_substring};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MIN_WEIGHT: f64 = 0.5;
const MAX_WEIGHT: f64 = 1.0;

const DOMAIN_MISMATCH: f64 = 0.3;
const DOMAIN_MATCH: f64 = 0.7;
const EXPERTISE_EXACT: f64 = 0.9;
const EXPERTISE_RELATED: f64 = 0.6;
/// Minimum shared run length for a "related" expertise match.
const RELATED_MIN_CHARS: usize = 3;

const TOPIC_ACCURACY_BONUS: f64 = 0.15;
const ACCURACY_BONUS: f64 = 0.10;
const FEEDBACK_BONUS: f64 = 0.10;
const FEEDBACK_SCALE: f64 = 5.0;
const ADAPTABILITY_BONUS: f64 = 0.05;
const COLLABORATION_BONUS: f64 = 0.05;

/// Phrases that mark a topic as complex enough to reward collaboration.
const COMPLEX_TOPIC_INDICATORS: &[&str] = &[
    "multi-step",
    "multiple steps",
    "trade-off",
    "tradeoff",
    "system design",
    "architecture",
    "optimize",
    "prove",
    "integrate",
    "compare and contrast",
    "end-to-end",
    "interdisciplinary",
];

/// Past performance available when weighting a vote.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceHistory {
    /// Fraction of past decisions on this topic the agent agreed with
    pub topic_accuracy: Option<f64>,
    pub task_stats: TaskStats,
}

impl PerformanceHistory {
    pub fn has_history(&self) -> bool {
        self.topic_accuracy.is_some() || self.task_stats.has_history()
    }
}

/// Everything a weighting strategy may consult.
#[derive(Debug, Clone, Copy)]
pub struct WeightInput<'a> {
    pub agent: &'a Agent,
    pub topic: &'a str,
    pub vote_confidence: f64,
    pub history: PerformanceHistory,
}

/// A pluggable vote weighting strategy.
pub trait VoteWeighting: Send + Sync {
    fn name(&self) -> &'static str;

    fn weight(&self, input: &WeightInput<'_>) -> f64;
}

/// Heuristic weight from domain/expertise match and performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpertiseWeighting;

impl ExpertiseWeighting {
    /// `max(domain match, best expertise match)` for an agent and topic.
    pub fn expertise_match(agent: &Agent, topic: &str) -> f64 {
        let domain = if contains_either(&agent.domain, topic) {
            DOMAIN_MATCH
        } else {
            DOMAIN_MISMATCH
        };

        let expertise = agent
            .expertise
            .iter()
            .map(|term| {
                if contains_either(term, topic) {
                    EXPERTISE_EXACT
                } else if shares_substring(term, topic, RELATED_MIN_CHARS) {
                    EXPERTISE_RELATED
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max);

        domain.max(expertise)
    }
}

impl VoteWeighting for ExpertiseWeighting {
    fn name(&self) -> &'static str {
        "expertise"
    }

    fn weight(&self, input: &WeightInput<'_>) -> f64 {
        let agent = input.agent;
        let mut weight = 0.6 + 0.4 * Self::expertise_match(agent, input.topic);

        if let Some(topic_accuracy) = input.history.topic_accuracy {
            weight += TOPIC_ACCURACY_BONUS * topic_accuracy.clamp(0.0, 1.0);
        }
        weight += ACCURACY_BONUS * agent.performance.accuracy.clamp(0.0, 1.0);
        weight += FEEDBACK_BONUS * (agent.performance.user_feedback / FEEDBACK_SCALE).clamp(0.0, 1.0);
        weight += ADAPTABILITY_BONUS * agent.adaptability.clamp(0.0, 1.0);
        if is_complex_topic(input.topic) {
            weight += COLLABORATION_BONUS * agent.collaboration_score.clamp(0.0, 1.0);
        }

        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    }
}

/// Fallback weight from the vote's own confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceWeighting;

impl VoteWeighting for ConfidenceWeighting {
    fn name(&self) -> &'static str {
        "confidence"
    }

    fn weight(&self, input: &WeightInput<'_>) -> f64 {
        0.6 + 0.3 * input.vote_confidence.clamp(0.0, 1.0)
    }
}

/// Expertise weighting for agents with history, confidence weighting otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoWeighting;

impl VoteWeighting for AutoWeighting {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn weight(&self, input: &WeightInput<'_>) -> f64 {
        if input.history.has_history() {
            ExpertiseWeighting.weight(input)
        } else {
            ConfidenceWeighting.weight(input)
        }
    }
}

/// Configured weighting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightStrategy {
    #[default]
    Auto,
    Expertise,
    Confidence,
}

impl std::str::FromStr for WeightStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(WeightStrategy::Auto),
            "expertise" | "heuristic" => Ok(WeightStrategy::Expertise),
            "confidence" => Ok(WeightStrategy::Confidence),
            _ => Err(format!(
                "Unknown weight strategy: {}. Valid: auto, expertise, confidence",
                s
            )),
        }
    }
}

/// Computes per-agent vote weights through a pluggable strategy.
#[derive(Clone)]
pub struct VoteWeightCalculator {
    weighting: Arc<dyn VoteWeighting>,
}

impl VoteWeightCalculator {
    pub fn new(strategy: WeightStrategy) -> Self {
        let weighting: Arc<dyn VoteWeighting> = match strategy {
            WeightStrategy::Auto => Arc::new(AutoWeighting),
            WeightStrategy::Expertise => Arc::new(ExpertiseWeighting),
            WeightStrategy::Confidence => Arc::new(ConfidenceWeighting),
        };
        Self { weighting }
    }

    /// Use a custom strategy.
    pub fn with_weighting(weighting: Arc<dyn VoteWeighting>) -> Self {
        Self { weighting }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.weighting.name()
    }

    pub fn weight(&self, input: &WeightInput<'_>) -> f64 {
        self.weighting.weight(input)
    }
}

impl Default for VoteWeightCalculator {
    fn default() -> Self {
        Self::new(WeightStrategy::default())
    }
}

impl std::fmt::Debug for VoteWeightCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteWeightCalculator")
            .field("strategy", &self.weighting.name())
            .finish()
    }
}

/// Keyword heuristic: does the topic contain a complexity indicator phrase?
pub fn is_complex_topic(topic: &str) -> bool {
    let lowered = topic.to_lowercase();
    COMPLEX_TOPIC_INDICATORS
        .iter()
        .any(|phrase| lowered.contains(phrase))
}
