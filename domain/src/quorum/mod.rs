//! Voting and consensus.
//!
//! A deliberation round collects one [`Vote`] per council member, weighs each
//! with a [`VoteWeightCalculator`], and hands the batch to the
//! [`ConsensusEngine`]. An [`OutlierDetector`] annotates the resulting
//! [`Decision`] without blocking it.

pub mod consensus;
pub mod decision;
pub mod outlier;
pub mod parsing;
pub mod vote;
pub mod weight;

pub use consensus::{
    ComplexityOverride, ConsensusEngine, ConsensusResult, DEFAULT_CONSENSUS_THRESHOLD,
    SuggestionTally, ThresholdPolicy,
};
pub use decision::{Decision, SECURITY_RECOMMENDATIONS, SecurityAnalysis};
pub use outlier::{
    FixedThresholdDetector, OutlierDetector, OutlierReason, OutlierStrategy, StatisticalDetector,
    SuspiciousVote,
};
pub use parsing::parse_vote_output;
pub use vote::Vote;
pub use weight::{
    AutoWeighting, ConfidenceWeighting, ExpertiseWeighting, PerformanceHistory,
    VoteWeightCalculator, VoteWeighting, WeightInput, WeightStrategy, is_complex_topic,
};
