//! Domain layer for agent-council
//!
//! This crate contains the entities, value objects and algorithms of the
//! council core. It has no I/O and no async runtime.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is a bounded, domain-balanced team of agents assembled for one
//! query. The [`QueryComplexityAnalyzer`] sizes and targets it, and the
//! [`CouncilFormationService`] picks the members.
//!
//! ## Deliberation
//!
//! Each round every member casts a [`Vote`]. Votes are weighted by the
//! [`VoteWeightCalculator`] and scored by the [`ConsensusEngine`]; rounds
//! repeat until the threshold is met or the turn limit is hit, yielding a
//! [`Decision`].
//!
//! ## Tasks
//!
//! A [`Task`] is a unit of work for one agent. Admission is bounded by the
//! agent's [`Quota`].

pub mod agent;
pub mod complexity;
pub mod core;
pub mod council;
pub mod deliberation;
pub mod events;
pub mod quorum;
pub mod task;

// Re-export commonly used types
pub use agent::{Agent, AgentId, AgentStatus, PerformanceMetrics, Quota, TaskStats};
pub use complexity::{ComplexityBand, ComplexityLevel, ComplexityProfile, QueryComplexityAnalyzer};
pub use core::{
    error::DomainError,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use council::{
    Council, CouncilBounds, CouncilCache, CouncilFormationService, CouncilId, CouncilStatus,
    FormationConfig, FormationWeights,
};
pub use deliberation::{
    DeliberationContext, DeliberationPhase, DeliberationState, Plan, PlanMember,
};
pub use events::CouncilEvent;
pub use quorum::{
    ComplexityOverride, ConsensusEngine, ConsensusResult, Decision, OutlierDetector,
    OutlierStrategy, PerformanceHistory, SecurityAnalysis, SuspiciousVote, ThresholdPolicy, Vote,
    VoteWeightCalculator, WeightInput, WeightStrategy,
};
pub use task::{Task, TaskId, TaskPriority, TaskStatus};
