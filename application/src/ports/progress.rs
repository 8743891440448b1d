//! Progress notification port
//!
//! Defines the interface for reporting progress during deliberation.

use council_domain::{AgentId, ConsensusResult, DeliberationPhase};

/// Callback for progress updates during deliberation
///
/// Implementations live in the presentation layer.
pub trait DeliberationProgress: Send + Sync {
    /// Called when a round starts collecting votes
    fn on_round_start(&self, round: usize, max_turns: usize, members: usize);

    /// Called as each member's vote arrives (or fails)
    fn on_vote(&self, agent_id: &AgentId, success: bool);

    /// Called after a round has been evaluated
    fn on_round_complete(&self, _round: usize, _result: &ConsensusResult, _threshold: f64) {}

    /// Called when a round overran its time budget
    fn on_round_timeout(&self, _round: usize) {}

    /// Called once with the terminal phase
    fn on_finished(&self, _phase: DeliberationPhase) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_round_start(&self, _round: usize, _max_turns: usize, _members: usize) {}
    fn on_vote(&self, _agent_id: &AgentId, _success: bool) {}
}
