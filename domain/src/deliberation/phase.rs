//! Deliberation state machine.
//!
//! ```text
//! NotStarted ──▶ Collecting ──▶ Evaluating ──┬──▶ Converged
//!                    ▲                       ├──▶ NextRound ──▶ Collecting
//!                    │                       └──▶ Exhausted
//!                    └───────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliberationPhase {
    #[default]
    NotStarted,
    Collecting,
    Evaluating,
    NextRound,
    Converged,
    Exhausted,
}

impl DeliberationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliberationPhase::NotStarted => "not_started",
            DeliberationPhase::Collecting => "collecting",
            DeliberationPhase::Evaluating => "evaluating",
            DeliberationPhase::NextRound => "next_round",
            DeliberationPhase::Converged => "converged",
            DeliberationPhase::Exhausted => "exhausted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliberationPhase::Converged | DeliberationPhase::Exhausted)
    }

    pub fn can_transition_to(&self, next: DeliberationPhase) -> bool {
        use DeliberationPhase::*;
        matches!(
            (self, next),
            (NotStarted, Collecting)
                | (Collecting, Evaluating)
                // A timed-out round is discarded without evaluation.
                | (Collecting, NextRound)
                | (Collecting, Exhausted)
                | (Evaluating, Converged)
                | (Evaluating, NextRound)
                | (Evaluating, Exhausted)
                | (NextRound, Collecting)
        )
    }
}

impl fmt::Display for DeliberationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks phase and round count for one deliberation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliberationState {
    phase: DeliberationPhase,
    round: usize,
    max_turns: usize,
}

impl DeliberationState {
    /// `max_turns` of zero is raised to one.
    pub fn new(max_turns: usize) -> Self {
        Self {
            phase: DeliberationPhase::NotStarted,
            round: 0,
            max_turns: max_turns.max(1),
        }
    }

    pub fn phase(&self) -> DeliberationPhase {
        self.phase
    }

    /// 1-based number of the current (or last) round.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn has_turns_left(&self) -> bool {
        self.round < self.max_turns
    }

    /// Move to `next`, returning `false` for an illegal transition.
    pub fn advance(&mut self, next: DeliberationPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            return false;
        }
        if next == DeliberationPhase::Collecting {
            self.round += 1;
        }
        self.phase = next;
        true
    }

    /// Choose the phase after a round: converged, another round, or exhausted.
    pub fn conclude_round(&mut self, reached: bool) -> DeliberationPhase {
        let next = if reached {
            DeliberationPhase::Converged
        } else if self.has_turns_left() {
            DeliberationPhase::NextRound
        } else {
            DeliberationPhase::Exhausted
        };
        self.advance(next);
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_in_first_round() {
        let mut state = DeliberationState::new(3);
        assert!(state.advance(DeliberationPhase::Collecting));
        assert!(state.advance(DeliberationPhase::Evaluating));
        assert_eq!(state.conclude_round(true), DeliberationPhase::Converged);
        assert_eq!(state.round(), 1);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_exhausts_after_max_turns() {
        let mut state = DeliberationState::new(2);
        for _ in 0..2 {
            assert!(state.advance(DeliberationPhase::Collecting));
            assert!(state.advance(DeliberationPhase::Evaluating));
            let next = state.conclude_round(false);
            if next == DeliberationPhase::NextRound {
                continue;
            }
            assert_eq!(next, DeliberationPhase::Exhausted);
        }
        assert_eq!(state.phase(), DeliberationPhase::Exhausted);
        assert_eq!(state.round(), 2);
    }

    #[test]
    fn test_skipped_round_goes_straight_to_next() {
        let mut state = DeliberationState::new(3);
        state.advance(DeliberationPhase::Collecting);
        assert_eq!(state.conclude_round(false), DeliberationPhase::NextRound);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut state = DeliberationState::new(1);
        assert!(!state.advance(DeliberationPhase::Evaluating));
        assert!(!state.advance(DeliberationPhase::Converged));
        assert_eq!(state.phase(), DeliberationPhase::NotStarted);
        assert!(!DeliberationPhase::Converged.can_transition_to(DeliberationPhase::Collecting));
    }

    #[test]
    fn test_zero_turns_raised_to_one() {
        assert_eq!(DeliberationState::new(0).max_turns(), 1);
    }
}
