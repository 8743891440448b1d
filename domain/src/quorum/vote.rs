//! Vote types for council deliberation.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

/// A single agent's vote in one deliberation round.
///
/// # Example
///
/// ```
/// use council_domain::quorum::Vote;
///
/// let vote = Vote::new("algebra-tutor", "Use substitution", 1.4)
///     .with_reasoning("Both equations are linear.");
/// assert_eq!(vote.confidence, 1.0);
/// assert_eq!(vote.suggestion, "Use substitution");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub agent_id: AgentId,
    /// Free-text suggestion; votes are grouped by exact equality of this field
    pub suggestion: String,
    /// Confidence level (0.0 to 1.0)
    pub confidence: f64,
    pub reasoning: String,
}

impl Vote {
    pub fn new(agent_id: impl Into<AgentId>, suggestion: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            suggestion: suggestion.into(),
            confidence: clamp_unit(confidence),
            reasoning: String::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Vote::new("a", "x", -0.2).confidence, 0.0);
        assert_eq!(Vote::new("a", "x", 2.0).confidence, 1.0);
        assert_eq!(Vote::new("a", "x", f64::NAN).confidence, 0.0);
        assert_eq!(Vote::new("a", "x", 0.42).confidence, 0.42);
    }
}
