//! Decision records produced by deliberation.

use super::outlier::SuspiciousVote;
use super::vote::Vote;
use crate::core::current_timestamp;
use crate::council::CouncilId;
use serde::{Deserialize, Serialize};

/// Remediation steps attached to every security analysis.
pub const SECURITY_RECOMMENDATIONS: [&str; 3] = [
    "Review the reasoning of flagged agents before acting on this decision",
    "Cross-check flagged agents' recent accuracy against the vote history",
    "Consider re-running deliberation without the flagged agents",
];

/// Integrity annotation for a decision with suspicious votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAnalysis {
    /// `|suspicious| / |votes|`
    pub risk_level: f64,
    pub suspicious_votes: Vec<SuspiciousVote>,
    pub recommendations: Vec<String>,
}

impl SecurityAnalysis {
    /// Build an analysis, or `None` when nothing was flagged.
    pub fn from_suspicious(suspicious: Vec<SuspiciousVote>, total_votes: usize) -> Option<Self> {
        if suspicious.is_empty() || total_votes == 0 {
            return None;
        }
        Some(Self {
            risk_level: suspicious.len() as f64 / total_votes as f64,
            suspicious_votes: suspicious,
            recommendations: SECURITY_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Outcome of a deliberation, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub topic: String,
    pub votes: Vec<Vote>,
    /// Chosen suggestion, empty when no vote was cast
    pub consensus: String,
    pub confidence_score: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_analysis: Option<SecurityAnalysis>,
    /// Set when the turn limit was hit without reaching the threshold
    #[serde(default)]
    pub no_consensus: bool,
    #[serde(default)]
    pub rounds: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub council_id: Option<CouncilId>,
}

impl Decision {
    pub fn new(
        topic: impl Into<String>,
        votes: Vec<Vote>,
        consensus: impl Into<String>,
        confidence_score: f64,
    ) -> Self {
        Self {
            topic: topic.into(),
            votes,
            consensus: consensus.into(),
            confidence_score: super::vote::clamp_unit(confidence_score),
            timestamp: current_timestamp(),
            security_analysis: None,
            no_consensus: false,
            rounds: 1,
            council_id: None,
        }
    }

    pub fn with_security_analysis(mut self, analysis: Option<SecurityAnalysis>) -> Self {
        self.security_analysis = analysis;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_council(mut self, council_id: CouncilId) -> Self {
        self.council_id = Some(council_id);
        self
    }

    pub fn mark_no_consensus(mut self) -> Self {
        self.no_consensus = true;
        self
    }

    pub fn has_consensus(&self) -> bool {
        !self.no_consensus && !self.consensus.is_empty()
    }

    pub fn is_suspicious(&self) -> bool {
        self.security_analysis.is_some()
    }

    /// The suggestion the given agent voted for, if it voted.
    pub fn suggestion_of(&self, agent_id: &crate::agent::AgentId) -> Option<&str> {
        self.votes
            .iter()
            .find(|v| &v.agent_id == agent_id)
            .map(|v| v.suggestion.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::quorum::outlier::OutlierReason;

    #[test]
    fn test_security_analysis_risk_level() {
        let flagged = vec![SuspiciousVote {
            agent_id: AgentId::new("a"),
            confidence: 0.99,
            reason: OutlierReason::Overconfident,
        }];
        let analysis = SecurityAnalysis::from_suspicious(flagged, 4).unwrap();
        assert_eq!(analysis.risk_level, 0.25);
        assert_eq!(analysis.recommendations.len(), SECURITY_RECOMMENDATIONS.len());
        assert!(SecurityAnalysis::from_suspicious(Vec::new(), 4).is_none());
    }

    #[test]
    fn test_decision_flags() {
        let decision = Decision::new("t", vec![Vote::new("a", "X", 0.7)], "X", 0.7);
        assert!(decision.has_consensus());
        assert!(!decision.is_suspicious());
        assert_eq!(decision.suggestion_of(&AgentId::new("a")), Some("X"));
        assert_eq!(decision.suggestion_of(&AgentId::new("b")), None);

        let exhausted = decision.mark_no_consensus();
        assert!(!exhausted.has_consensus());
    }

    #[test]
    fn test_decision_serde_skips_empty_analysis() {
        let decision = Decision::new("t", Vec::new(), "", 0.0);
        let json = serde_json::to_string(&decision).unwrap();
        assert!(!json.contains("security_analysis"));
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decision);
    }
}
