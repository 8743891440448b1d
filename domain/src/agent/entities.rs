//! Agent entities - the council roster members.

use super::value_objects::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle status of an agent.
///
/// `Idle` is the resting state. `Active` marks membership in a running
/// deliberation, `Busy` means at least one task is in flight, and `Error`
/// is set by operators when an agent should be avoided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    #[default]
    Idle,
    Busy,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
        }
    }

    /// Availability score used during council formation.
    pub fn availability_score(&self) -> f64 {
        match self {
            AgentStatus::Active => 1.0,
            AgentStatus::Idle => 0.8,
            AgentStatus::Busy | AgentStatus::Error => 0.3,
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AgentStatus::Active),
            "idle" => Ok(AgentStatus::Idle),
            "busy" => Ok(AgentStatus::Busy),
            "error" => Ok(AgentStatus::Error),
            _ => Err(format!(
                "Unknown agent status: {}. Valid: active, idle, busy, error",
                s
            )),
        }
    }
}

/// Static performance profile supplied with the roster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Overall accuracy, 0.0 to 1.0
    pub accuracy: f64,
    /// Mean response time in milliseconds
    pub response_time: f64,
    /// User feedback on a 0 to 5 scale
    pub user_feedback: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            accuracy: 0.5,
            response_time: 1000.0,
            user_feedback: 2.5,
        }
    }
}

/// A specialised agent that can sit on a council and run tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Domain tag, e.g. "mathematics"
    pub domain: String,
    pub expertise: BTreeSet<String>,
    pub status: AgentStatus,
    pub performance: PerformanceMetrics,
    /// 0.0 to 1.0
    pub adaptability: f64,
    /// 0.0 to 1.0
    pub collaboration_score: f64,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            expertise: BTreeSet::new(),
            status: AgentStatus::Idle,
            performance: PerformanceMetrics::default(),
            adaptability: 0.5,
            collaboration_score: 0.5,
        }
    }

    pub fn with_expertise<I, S>(mut self, expertise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise = expertise
            .into_iter()
            .map(|e| e.into().to_lowercase())
            .collect();
        self
    }

    pub fn with_performance(mut self, performance: PerformanceMetrics) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.performance.accuracy = accuracy;
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_adaptability(mut self, adaptability: f64) -> Self {
        self.adaptability = adaptability.clamp(0.0, 1.0);
        self
    }

    pub fn with_collaboration_score(mut self, score: f64) -> Self {
        self.collaboration_score = score.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_builder() {
        let agent = Agent::new("algebra-1", "mathematics")
            .with_expertise(["Algebra", "equations"])
            .with_accuracy(0.9)
            .with_adaptability(1.4);

        assert_eq!(agent.id.as_str(), "algebra-1");
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.expertise.contains("algebra"));
        assert_eq!(agent.performance.accuracy, 0.9);
        assert_eq!(agent.adaptability, 1.0);
    }

    #[test]
    fn test_availability_scores() {
        assert_eq!(AgentStatus::Active.availability_score(), 1.0);
        assert_eq!(AgentStatus::Idle.availability_score(), 0.8);
        assert_eq!(AgentStatus::Busy.availability_score(), 0.3);
        assert_eq!(AgentStatus::Error.availability_score(), 0.3);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("BUSY".parse::<AgentStatus>(), Ok(AgentStatus::Busy));
        assert!("sleeping".parse::<AgentStatus>().is_err());
        assert_eq!(AgentStatus::Error.to_string(), "error");
    }
}
