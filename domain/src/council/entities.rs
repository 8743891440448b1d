//! Council entities.

use crate::agent::{Agent, AgentId};
use crate::complexity::ComplexityLevel;
use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};

/// Unique identifier for a council.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouncilId(String);

impl CouncilId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Sequential id of the form `council-<n>`.
    pub fn sequential(n: u64) -> Self {
        Self(format!("council-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for CouncilId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for CouncilId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilStatus {
    #[default]
    Active,
    Inactive,
}

/// A bounded, domain-balanced team of agents assembled for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Council {
    pub id: CouncilId,
    pub topic: String,
    /// Members in selection order (coverage picks first, then fill).
    pub agents: Vec<Agent>,
    pub status: CouncilStatus,
    /// Complexity of the query the council was formed for
    pub complexity: ComplexityLevel,
    /// Milliseconds since epoch
    pub created_at: u64,
}

impl Council {
    pub fn new(
        id: CouncilId,
        topic: impl Into<String>,
        agents: Vec<Agent>,
        complexity: ComplexityLevel,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            agents,
            status: CouncilStatus::Active,
            complexity,
            created_at: current_timestamp(),
        }
    }

    pub fn size(&self) -> usize {
        self.agents.len()
    }

    pub fn is_active(&self) -> bool {
        self.status == CouncilStatus::Active
    }

    pub fn member_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id.clone()).collect()
    }

    pub fn member(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// Normalised topic used for council reuse lookups.
    pub fn topic_key(topic: &str) -> String {
        topic.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_council_basics() {
        let council = Council::new(
            CouncilId::sequential(1),
            "Fractions",
            vec![Agent::new("a", "mathematics"), Agent::new("b", "language")],
            ComplexityLevel::Moderate,
        );
        assert_eq!(council.id.as_str(), "council-1");
        assert_eq!(council.size(), 2);
        assert!(council.is_active());
        assert!(council.member(&AgentId::new("b")).is_some());
        assert_eq!(council.member_ids(), vec![AgentId::new("a"), AgentId::new("b")]);
    }

    #[test]
    fn test_topic_key_normalises() {
        assert_eq!(Council::topic_key("  Photosynthesis Basics "), "photosynthesis basics");
    }
}
