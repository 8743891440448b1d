//! Context handed to a deliberation.

use crate::agent::AgentId;
use crate::core::error::DomainError;
use crate::quorum::Decision;
use serde::{Deserialize, Serialize};

const MIN_PLAN_WEIGHT: f64 = 0.5;
const MAX_PLAN_WEIGHT: f64 = 1.0;

/// A council member named in a plan, optionally with a fixed weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMember {
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl PlanMember {
    pub fn new(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Explicit weight clamped to [0.5, 1.0]; NaN is ignored.
    pub fn effective_weight(&self) -> Option<f64> {
        self.weight
            .filter(|w| !w.is_nan())
            .map(|w| w.clamp(MIN_PLAN_WEIGHT, MAX_PLAN_WEIGHT))
    }
}

/// A structured plan put to the council for a vote.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub topic: String,
    pub tasks: Vec<String>,
    #[serde(default)]
    pub members: Vec<PlanMember>,
}

impl Plan {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.tasks.push(task.into());
        self
    }

    pub fn with_member(mut self, member: PlanMember) -> Self {
        self.members.push(member);
        self
    }

    /// Reject plans missing a topic or tasks.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.topic.trim().is_empty() {
            return Err(DomainError::InvalidPlan("plan topic is empty".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(DomainError::InvalidPlan("plan has no tasks".to_string()));
        }
        if let Some(blank) = self.tasks.iter().position(|t| t.trim().is_empty()) {
            return Err(DomainError::InvalidPlan(format!("plan task {} is empty", blank + 1)));
        }
        Ok(())
    }

    pub fn weight_for(&self, agent_id: &AgentId) -> Option<f64> {
        self.members
            .iter()
            .find(|m| &m.agent_id == agent_id)
            .and_then(PlanMember::effective_weight)
    }
}

/// What the council deliberates over in addition to the topic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliberationContext {
    #[default]
    None,
    Query { text: String },
    Plan { plan: Plan },
    /// A previous decision being revisited
    Prior { decision: Box<Decision> },
}

impl DeliberationContext {
    pub fn query(text: impl Into<String>) -> Self {
        DeliberationContext::Query { text: text.into() }
    }

    pub fn plan(plan: Plan) -> Self {
        DeliberationContext::Plan { plan }
    }

    pub fn prior(decision: Decision) -> Self {
        DeliberationContext::Prior {
            decision: Box::new(decision),
        }
    }

    pub fn as_plan(&self) -> Option<&Plan> {
        match self {
            DeliberationContext::Plan { plan } => Some(plan),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            DeliberationContext::Plan { plan } => plan.validate(),
            _ => Ok(()),
        }
    }

    /// Short text rendering for prompts and logs.
    pub fn summary(&self) -> String {
        match self {
            DeliberationContext::None => String::new(),
            DeliberationContext::Query { text } => text.clone(),
            DeliberationContext::Plan { plan } => {
                let mut out = format!("Plan: {}", plan.topic);
                for (i, task) in plan.tasks.iter().enumerate() {
                    out.push_str(&format!("\n{}. {}", i + 1, task));
                }
                out
            }
            DeliberationContext::Prior { decision } => format!(
                "Previous decision: {} (confidence {:.2})",
                decision.consensus, decision.confidence_score
            ),
        }
    }
}
