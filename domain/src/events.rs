//! Events published by the council core.
//!
//! Names follow the `noun:verb` convention (`task:completed`,
//! `message:delivered`, ...). See [`CouncilEvent::name`].

use crate::agent::AgentId;
use crate::council::CouncilId;
use crate::task::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CouncilEvent {
    AgentRegistered {
        agent_id: AgentId,
        max_concurrent_tasks: u32,
    },
    TaskSubmitted {
        task_id: TaskId,
        agent_id: AgentId,
    },
    TaskUpdated {
        task_id: TaskId,
        status: TaskStatus,
    },
    TaskCompleted {
        task_id: TaskId,
        agent_id: AgentId,
    },
    TaskFailed {
        task_id: TaskId,
        agent_id: AgentId,
        error: String,
    },
    /// A vote request went out to an agent
    MessageSent {
        agent_id: AgentId,
        topic: String,
        round: usize,
    },
    /// An agent's vote came back
    MessageDelivered {
        agent_id: AgentId,
        topic: String,
        round: usize,
    },
    DecisionRecorded {
        topic: String,
        council_id: Option<CouncilId>,
        consensus: String,
        confidence: f64,
        no_consensus: bool,
    },
}

impl CouncilEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CouncilEvent::AgentRegistered { .. } => "agent:registered",
            CouncilEvent::TaskSubmitted { .. } => "task:submitted",
            CouncilEvent::TaskUpdated { .. } => "task:updated",
            CouncilEvent::TaskCompleted { .. } => "task:completed",
            CouncilEvent::TaskFailed { .. } => "task:failed",
            CouncilEvent::MessageSent { .. } => "message:sent",
            CouncilEvent::MessageDelivered { .. } => "message:delivered",
            CouncilEvent::DecisionRecorded { .. } => "decision:recorded",
        }
    }

    /// Whether this event frees quota and should trigger a pending re-scan.
    pub fn releases_quota(&self) -> bool {
        matches!(
            self,
            CouncilEvent::TaskCompleted { .. } | CouncilEvent::TaskFailed { .. }
        )
    }
}
