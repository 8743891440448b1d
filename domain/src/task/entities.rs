//! Units of asynchronous agent work.

use crate::agent::AgentId;
use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Sequential id of the form `task-<n>`.
    pub fn sequential(n: u64) -> Self {
        Self(format!("task-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for TaskId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for quota
    #[default]
    Pending,
    /// Admitted and running on the executor
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }

    /// Statuses only move forward; terminal statuses never change.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Scheduling priority; higher runs first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" | "0" => Ok(TaskPriority::Low),
            "normal" | "medium" | "1" => Ok(TaskPriority::Normal),
            "high" | "2" => Ok(TaskPriority::High),
            "critical" | "urgent" | "3" => Ok(TaskPriority::Critical),
            other => Err(format!("unknown task priority: {other}")),
        }
    }
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub agent_id: AgentId,
    pub task_type: String,
    pub content: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    /// Milliseconds since epoch
    pub created_at: u64,
    /// Submission order, used to break priority ties
    pub seq: u64,
}

impl Task {
    pub fn new(
        id: TaskId,
        agent_id: impl Into<AgentId>,
        task_type: impl Into<String>,
        content: impl Into<String>,
        priority: TaskPriority,
        seq: u64,
    ) -> Self {
        Self {
            id,
            agent_id: agent_id.into(),
            task_type: task_type.into(),
            content: content.into(),
            priority,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: current_timestamp(),
            seq,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Apply a forward transition. `result`/`error` are stored only if not
    /// already set. Returns `false` and leaves the task untouched otherwise.
    pub fn transition(
        &mut self,
        next: TaskStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if self.result.is_none() {
            self.result = result;
        }
        if self.error.is_none() {
            self.error = error;
        }
        true
    }

    pub fn mark_processing(&mut self) -> bool {
        self.transition(TaskStatus::Processing, None, None)
    }

    pub fn mark_completed(&mut self, result: impl Into<String>) -> bool {
        self.transition(TaskStatus::Completed, Some(result.into()), None)
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> bool {
        self.transition(TaskStatus::Failed, None, Some(error.into()))
    }
}

/// Dispatch order: priority descending, then submission order.
pub fn dispatch_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq))
}
