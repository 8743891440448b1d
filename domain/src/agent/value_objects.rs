//! Agent value objects: identifiers, quotas and task statistics.

use serde::{Deserialize, Serialize};

/// Unique identifier for an agent in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for AgentId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base number of concurrent task slots, scaled by accuracy.
const QUOTA_BASE: f64 = 3.0;

/// Concurrency quota for a single agent.
///
/// Invariant: `current_usage <= max_concurrent_tasks`. The only mutators are
/// [`Quota::try_acquire`] and [`Quota::release`], both of which preserve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    max_concurrent_tasks: u32,
    current_usage: u32,
}

impl Quota {
    /// Derive a quota from an agent's accuracy:
    /// `max(1, round(3 * (accuracy + 1) / 2))`.
    pub fn for_accuracy(accuracy: f64) -> Self {
        let raw = (QUOTA_BASE * (accuracy + 1.0) / 2.0).round();
        let max = if raw.is_finite() && raw >= 1.0 {
            raw as u32
        } else {
            1
        };
        Self::with_limit(max)
    }

    /// A fresh quota with an explicit limit (at least 1).
    pub fn with_limit(max_concurrent_tasks: u32) -> Self {
        Self {
            max_concurrent_tasks: max_concurrent_tasks.max(1),
            current_usage: 0,
        }
    }

    pub fn max_concurrent_tasks(&self) -> u32 {
        self.max_concurrent_tasks
    }

    pub fn current_usage(&self) -> u32 {
        self.current_usage
    }

    pub fn has_capacity(&self) -> bool {
        self.current_usage < self.max_concurrent_tasks
    }

    /// Take one slot. Returns `false` (and leaves usage untouched) when full.
    pub fn try_acquire(&mut self) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.current_usage += 1;
        true
    }

    /// Give one slot back. Returns `false` when nothing was held.
    pub fn release(&mut self) -> bool {
        if self.current_usage == 0 {
            return false;
        }
        self.current_usage -= 1;
        true
    }

    /// Occupy every slot. Intended for tests and admin tooling.
    pub fn saturate(&mut self) {
        self.current_usage = self.max_concurrent_tasks;
    }
}

/// Historical task counters for an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub successful_tasks: u32,
    pub total_tasks: u32,
}

impl TaskStats {
    pub fn record(&mut self, success: bool) {
        self.total_tasks += 1;
        if success {
            self.successful_tasks += 1;
        }
    }

    pub fn has_history(&self) -> bool {
        self.total_tasks > 0
    }

    /// `successful / max(total, 1)`, or `None` without history.
    pub fn success_ratio(&self) -> Option<f64> {
        if self.total_tasks == 0 {
            None
        } else {
            Some(self.successful_tasks as f64 / self.total_tasks as f64)
        }
    }
}
