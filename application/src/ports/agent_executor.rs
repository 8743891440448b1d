//! Agent task executor port
//!
//! Defines the interface to whatever actually performs an agent's work
//! (model inference, a subprocess, a remote service).

use async_trait::async_trait;
use council_domain::{Agent, Task};
use thiserror::Error;

/// Errors that can occur while executing a task
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("Execution timed out after {0} seconds")]
    Timeout(u64),

    #[error("Executor unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

/// Executes one task on behalf of one agent.
///
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait AgentTaskExecutor: Send + Sync {
    /// Run the task and return its textual result.
    async fn execute(&self, agent: &Agent, task: &Task) -> Result<String, ExecutorError>;
}
