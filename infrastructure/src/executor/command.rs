//! Process-backed task executor.
//!
//! Each task spawns the configured command once. The task is written to the
//! child's stdin as a single JSON object and the child's stdout, trimmed,
//! becomes the task result. A non-zero exit status is a failure carrying the
//! child's stderr.

use crate::config::FileExecutorConfig;
use async_trait::async_trait;
use council_application::{AgentTaskExecutor, ExecutorError};
use council_domain::{Agent, Task};
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_EXCERPT: usize = 2000;

/// JSON document written to the child's stdin.
#[derive(Serialize)]
struct TaskEnvelope<'a> {
    agent: AgentSummary<'a>,
    task: &'a Task,
}

#[derive(Serialize)]
struct AgentSummary<'a> {
    id: &'a str,
    domain: &'a str,
    expertise: Vec<&'a str>,
}

/// Runs agent tasks by spawning an external command.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &FileExecutorConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn envelope(agent: &Agent, task: &Task) -> Result<String, ExecutorError> {
        let envelope = TaskEnvelope {
            agent: AgentSummary {
                id: agent.id.as_str(),
                domain: &agent.domain,
                expertise: agent.expertise.iter().map(String::as_str).collect(),
            },
            task,
        };
        serde_json::to_string(&envelope)
            .map_err(|e| ExecutorError::Failed(format!("could not encode task: {e}")))
    }

    async fn run(&self, agent: &Agent, task: &Task, input: String) -> Result<String, ExecutorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("COUNCIL_AGENT_ID", agent.id.as_str())
            .env("COUNCIL_TASK_ID", task.id.as_str())
            .env("COUNCIL_TASK_TYPE", &task.task_type)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutorError::Unavailable(format!("{}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that never reads stdin closes the pipe early; that is
            // not a failure on its own.
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!(task = %task.id, "stdin write failed: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecutorError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(MAX_STDERR_EXCERPT).collect();
            return Err(ExecutorError::Failed(format!(
                "{} exited with {}: {}",
                self.program, output.status, excerpt
            )));
        }

        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| ExecutorError::InvalidOutput(e.to_string()))
    }
}

impl From<&FileExecutorConfig> for CommandExecutor {
    fn from(config: &FileExecutorConfig) -> Self {
        Self::from_config(config)
    }
}

#[async_trait]
impl AgentTaskExecutor for CommandExecutor {
    async fn execute(&self, agent: &Agent, task: &Task) -> Result<String, ExecutorError> {
        let input = Self::envelope(agent, task)?;
        debug!(agent = %agent.id, task = %task.id, program = %self.program, "Spawning executor");

        // kill_on_drop reaps the child when the timeout drops the future
        match tokio::time::timeout(self.timeout, self.run(agent, task, input)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(agent = %agent.id, task = %task.id, "Executor timed out");
                Err(ExecutorError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
