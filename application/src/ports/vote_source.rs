//! Vote source port
//!
//! A [`VoteSource`] asks one agent for its vote on a topic. The default
//! adapter, [`ExecutorVoteSource`], turns any [`AgentTaskExecutor`] into a
//! vote source by submitting a `vote` task and parsing the output.

use crate::ports::agent_executor::{AgentTaskExecutor, ExecutorError};
use async_trait::async_trait;
use council_domain::quorum::parse_vote_output;
use council_domain::{Agent, DeliberationContext, Task, TaskId, TaskPriority, Vote};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Confidence assumed when an agent's answer carries none.
const DEFAULT_VOTE_CONFIDENCE: f64 = 0.5;

/// Task type used for vote requests.
pub const VOTE_TASK_TYPE: &str = "vote";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoteSourceError {
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Agent {0} returned an empty vote")]
    EmptyVote(String),

    #[error("Vote source panicked for agent {0}")]
    Panicked(String),
}

/// What an agent is asked to vote on.
#[derive(Debug, Clone, Serialize)]
pub struct VoteRequest {
    pub topic: String,
    pub context: DeliberationContext,
    /// 1-based round number
    pub round: usize,
    /// Votes from the previous round, empty in round one
    pub previous: Vec<Vote>,
}

impl VoteRequest {
    pub fn new(topic: impl Into<String>, context: DeliberationContext, round: usize) -> Self {
        Self {
            topic: topic.into(),
            context,
            round,
            previous: Vec::new(),
        }
    }

    pub fn with_previous(mut self, previous: Vec<Vote>) -> Self {
        self.previous = previous;
        self
    }
}

/// Produces one agent's vote.
#[async_trait]
pub trait VoteSource: Send + Sync {
    async fn cast_vote(&self, agent: &Agent, request: &VoteRequest) -> Result<Vote, VoteSourceError>;
}

/// Adapts an [`AgentTaskExecutor`] into a [`VoteSource`].
pub struct ExecutorVoteSource {
    executor: Arc<dyn AgentTaskExecutor>,
}

impl ExecutorVoteSource {
    pub fn new(executor: Arc<dyn AgentTaskExecutor>) -> Self {
        Self { executor }
    }

    fn vote_task(agent: &Agent, request: &VoteRequest) -> Task {
        let content = serde_json::to_string(request).unwrap_or_else(|_| request.topic.clone());
        Task::new(
            TaskId::new(format!("vote-{}-r{}", agent.id, request.round)),
            agent.id.clone(),
            VOTE_TASK_TYPE,
            content,
            TaskPriority::High,
            0,
        )
    }
}

#[async_trait]
impl VoteSource for ExecutorVoteSource {
    async fn cast_vote(&self, agent: &Agent, request: &VoteRequest) -> Result<Vote, VoteSourceError> {
        let task = Self::vote_task(agent, request);
        let output = self.executor.execute(agent, &task).await?;

        let vote = parse_vote_output(agent.id.clone(), &output, DEFAULT_VOTE_CONFIDENCE);
        if vote.suggestion.is_empty() {
            return Err(VoteSourceError::EmptyVote(agent.id.to_string()));
        }
        Ok(vote)
    }
}
