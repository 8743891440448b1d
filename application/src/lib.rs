//! Application layer for agent-council
//!
//! This crate contains the use cases, the shared registries and the port
//! definitions. It depends only on the domain layer.

pub mod config;
pub mod events;
pub mod history;
pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConsensusConfig, CouncilConfig, DeliberationParams, HistoryParams};
pub use events::EventBus;
pub use history::VoteHistoryStore;
pub use ports::{
    agent_executor::{AgentTaskExecutor, ExecutorError},
    decision_sink::{DecisionSink, NoDecisionSink},
    progress::{DeliberationProgress, NoProgress},
    vote_source::{ExecutorVoteSource, VoteRequest, VoteSource, VoteSourceError},
};
pub use registry::{Admission, AgentRegistry};
pub use use_cases::deliberate::{
    DeliberateInput, DeliberationError, DeliberationOrchestrator, DeliberationOutcome,
};
pub use use_cases::form_council::{FormCouncilUseCase, FormedCouncil};
pub use use_cases::scheduler::{ScheduleOutcome, SchedulerError, TaskScheduler};
pub use use_cases::voting::{RoundCollection, RoundVotes, VotingService};
