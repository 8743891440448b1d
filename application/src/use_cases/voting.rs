//! Voting service
//!
//! Fans a vote request out to every council member in parallel and waits
//! for all of them before returning (a barrier: a round is never evaluated
//! on a partial batch). A member whose vote fails, or whose vote source
//! panics, abstains for the round.

use crate::events::EventBus;
use crate::ports::progress::DeliberationProgress;
use crate::ports::vote_source::{VoteRequest, VoteSource, VoteSourceError};
use council_domain::{AgentId, Council, CouncilEvent, Vote};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Votes gathered in one complete round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundVotes {
    /// In council member order
    pub votes: Vec<Vote>,
    pub abstained: Vec<AgentId>,
}

/// How a round's collection ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundCollection {
    Complete(RoundVotes),
    /// The round overran its budget; outstanding requests were aborted
    TimedOut,
    Cancelled,
}

pub struct VotingService {
    source: Arc<dyn VoteSource>,
    events: EventBus,
}

impl VotingService {
    pub fn new(source: Arc<dyn VoteSource>, events: EventBus) -> Self {
        Self { source, events }
    }

    /// Collect one vote per council member.
    pub async fn collect_votes(
        &self,
        council: &Council,
        request: &VoteRequest,
        progress: &dyn DeliberationProgress,
        round_timeout: Duration,
        cancellation: Option<&CancellationToken>,
    ) -> RoundCollection {
        let mut join_set = JoinSet::new();

        for (index, agent) in council.agents.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let agent = agent.clone();
            let request = request.clone();

            self.events.publish(CouncilEvent::MessageSent {
                agent_id: agent.id.clone(),
                topic: request.topic.clone(),
                round: request.round,
            });

            join_set.spawn(async move {
                let result = AssertUnwindSafe(source.cast_vote(&agent, &request))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(VoteSourceError::Panicked(agent.id.to_string())));
                (index, agent.id, result)
            });
        }

        let barrier = async {
            let mut slots: Vec<Option<Vote>> = vec![None; council.agents.len()];
            let mut abstained = Vec::new();

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((index, agent_id, Ok(mut vote))) => {
                        debug!(agent = %agent_id, suggestion = %vote.suggestion, "Vote received");
                        progress.on_vote(&agent_id, true);
                        self.events.publish(CouncilEvent::MessageDelivered {
                            agent_id: agent_id.clone(),
                            topic: request.topic.clone(),
                            round: request.round,
                        });
                        vote.agent_id = agent_id;
                        slots[index] = Some(vote);
                    }
                    Ok((_, agent_id, Err(e))) => {
                        warn!(agent = %agent_id, error = %e, "Vote failed, agent abstains");
                        progress.on_vote(&agent_id, false);
                        abstained.push(agent_id);
                    }
                    Err(e) => {
                        warn!("Vote task join error: {}", e);
                    }
                }
            }

            RoundVotes {
                votes: slots.into_iter().flatten().collect(),
                abstained,
            }
        };

        let timed = tokio::time::timeout(round_timeout, barrier);
        let outcome = match cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return RoundCollection::Cancelled,
                    outcome = timed => outcome,
                }
            }
            None => timed.await,
        };

        match outcome {
            Ok(votes) => RoundCollection::Complete(votes),
            Err(_) => RoundCollection::TimedOut,
        }
    }
}
