//! Bounded in-memory log of decisions.
//!
//! Decisions are appended and never mutated. Once capacity is reached the
//! oldest decision is dropped. Topic lookups compare trimmed, lowercased
//! topics.

use council_domain::{AgentId, Council, Decision, Vote};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct VoteHistoryStore {
    decisions: Mutex<VecDeque<Decision>>,
    capacity: usize,
}

impl VoteHistoryStore {
    /// `capacity` of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            decisions: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Decision>> {
        self.decisions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append(&self, decision: Decision) {
        let mut decisions = self.lock();
        if decisions.len() == self.capacity
            && let Some(dropped) = decisions.pop_front()
        {
            debug!(topic = %dropped.topic, "History full, dropping oldest decision");
        }
        decisions.push_back(decision);
    }

    /// Build a decision from a finished round and append it.
    pub fn record_votes(
        &self,
        topic: &str,
        votes: Vec<Vote>,
        consensus: &str,
        confidence: f64,
    ) -> Decision {
        let decision = Decision::new(topic, votes, consensus, confidence);
        self.append(decision.clone());
        decision
    }

    /// Decisions on `topic`, oldest first.
    pub fn get_vote_history(&self, topic: &str) -> Vec<Decision> {
        let key = Council::topic_key(topic);
        self.lock()
            .iter()
            .filter(|d| Council::topic_key(&d.topic) == key)
            .cloned()
            .collect()
    }

    /// The `n` most recent decisions, newest first.
    pub fn recent(&self, n: usize) -> Vec<Decision> {
        self.lock().iter().rev().take(n).cloned().collect()
    }

    /// Fraction of decided rounds on `topic` where the agent backed the
    /// consensus. `None` when the agent never voted on a decided round.
    pub fn topic_accuracy(&self, agent_id: &AgentId, topic: &str) -> Option<f64> {
        let key = Council::topic_key(topic);
        let decisions = self.lock();

        let (agreed, voted) = decisions
            .iter()
            .filter(|d| !d.consensus.is_empty() && Council::topic_key(&d.topic) == key)
            .filter_map(|d| d.suggestion_of(agent_id).map(|s| s == d.consensus))
            .fold((0u32, 0u32), |(agreed, voted), hit| {
                (agreed + u32::from(hit), voted + 1)
            });

        (voted > 0).then(|| f64::from(agreed) / f64::from(voted))
    }
}

impl Default for VoteHistoryStore {
    fn default() -> Self {
        Self::new(crate::config::deliberation_params::DEFAULT_HISTORY_CAPACITY)
    }
}
