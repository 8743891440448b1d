//! Agent registry: roster, status and quota bookkeeping.
//!
//! The registry is the single owner of the mutable per-agent state shared by
//! council formation, deliberation and the task scheduler. Quota and status
//! changes for an agent happen under one lock so the invariant
//! `0 <= current_usage <= max_concurrent_tasks` holds at every observable
//! point.

use crate::events::EventBus;
use council_domain::{Agent, AgentId, AgentStatus, CouncilEvent, Quota, TaskStats};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Success rate assigned to a newly registered agent.
pub const INITIAL_SUCCESS_RATE: f64 = 0.5;
/// EMA decay applied to the success rate on each completed task.
const SUCCESS_RATE_DECAY: f64 = 0.9;
const SUCCESS_RATE_GAIN: f64 = 0.1;

/// Result of asking for a task slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// A slot was taken; carries a snapshot of the agent, now busy
    Admitted(Agent),
    AtCapacity,
    NotFound,
}

struct AgentEntry {
    agent: Agent,
    quota: Quota,
    success_rate: f64,
    stats: TaskStats,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<AgentId, AgentEntry>,
    /// Registration order
    order: Vec<AgentId>,
}

pub struct AgentRegistry {
    state: Mutex<RegistryState>,
    events: EventBus,
}

impl AgentRegistry {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an agent with a quota derived from its accuracy.
    ///
    /// Returns `false` if the id is already registered; the roster is left
    /// unchanged in that case.
    pub fn register_agent(&self, agent: Agent) -> bool {
        let quota = Quota::for_accuracy(agent.performance.accuracy);
        self.register_agent_with_quota(agent, quota)
    }

    /// Register an agent with an explicit quota.
    pub fn register_agent_with_quota(&self, mut agent: Agent, quota: Quota) -> bool {
        let id = agent.id.clone();
        {
            let mut state = self.lock();
            if state.entries.contains_key(&id) {
                warn!(agent = %id, "Agent already registered, ignoring");
                return false;
            }
            agent.status = AgentStatus::Idle;
            state.order.push(id.clone());
            state.entries.insert(
                id.clone(),
                AgentEntry {
                    agent,
                    quota,
                    success_rate: INITIAL_SUCCESS_RATE,
                    stats: TaskStats::default(),
                },
            );
        }

        info!(
            agent = %id,
            max_concurrent_tasks = quota.max_concurrent_tasks(),
            "Agent registered"
        );
        self.events.publish(CouncilEvent::AgentRegistered {
            agent_id: id,
            max_concurrent_tasks: quota.max_concurrent_tasks(),
        });
        true
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<Agent> {
        self.lock().entries.get(id).map(|e| e.agent.clone())
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.lock().entries.contains_key(id)
    }

    /// All agents in registration order.
    pub fn agents(&self) -> Vec<Agent> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id))
            .map(|e| e.agent.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `false` for an unknown agent.
    pub fn set_agent_status(&self, id: &AgentId, status: AgentStatus) -> bool {
        match self.lock().entries.get_mut(id) {
            Some(entry) => {
                debug!(agent = %id, from = %entry.agent.status, to = %status, "Agent status set");
                entry.agent.status = status;
                true
            }
            None => false,
        }
    }

    /// Set `status` only if the agent is currently in `expected`.
    pub fn compare_and_set_status(
        &self,
        id: &AgentId,
        expected: AgentStatus,
        status: AgentStatus,
    ) -> bool {
        match self.lock().entries.get_mut(id) {
            Some(entry) if entry.agent.status == expected => {
                entry.agent.status = status;
                true
            }
            _ => false,
        }
    }

    pub fn quota(&self, id: &AgentId) -> Option<Quota> {
        self.lock().entries.get(id).map(|e| e.quota)
    }

    pub fn success_rate(&self, id: &AgentId) -> Option<f64> {
        self.lock().entries.get(id).map(|e| e.success_rate)
    }

    pub fn task_stats(&self, id: &AgentId) -> Option<TaskStats> {
        self.lock().entries.get(id).map(|e| e.stats)
    }

    /// Task counters for every agent, as consumed by council formation.
    pub fn task_history(&self) -> HashMap<AgentId, TaskStats> {
        self.lock()
            .entries
            .iter()
            .map(|(id, e)| (id.clone(), e.stats))
            .collect()
    }

    /// Take one task slot and mark the agent busy.
    ///
    /// At capacity nothing is mutated.
    pub fn try_acquire(&self, id: &AgentId) -> Admission {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(id) else {
            return Admission::NotFound;
        };
        if !entry.quota.try_acquire() {
            return Admission::AtCapacity;
        }
        entry.agent.status = AgentStatus::Busy;
        Admission::Admitted(entry.agent.clone())
    }

    /// Return a task slot and fold the outcome into the agent's metrics.
    ///
    /// The agent goes back to idle once no slot is held, unless an operator
    /// moved it elsewhere (e.g. `error`) in the meantime. Returns `false` if
    /// the agent is unknown or held no slot.
    pub fn release(&self, id: &AgentId, success: bool) -> bool {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(id) else {
            return false;
        };
        if !entry.quota.release() {
            warn!(agent = %id, "Quota release without a held slot");
            return false;
        }

        entry.success_rate = entry.success_rate * SUCCESS_RATE_DECAY
            + if success { SUCCESS_RATE_GAIN } else { 0.0 };
        entry.stats.record(success);

        if entry.quota.current_usage() == 0 && entry.agent.status == AgentStatus::Busy {
            entry.agent.status = AgentStatus::Idle;
        }
        debug!(
            agent = %id,
            success,
            success_rate = entry.success_rate,
            usage = entry.quota.current_usage(),
            "Quota released"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(EventBus::new(16))
    }

    #[test]
    fn test_register_derives_quota_and_idles() {
        let registry = registry();
        let agent = Agent::new("math", "mathematics")
            .with_accuracy(1.0)
            .with_status(AgentStatus::Busy);
        assert!(registry.register_agent(agent));

        let id = AgentId::new("math");
        let quota = registry.quota(&id).unwrap();
        assert_eq!(quota.max_concurrent_tasks(), 3);
        assert_eq!(quota.current_usage(), 0);
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Idle);
        assert_eq!(registry.success_rate(&id), Some(INITIAL_SUCCESS_RATE));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let registry = registry();
        assert!(registry.register_agent(Agent::new("a", "science")));
        assert!(!registry.register_agent(Agent::new("a", "language")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_agent(&AgentId::new("a")).unwrap().domain, "science");
    }

    #[tokio::test]
    async fn test_register_emits_event() {
        let registry = registry();
        let mut rx = registry.events.subscribe();
        registry.register_agent(Agent::new("a", "science"));
        assert_eq!(rx.recv().await.unwrap().name(), "agent:registered");
    }

    #[test]
    fn test_unknown_agent_lookups() {
        let registry = registry();
        let id = AgentId::new("ghost");
        assert!(registry.get_agent(&id).is_none());
        assert!(!registry.set_agent_status(&id, AgentStatus::Busy));
        assert_eq!(registry.try_acquire(&id), Admission::NotFound);
        assert!(!registry.release(&id, true));
    }

    #[test]
    fn test_acquire_release_cycle() {
        let registry = registry();
        registry.register_agent_with_quota(Agent::new("a", "science"), Quota::with_limit(1));
        let id = AgentId::new("a");

        assert!(matches!(registry.try_acquire(&id), Admission::Admitted(_)));
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Busy);
        assert_eq!(registry.try_acquire(&id), Admission::AtCapacity);
        assert_eq!(registry.quota(&id).unwrap().current_usage(), 1);

        assert!(registry.release(&id, true));
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Idle);
        assert!((registry.success_rate(&id).unwrap() - 0.55).abs() < 1e-9);
        assert_eq!(registry.task_stats(&id).unwrap().total_tasks, 1);
        assert!(!registry.release(&id, true));
    }

    #[test]
    fn test_stays_busy_while_slots_held() {
        let registry = registry();
        registry.register_agent_with_quota(Agent::new("a", "science"), Quota::with_limit(2));
        let id = AgentId::new("a");

        registry.try_acquire(&id);
        registry.try_acquire(&id);
        registry.release(&id, false);
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Busy);
        assert!((registry.success_rate(&id).unwrap() - 0.45).abs() < 1e-9);
        registry.release(&id, true);
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Idle);
    }

    #[test]
    fn test_compare_and_set() {
        let registry = registry();
        registry.register_agent(Agent::new("a", "science"));
        let id = AgentId::new("a");

        assert!(registry.compare_and_set_status(&id, AgentStatus::Idle, AgentStatus::Active));
        assert!(!registry.compare_and_set_status(&id, AgentStatus::Idle, AgentStatus::Busy));
        assert_eq!(registry.get_agent(&id).unwrap().status, AgentStatus::Active);
    }

    #[test]
    fn test_agents_in_registration_order() {
        let registry = registry();
        for id in ["c", "a", "b"] {
            registry.register_agent(Agent::new(id, "general"));
        }
        let ids: Vec<String> = registry
            .agents()
            .iter()
            .map(|a| a.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
