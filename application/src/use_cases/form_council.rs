//! Form Council use case
//!
//! Classifies a query, selects a team from the available agents and keeps
//! the resulting council in a bounded LRU cache. A query whose topic already
//! has an active cached council reuses it.

use crate::registry::AgentRegistry;
use council_domain::{
    Agent, ComplexityProfile, Council, CouncilCache, CouncilFormationService, CouncilId,
    CouncilStatus, DomainError, FormationConfig, QueryComplexityAnalyzer,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Output of the FormCouncil use case
#[derive(Debug, Clone)]
pub struct FormedCouncil {
    pub council: Council,
    pub reasoning: String,
    /// Profile of the query; for a reused council this is the new query's profile
    pub profile: ComplexityProfile,
    /// Whether a cached council was returned instead of forming a new one
    pub reused: bool,
}

/// Use case for forming (or reusing) a council
pub struct FormCouncilUseCase {
    analyzer: QueryComplexityAnalyzer,
    formation: CouncilFormationService,
    registry: Arc<AgentRegistry>,
    cache: Mutex<CouncilCache>,
    next_id: AtomicU64,
}

impl FormCouncilUseCase {
    pub fn new(registry: Arc<AgentRegistry>, config: FormationConfig, cache_capacity: usize) -> Self {
        Self {
            analyzer: QueryComplexityAnalyzer::new(config.bounds),
            formation: CouncilFormationService::new(config),
            registry,
            cache: Mutex::new(CouncilCache::new(cache_capacity)),
            next_id: AtomicU64::new(1),
        }
    }

    fn cache(&self) -> MutexGuard<'_, CouncilCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Form a council from the whole registered roster.
    pub fn execute(&self, query: &str) -> Result<FormedCouncil, DomainError> {
        let agents = self.registry.agents();
        self.form_council(query, &agents)
    }

    /// Form a council for `query` from `available`.
    pub fn form_council(&self, query: &str, available: &[Agent]) -> Result<FormedCouncil, DomainError> {
        let topic = query.trim();
        if topic.is_empty() {
            return Err(DomainError::InvalidQuery("query is empty".to_string()));
        }

        let profile = self.analyzer.analyze(topic);

        if let Some(council) = self.reuse(topic, available) {
            info!(council = %council.id, topic, "Reusing cached council");
            let reasoning = format!(
                "Reusing council {} formed for \"{}\" ({} members).",
                council.id,
                council.topic,
                council.size()
            );
            return Ok(FormedCouncil {
                council,
                reasoning,
                profile,
                reused: true,
            });
        }

        if available.is_empty() {
            return Err(DomainError::EmptyCouncil);
        }
        let bounds = self.formation.config().bounds;
        if available.len() < bounds.min_agents {
            warn!(
                available = available.len(),
                min_agents = bounds.min_agents,
                "Fewer agents than the minimum council size; forming a smaller council"
            );
        }

        let id = CouncilId::sequential(self.next_id.fetch_add(1, Ordering::Relaxed));
        let history = self.registry.task_history();
        let (council, reasoning) =
            self.formation
                .form_council(id, topic, &profile, available, &history)?;

        info!(
            council = %council.id,
            level = %profile.level,
            members = council.size(),
            "Council formed"
        );

        if let Some(evicted) = self.cache().insert(council.clone()) {
            debug!(council = %evicted.id, "Evicted least recently used council");
        }

        Ok(FormedCouncil {
            council,
            reasoning,
            profile,
            reused: false,
        })
    }

    /// A cached council is only reused when all of its members are still
    /// among `available`.
    fn reuse(&self, topic: &str, available: &[Agent]) -> Option<Council> {
        let mut cache = self.cache();
        let cached = cache.find_by_topic(topic)?;
        let covered = cached
            .agents
            .iter()
            .all(|member| available.iter().any(|agent| agent.id == member.id));
        if !covered {
            debug!(council = %cached.id, topic, "Cached council has unavailable members; forming anew");
            return None;
        }
        let id = cached.id.clone();
        cache.touch(&id).cloned()
    }

    /// Read a cached council without side effects.
    pub fn get_council(&self, id: &CouncilId) -> Option<Council> {
        self.cache().get(id).cloned()
    }

    /// Fetch a council for use, refreshing its recency.
    pub fn use_council(&self, id: &CouncilId) -> Option<Council> {
        self.cache().touch(id).cloned()
    }

    /// Mark a council inactive so its topic no longer reuses it.
    pub fn dissolve(&self, id: &CouncilId) -> bool {
        self.cache().set_status(id, CouncilStatus::Inactive)
    }

    /// Cached council ids, most recently used first.
    pub fn cached_ids(&self) -> Vec<CouncilId> {
        self.cache().ids_by_recency()
    }
}
