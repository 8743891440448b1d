//! Roster bootstrap: loads the `[[agents]]` entries into an [`AgentRegistry`].

use crate::config::FileAgentEntry;
use council_application::AgentRegistry;
use tracing::{info, warn};

/// Register every roster entry, skipping duplicates.
///
/// Returns the number of agents actually registered.
pub fn bootstrap_roster(registry: &AgentRegistry, entries: &[FileAgentEntry]) -> usize {
    let mut registered = 0;
    for entry in entries {
        if registry.register_agent_with_quota(entry.to_agent(), entry.quota()) {
            registered += 1;
        } else {
            warn!(agent = %entry.id, "Skipping duplicate roster entry");
        }
    }
    info!(registered, total = entries.len(), "Roster loaded");
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::EventBus;
    use council_domain::{AgentId, AgentStatus};

    #[test]
    fn test_bootstrap_registers_entries_in_order() {
        let registry = AgentRegistry::new(EventBus::default());
        let mut fast = FileAgentEntry::new("physics-1", "physics");
        fast.max_concurrent_tasks = Some(4);
        let entries = vec![FileAgentEntry::new("algebra-1", "mathematics"), fast];

        assert_eq!(bootstrap_roster(&registry, &entries), 2);

        let ids: Vec<_> = registry
            .agents()
            .into_iter()
            .map(|a| a.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["algebra-1", "physics-1"]);

        let quota = registry.quota(&AgentId::new("physics-1")).unwrap();
        assert_eq!(quota.max_concurrent_tasks(), 4);
        assert_eq!(quota.current_usage(), 0);
        assert_eq!(
            registry.get_agent(&AgentId::new("algebra-1")).unwrap().status,
            AgentStatus::Idle
        );
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let registry = AgentRegistry::new(EventBus::default());
        let entries = vec![
            FileAgentEntry::new("a", "math"),
            FileAgentEntry::new("a", "physics"),
        ];

        assert_eq!(bootstrap_roster(&registry, &entries), 1);
        assert_eq!(
            registry.get_agent(&AgentId::new("a")).unwrap().domain,
            "math"
        );
    }
}
