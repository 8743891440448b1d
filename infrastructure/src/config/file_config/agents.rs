//! Static agent roster from TOML (`[[agents]]` array)

use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use council_domain::{Agent, PerformanceMetrics, Quota};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One roster entry
///
/// # Example
///
/// ```toml
/// [[agents]]
/// id = "algebra-1"
/// domain = "mathematics"
/// expertise = ["algebra", "equations"]
/// accuracy = 0.9
/// max_concurrent_tasks = 4   # optional, derived from accuracy otherwise
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAgentEntry {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Milliseconds
    #[serde(default = "default_response_time")]
    pub response_time: f64,
    /// 0 to 5
    #[serde(default = "default_user_feedback")]
    pub user_feedback: f64,
    #[serde(default = "default_neutral")]
    pub adaptability: f64,
    #[serde(default = "default_neutral")]
    pub collaboration_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_tasks: Option<u32>,
}

fn default_accuracy() -> f64 {
    PerformanceMetrics::default().accuracy
}

fn default_response_time() -> f64 {
    PerformanceMetrics::default().response_time
}

fn default_user_feedback() -> f64 {
    PerformanceMetrics::default().user_feedback
}

fn default_neutral() -> f64 {
    0.5
}

impl FileAgentEntry {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            expertise: Vec::new(),
            accuracy: default_accuracy(),
            response_time: default_response_time(),
            user_feedback: default_user_feedback(),
            adaptability: default_neutral(),
            collaboration_score: default_neutral(),
            max_concurrent_tasks: None,
        }
    }

    pub fn to_agent(&self) -> Agent {
        Agent::new(self.id.as_str(), self.domain.as_str())
            .with_expertise(self.expertise.iter().map(String::as_str))
            .with_performance(PerformanceMetrics {
                accuracy: self.accuracy,
                response_time: self.response_time,
                user_feedback: self.user_feedback,
            })
            .with_adaptability(self.adaptability)
            .with_collaboration_score(self.collaboration_score)
    }

    /// Explicit limit if configured, otherwise the accuracy-derived quota.
    pub fn quota(&self) -> Quota {
        match self.max_concurrent_tasks {
            Some(limit) => Quota::with_limit(limit),
            None => Quota::for_accuracy(self.accuracy),
        }
    }

    fn validate(&self, index: usize) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let out_of_range = |field: &str, value: f64, max: f64| {
            ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("agents[{index}].{field}"),
                },
                format!(
                    "agents[{index}] ({}): {field} must be between 0 and {max}, got {value}",
                    self.id
                ),
            )
        };

        if self.id.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("agents[{index}].id"),
                },
                format!("agents[{index}].id cannot be empty"),
            ));
        }
        for (field, value) in [
            ("accuracy", self.accuracy),
            ("adaptability", self.adaptability),
            ("collaboration_score", self.collaboration_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                issues.push(out_of_range(field, value, 1.0));
            }
        }
        if !(0.0..=5.0).contains(&self.user_feedback) {
            issues.push(out_of_range("user_feedback", self.user_feedback, 5.0));
        }
        if self.max_concurrent_tasks == Some(0) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: format!("agents[{index}].max_concurrent_tasks"),
                },
                format!(
                    "agents[{index}] ({}): max_concurrent_tasks is 0; it will be raised to 1",
                    self.id
                ),
            ));
        }
        issues
    }
}

/// Per-entry range checks plus duplicate-id detection.
pub fn validate_roster(entries: &[FileAgentEntry]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        issues.extend(entry.validate(index));
        if !seen.insert(entry.id.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateAgent {
                    id: entry.id.clone(),
                },
                format!("agents[{index}]: duplicate agent id '{}'", entry.id),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Roster {
        agents: Vec<FileAgentEntry>,
    }

    #[test]
    fn test_entry_defaults() {
        let roster: Roster = toml::from_str(
            r#"
[[agents]]
id = "algebra-1"
domain = "mathematics"
expertise = ["Algebra", "equations"]
accuracy = 0.9

[[agents]]
id = "physics-1"
domain = "physics"
max_concurrent_tasks = 2
"#,
        )
        .unwrap();

        assert_eq!(roster.agents.len(), 2);
        let algebra = roster.agents[0].to_agent();
        assert!(algebra.expertise.contains("algebra"));
        assert_eq!(algebra.performance.accuracy, 0.9);
        assert_eq!(algebra.adaptability, 0.5);

        assert_eq!(roster.agents[1].accuracy, 0.5);
        assert_eq!(roster.agents[1].quota().max_concurrent_tasks(), 2);
        assert!(validate_roster(&roster.agents).is_empty());
    }

    #[test]
    fn test_quota_from_accuracy() {
        let mut entry = FileAgentEntry::new("a", "math");
        entry.accuracy = 0.9;
        assert_eq!(
            entry.quota().max_concurrent_tasks(),
            Quota::for_accuracy(0.9).max_concurrent_tasks()
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let entries = vec![
            FileAgentEntry::new("a", "math"),
            FileAgentEntry::new("b", "physics"),
            FileAgentEntry::new("a", "chemistry"),
        ];
        let issues = validate_roster(&entries);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].code,
            ConfigIssueCode::DuplicateAgent {
                id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range_metrics() {
        let mut entry = FileAgentEntry::new("a", "math");
        entry.accuracy = 1.5;
        entry.user_feedback = 7.0;
        let issues = validate_roster(&[entry]);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ConfigIssue::is_error));
    }
}
