//! Council formation settings from TOML (`[council]` section)

use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use council_domain::council::DEFAULT_COUNCIL_CACHE_CAPACITY;
use council_domain::{CouncilBounds, FormationConfig, FormationWeights};
use serde::{Deserialize, Serialize};

/// Raw council configuration from TOML
///
/// # Example
///
/// ```toml
/// [council]
/// min_agents = 3
/// max_agents = 7
/// cache_capacity = 10
///
/// [council.weights]
/// diversity = 0.4
/// performance = 0.4
/// availability = 0.2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub min_agents: usize,
    pub max_agents: usize,
    /// Number of formed councils kept for reuse
    pub cache_capacity: usize,
    pub weights: FileFormationWeights,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let bounds = CouncilBounds::default();
        Self {
            min_agents: bounds.min_agents,
            max_agents: bounds.max_agents,
            cache_capacity: DEFAULT_COUNCIL_CACHE_CAPACITY,
            weights: FileFormationWeights::default(),
        }
    }
}

/// `[council.weights]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFormationWeights {
    pub diversity: f64,
    pub performance: f64,
    pub availability: f64,
}

impl Default for FileFormationWeights {
    fn default() -> Self {
        let weights = FormationWeights::default();
        Self {
            diversity: weights.diversity,
            performance: weights.performance,
            availability: weights.availability,
        }
    }
}

impl FileCouncilConfig {
    pub fn to_formation_config(&self) -> FormationConfig {
        FormationConfig {
            bounds: CouncilBounds::new(self.min_agents, self.max_agents),
            weights: FormationWeights {
                diversity: self.weights.diversity,
                performance: self.weights.performance,
                availability: self.weights.availability,
            },
        }
    }

    /// Bounds checks that the domain type would otherwise silently repair.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.min_agents == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidCouncilBounds,
                "council.min_agents must be at least 1",
            ));
        }
        if self.min_agents > self.max_agents {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidCouncilBounds,
                format!(
                    "council.min_agents ({}) is larger than council.max_agents ({})",
                    self.min_agents, self.max_agents
                ),
            ));
        }

        let weights = [
            ("council.weights.diversity", self.weights.diversity),
            ("council.weights.performance", self.weights.performance),
            ("council.weights.availability", self.weights.availability),
        ];
        for (field, value) in weights {
            if value < 0.0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                    },
                    format!("{field} cannot be negative, got {value}"),
                ));
            }
        }

        issues
    }
}
