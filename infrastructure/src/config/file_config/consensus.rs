//! Consensus settings from TOML (`[consensus]` section)

use council_application::ConsensusConfig;
use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use council_domain::quorum::DEFAULT_CONSENSUS_THRESHOLD;
use council_domain::quorum::outlier::DEFAULT_SIGMA;
use council_domain::{ComplexityOverride, OutlierStrategy, ThresholdPolicy, WeightStrategy};
use serde::{Deserialize, Serialize};

/// Raw consensus configuration from TOML
///
/// # Example
///
/// ```toml
/// [consensus]
/// threshold = 0.8
/// weight_strategy = "auto"          # "auto", "heuristic", "confidence"
/// outlier_strategy = "statistical"  # "statistical" or "fixed"
/// sigma = 2.0
///
/// [consensus.complexity_override]
/// high = 0.7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    pub threshold: f64,
    pub weight_strategy: String,
    pub outlier_strategy: String,
    pub sigma: f64,
    pub complexity_override: ComplexityOverride,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONSENSUS_THRESHOLD,
            weight_strategy: "auto".to_string(),
            outlier_strategy: OutlierStrategy::default().as_str().to_string(),
            sigma: DEFAULT_SIGMA,
            complexity_override: ComplexityOverride::default(),
        }
    }
}

impl FileConsensusConfig {
    /// Parse weight_strategy, falling back to `auto` with a warning.
    ///
    /// Accepts: "auto", "heuristic", "expertise", "confidence"
    pub fn parse_weight_strategy(&self) -> (WeightStrategy, Vec<ConfigIssue>) {
        match self.weight_strategy.parse::<WeightStrategy>() {
            Ok(strategy) => (strategy, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "consensus.weight_strategy".to_string(),
                        value: self.weight_strategy.clone(),
                        valid_values: vec![
                            "auto".to_string(),
                            "heuristic".to_string(),
                            "confidence".to_string(),
                        ],
                    },
                    format!(
                        "consensus.weight_strategy: unknown value '{}', falling back to 'auto'",
                        self.weight_strategy
                    ),
                );
                (WeightStrategy::default(), vec![issue])
            }
        }
    }

    /// Parse outlier_strategy, falling back to `statistical` with a warning.
    pub fn parse_outlier_strategy(&self) -> (OutlierStrategy, Vec<ConfigIssue>) {
        match self.outlier_strategy.parse::<OutlierStrategy>() {
            Ok(strategy) => (strategy, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "consensus.outlier_strategy".to_string(),
                        value: self.outlier_strategy.clone(),
                        valid_values: vec!["statistical".to_string(), "fixed".to_string()],
                    },
                    format!(
                        "consensus.outlier_strategy: unknown value '{}', falling back to 'statistical'",
                        self.outlier_strategy
                    ),
                );
                (OutlierStrategy::default(), vec![issue])
            }
        }
    }

    pub fn to_consensus_config(&self) -> ConsensusConfig {
        ConsensusConfig {
            policy: ThresholdPolicy::fixed(self.threshold).with_override(self.complexity_override),
            weight_strategy: self.parse_weight_strategy().0,
            outlier_strategy: self.parse_outlier_strategy().0,
            sigma: self.sigma,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.parse_weight_strategy().1);
        issues.extend(self.parse_outlier_strategy().1);

        if self.sigma.is_nan() || self.sigma <= 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "consensus.sigma".to_string(),
                },
                format!("consensus.sigma must be positive, got {}", self.sigma),
            ));
        }

        let o = &self.complexity_override;
        let overrides = [
            ("consensus.complexity_override.low", o.low),
            ("consensus.complexity_override.medium", o.medium),
            ("consensus.complexity_override.high", o.high),
        ];
        for (field, value) in overrides {
            if let Some(v) = value
                && !(0.0..=1.0).contains(&v)
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                    },
                    format!("{field} must be between 0 and 1, got {v}"),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::ComplexityLevel;

    #[test]
    fn test_default_round_trips_to_application_default() {
        let config = FileConsensusConfig::default();
        assert_eq!(config.to_consensus_config(), ConsensusConfig::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_heuristic_alias() {
        let config = FileConsensusConfig {
            weight_strategy: "heuristic".to_string(),
            ..Default::default()
        };
        let (strategy, issues) = config.parse_weight_strategy();
        assert_eq!(strategy, WeightStrategy::Expertise);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_strategies_fall_back_with_warnings() {
        let config = FileConsensusConfig {
            weight_strategy: "loudest".to_string(),
            outlier_strategy: "vibes".to_string(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| !i.is_error()));

        let consensus = config.to_consensus_config();
        assert_eq!(consensus.weight_strategy, WeightStrategy::Auto);
        assert_eq!(consensus.outlier_strategy, OutlierStrategy::Statistical);
    }

    #[test]
    fn test_complexity_override_parsed() {
        let config: FileConsensusConfig = toml::from_str(
            r#"
threshold = 0.75

[complexity_override]
high = 0.6
"#,
        )
        .unwrap();

        let policy = config.to_consensus_config().policy;
        assert_eq!(policy.threshold_for(ComplexityLevel::Expert), 0.6);
        assert_eq!(policy.threshold_for(ComplexityLevel::Simple), 0.75);
    }

    #[test]
    fn test_override_out_of_range() {
        let mut config = FileConsensusConfig::default();
        config.complexity_override.low = Some(1.2);
        config.sigma = 0.0;

        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ConfigIssue::is_error));
    }
}
