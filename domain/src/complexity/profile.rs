//! Complexity profile value objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Domain used when a query matches none of the known domain keywords.
pub const GENERAL_DOMAIN: &str = "general";

/// How demanding a query is, ordered from least to most demanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    #[default]
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl ComplexityLevel {
    /// All levels in evaluation order (simple → expert).
    pub const ALL: [ComplexityLevel; 4] = [
        ComplexityLevel::Simple,
        ComplexityLevel::Moderate,
        ComplexityLevel::Complex,
        ComplexityLevel::Expert,
    ];

    /// Score contributed by each matched keyword of this level.
    pub fn keyword_weight(&self) -> u32 {
        match self {
            ComplexityLevel::Simple => 1,
            ComplexityLevel::Moderate => 2,
            ComplexityLevel::Complex => 3,
            ComplexityLevel::Expert => 4,
        }
    }

    /// Threshold band used by consensus complexity overrides.
    pub fn band(&self) -> ComplexityBand {
        match self {
            ComplexityLevel::Simple => ComplexityBand::Low,
            ComplexityLevel::Moderate => ComplexityBand::Medium,
            ComplexityLevel::Complex | ComplexityLevel::Expert => ComplexityBand::High,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::Expert => "expert",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse grouping of complexity levels (`low | medium | high`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityBand {
    Low,
    Medium,
    High,
}

/// Classification of a query used to size and target council formation.
///
/// Created once per query and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityProfile {
    pub level: ComplexityLevel,
    pub domains: BTreeSet<String>,
    pub required_expertise: BTreeSet<String>,
    pub estimated_agent_count: usize,
}

impl ComplexityProfile {
    /// Whether the only domain is the catch-all "general" domain.
    pub fn is_general(&self) -> bool {
        self.domains.len() == 1 && self.domains.contains(GENERAL_DOMAIN)
    }
}
