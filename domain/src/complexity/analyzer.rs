//! Keyword-driven query classification.
//!
//! The analyzer is pure: the same query always yields the same profile for
//! a given set of keyword tables and council bounds.

use super::profile::{ComplexityLevel, ComplexityProfile, GENERAL_DOMAIN};
use crate::core::string::tokenize;
use crate::council::formation::CouncilBounds;
use std::collections::BTreeSet;

/// Whole-token keywords for each complexity bucket, simple → expert.
const LEVEL_KEYWORDS: [(ComplexityLevel, &[&str]); 4] = [
    (
        ComplexityLevel::Simple,
        &["what", "who", "when", "define", "list", "name", "basic", "simple"],
    ),
    (
        ComplexityLevel::Moderate,
        &["explain", "how", "why", "describe", "compare", "summarize", "solve", "example"],
    ),
    (
        ComplexityLevel::Complex,
        &["analyze", "design", "evaluate", "implement", "integrate", "prove", "debug", "critique"],
    ),
    (
        ComplexityLevel::Expert,
        &["optimize", "architect", "derive", "formalize", "research", "scalable", "distributed", "benchmark"],
    ),
];

/// Domain → substring keywords.
const DOMAIN_KEYWORDS: [(&str, &[&str]); 4] = [
    (
        "mathematics",
        &["math", "algebra", "calculus", "equation", "geometry", "integral", "derivative", "probability", "statistic"],
    ),
    (
        "science",
        &["science", "physics", "chemistry", "biology", "experiment", "molecule", "energy", "cell"],
    ),
    (
        "programming",
        &["code", "program", "algorithm", "function", "software", "caching", "database", "compile"],
    ),
    (
        "language",
        &["grammar", "essay", "vocabulary", "writing", "translate", "literature", "language", "poem"],
    ),
];

/// Classifies free-text queries into a [`ComplexityProfile`].
#[derive(Debug, Clone, Copy)]
pub struct QueryComplexityAnalyzer {
    bounds: CouncilBounds,
}

impl QueryComplexityAnalyzer {
    pub fn new(bounds: CouncilBounds) -> Self {
        Self { bounds }
    }

    pub fn analyze(&self, query: &str) -> ComplexityProfile {
        let tokens = tokenize(query);
        let level = Self::classify_level(&tokens);
        let (domains, required_expertise) = Self::extract_domains(query);
        let estimated_agent_count = self.estimate_agent_count(domains.len());

        ComplexityProfile {
            level,
            domains,
            required_expertise,
            estimated_agent_count,
        }
    }

    /// Score each bucket and pick the winner. A later bucket only replaces
    /// the current leader on a strictly higher score, so ties go to the
    /// simpler level and a query with no matches is `Simple`.
    fn classify_level(tokens: &[String]) -> ComplexityLevel {
        let mut best = ComplexityLevel::Simple;
        let mut best_score = 0u32;

        for (level, keywords) in LEVEL_KEYWORDS.iter() {
            let matches = tokens
                .iter()
                .filter(|t| keywords.contains(&t.as_str()))
                .count() as u32;
            let score = matches * level.keyword_weight();
            if score > best_score {
                best = *level;
                best_score = score;
            }
        }

        best
    }

    /// Domains by substring match; matched keywords become the required
    /// expertise list.
    fn extract_domains(query: &str) -> (BTreeSet<String>, BTreeSet<String>) {
        let lowered = query.to_lowercase();
        let mut domains = BTreeSet::new();
        let mut expertise = BTreeSet::new();

        for (domain, keywords) in DOMAIN_KEYWORDS.iter() {
            for keyword in keywords.iter() {
                if lowered.contains(keyword) {
                    domains.insert(domain.to_string());
                    expertise.insert(keyword.to_string());
                }
            }
        }

        if domains.is_empty() {
            domains.insert(GENERAL_DOMAIN.to_string());
        }

        (domains, expertise)
    }

    fn estimate_agent_count(&self, domain_count: usize) -> usize {
        let estimate = self.bounds.min_agents + domain_count.saturating_sub(1);
        self.bounds.clamp(estimate)
    }
}

impl Default for QueryComplexityAnalyzer {
    fn default() -> Self {
        Self::new(CouncilBounds::default())
    }
}
