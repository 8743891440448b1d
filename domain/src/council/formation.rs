//! Council formation: candidate scoring and team selection.
//!
//! Each candidate is scored as
//!
//! ```text
//! score = diversity · expertise_relevance
//!       + performance · performance_score
//!       + availability · availability_score
//! ```
//!
//! Selection is two-phase. The coverage phase walks the profile's domains and
//! takes the best unselected agent matching each one. The fill phase tops the
//! team up to the target size by descending score, ignoring domain.

use super::entities::{Council, CouncilId};
use crate::agent::{Agent, AgentId, TaskStats};
use crate::complexity::ComplexityProfile;
use crate::core::error::DomainError;
use crate::core::string::contains_either;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Score added per matched profile domain.
const DOMAIN_MATCH_SCORE: f64 = 0.8;
/// Score added per matched required-expertise term.
const EXPERTISE_MATCH_SCORE: f64 = 0.6;
/// Performance score for agents with no task history.
const DEFAULT_PERFORMANCE_SCORE: f64 = 0.5;

/// Allowed council size range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilBounds {
    pub min_agents: usize,
    pub max_agents: usize,
}

impl CouncilBounds {
    /// Bounds with `max_agents` raised to `min_agents` if needed.
    pub fn new(min_agents: usize, max_agents: usize) -> Self {
        let min_agents = min_agents.max(1);
        Self {
            min_agents,
            max_agents: max_agents.max(min_agents),
        }
    }

    pub fn clamp(&self, n: usize) -> usize {
        n.clamp(self.min_agents, self.max_agents)
    }
}

impl Default for CouncilBounds {
    fn default() -> Self {
        Self {
            min_agents: 3,
            max_agents: 7,
        }
    }
}

/// Relative weights of the three scoring terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationWeights {
    pub diversity: f64,
    pub performance: f64,
    pub availability: f64,
}

impl FormationWeights {
    pub fn sum(&self) -> f64 {
        self.diversity + self.performance + self.availability
    }
}

impl Default for FormationWeights {
    fn default() -> Self {
        Self {
            diversity: 0.4,
            performance: 0.4,
            availability: 0.2,
        }
    }
}

/// Council formation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    pub bounds: CouncilBounds,
    pub weights: FormationWeights,
}

/// Score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub agent_id: AgentId,
    pub expertise_relevance: f64,
    pub performance_score: f64,
    pub availability_score: f64,
    pub total: f64,
}

/// Outcome of team selection, before a council id is attached.
#[derive(Debug, Clone)]
pub struct TeamSelection {
    pub members: Vec<Agent>,
    /// Domain → agent that covered it during the coverage phase
    pub coverage: Vec<(String, AgentId)>,
    pub scores: Vec<CandidateScore>,
    pub reasoning: String,
}

/// Scores candidates against a complexity profile and selects a team.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouncilFormationService {
    config: FormationConfig,
}

impl CouncilFormationService {
    pub fn new(config: FormationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Select a team and wrap it in a new [`Council`].
    ///
    /// Returns the council together with a human-readable reasoning string.
    pub fn form_council(
        &self,
        id: CouncilId,
        topic: &str,
        profile: &ComplexityProfile,
        available: &[Agent],
        history: &HashMap<AgentId, TaskStats>,
    ) -> Result<(Council, String), DomainError> {
        let selection = self.select_team(profile, available, history)?;
        let council = Council::new(id, topic, selection.members, profile.level);
        Ok((council, selection.reasoning))
    }

    /// Two-phase selection. Fails only when no agent could be selected.
    pub fn select_team(
        &self,
        profile: &ComplexityProfile,
        available: &[Agent],
        history: &HashMap<AgentId, TaskStats>,
    ) -> Result<TeamSelection, DomainError> {
        let target = self.config.bounds.clamp(profile.estimated_agent_count);

        let scores: Vec<CandidateScore> = available
            .iter()
            .map(|agent| self.score_candidate(agent, profile, history.get(&agent.id)))
            .collect();

        // Indices by descending score; stable sort keeps roster order on ties.
        let mut ranked: Vec<usize> = (0..available.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total.total_cmp(&scores[a].total));

        let mut selected: Vec<usize> = Vec::with_capacity(target);
        let mut coverage = Vec::new();

        // Phase 1: coverage-first
        for domain in &profile.domains {
            if selected.len() >= target {
                break;
            }
            let pick = ranked.iter().copied().find(|i| {
                !selected.contains(i) && contains_either(&available[*i].domain, domain)
            });
            if let Some(i) = pick {
                selected.push(i);
                coverage.push((domain.clone(), available[i].id.clone()));
            }
        }

        // Phase 2: fill by score
        for i in ranked.iter().copied() {
            if selected.len() >= target {
                break;
            }
            if !selected.contains(&i) {
                selected.push(i);
            }
        }

        if selected.is_empty() {
            return Err(DomainError::EmptyCouncil);
        }

        let members: Vec<Agent> = selected.iter().map(|&i| available[i].clone()).collect();
        let reasoning = self.reasoning(profile, &members, &coverage, target);

        Ok(TeamSelection {
            members,
            coverage,
            scores,
            reasoning,
        })
    }

    /// Score a single candidate against the profile.
    pub fn score_candidate(
        &self,
        agent: &Agent,
        profile: &ComplexityProfile,
        history: Option<&TaskStats>,
    ) -> CandidateScore {
        let expertise_relevance = Self::expertise_relevance(agent, profile);
        let performance_score = history
            .and_then(TaskStats::success_ratio)
            .unwrap_or(DEFAULT_PERFORMANCE_SCORE);
        let availability_score = agent.status.availability_score();

        let w = &self.config.weights;
        let total = w.diversity * expertise_relevance
            + w.performance * performance_score
            + w.availability * availability_score;

        CandidateScore {
            agent_id: agent.id.clone(),
            expertise_relevance,
            performance_score,
            availability_score,
            total,
        }
    }

    fn expertise_relevance(agent: &Agent, profile: &ComplexityProfile) -> f64 {
        let domain_matches = profile
            .domains
            .iter()
            .filter(|d| contains_either(&agent.domain, d))
            .count();
        let expertise_matches = profile
            .required_expertise
            .iter()
            .filter(|term| agent.expertise.iter().any(|e| contains_either(e, term)))
            .count();

        let raw = DOMAIN_MATCH_SCORE * domain_matches as f64
            + EXPERTISE_MATCH_SCORE * expertise_matches as f64;
        raw.min(1.0)
    }

    fn reasoning(
        &self,
        profile: &ComplexityProfile,
        members: &[Agent],
        coverage: &[(String, AgentId)],
        target: usize,
    ) -> String {
        let w = &self.config.weights;
        let domains: Vec<&str> = profile.domains.iter().map(String::as_str).collect();

        let mut text = format!(
            "Selected {} of {} target agents for a {} query spanning [{}]. \
             Scoring weights: diversity {:.0}%, performance {:.0}%, availability {:.0}%.",
            members.len(),
            target,
            profile.level,
            domains.join(", "),
            w.diversity * 100.0,
            w.performance * 100.0,
            w.availability * 100.0,
        );

        if !coverage.is_empty() {
            let covered: Vec<String> = coverage
                .iter()
                .map(|(domain, id)| format!("{} -> {}", domain, id))
                .collect();
            text.push_str(&format!(" Domain coverage: {}.", covered.join(", ")));
        }

        let uncovered: Vec<&str> = profile
            .domains
            .iter()
            .filter(|d| !coverage.iter().any(|(c, _)| c == *d))
            .map(String::as_str)
            .collect();
        if !uncovered.is_empty() {
            text.push_str(&format!(" No matching agent for: {}.", uncovered.join(", ")));
        }

        text
    }
}
