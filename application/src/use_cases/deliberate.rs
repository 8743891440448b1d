//! Deliberate use case
//!
//! Drives voting rounds for a council until the weighted consensus reaches
//! the threshold or the turn limit is hit:
//!
//! ```text
//! NotStarted → Collecting → Evaluating → Converged
//!                  ▲            │
//!                  └─ NextRound ┤
//!                               └──────→ Exhausted
//! ```
//!
//! Every decision, converged or exhausted, is appended to the vote history,
//! handed to the decision sink and announced as `decision:recorded`.

use crate::config::{ConsensusConfig, DeliberationParams};
use crate::events::EventBus;
use crate::history::VoteHistoryStore;
use crate::ports::decision_sink::{DecisionSink, NoDecisionSink};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use crate::ports::vote_source::{VoteRequest, VoteSource};
use crate::registry::AgentRegistry;
use crate::use_cases::form_council::FormCouncilUseCase;
use crate::use_cases::voting::{RoundCollection, RoundVotes, VotingService};
use council_domain::{
    AgentId, AgentStatus, ConsensusEngine, ConsensusResult, Council, CouncilEvent, CouncilId,
    Decision, DeliberationContext, DeliberationPhase, DeliberationState, DomainError,
    OutlierDetector, PerformanceHistory, SecurityAnalysis, Vote, VoteWeightCalculator,
    WeightInput,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that abort a deliberation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliberationError {
    #[error("Council not found: {0}")]
    CouncilNotFound(CouncilId),

    #[error(transparent)]
    InvalidContext(#[from] DomainError),

    #[error("Deliberation cancelled")]
    Cancelled,
}

/// Terminal outcome of a deliberation
#[derive(Debug, Clone, PartialEq)]
pub enum DeliberationOutcome {
    Converged(Decision),
    /// Turn limit reached; carries the best-effort decision flagged `no_consensus`
    Exhausted(Decision),
}

impl DeliberationOutcome {
    pub fn decision(&self) -> &Decision {
        match self {
            DeliberationOutcome::Converged(d) | DeliberationOutcome::Exhausted(d) => d,
        }
    }

    pub fn into_decision(self) -> Decision {
        match self {
            DeliberationOutcome::Converged(d) | DeliberationOutcome::Exhausted(d) => d,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, DeliberationOutcome::Converged(_))
    }
}

/// Input for the Deliberate use case
#[derive(Debug, Clone)]
pub struct DeliberateInput {
    pub council_id: CouncilId,
    pub topic: String,
    pub context: DeliberationContext,
    /// Overrides the configured turn limit
    pub max_turns: Option<usize>,
    /// Overrides both the configured and the complexity-adaptive threshold
    pub threshold: Option<f64>,
}

impl DeliberateInput {
    pub fn new(council_id: CouncilId, topic: impl Into<String>) -> Self {
        Self {
            council_id,
            topic: topic.into(),
            context: DeliberationContext::None,
            max_turns: None,
            threshold: None,
        }
    }

    pub fn with_context(mut self, context: DeliberationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Best round seen so far, used when the turn limit is hit.
struct EvaluatedRound {
    votes: Vec<Vote>,
    result: ConsensusResult,
}

pub struct DeliberationOrchestrator {
    councils: Arc<FormCouncilUseCase>,
    registry: Arc<AgentRegistry>,
    history: Arc<VoteHistoryStore>,
    voting: VotingService,
    engine: ConsensusEngine,
    weights: VoteWeightCalculator,
    detector: Box<dyn OutlierDetector>,
    params: DeliberationParams,
    sink: Arc<dyn DecisionSink>,
    events: EventBus,
    cancellation_token: Option<CancellationToken>,
}

impl DeliberationOrchestrator {
    pub fn new(
        councils: Arc<FormCouncilUseCase>,
        registry: Arc<AgentRegistry>,
        history: Arc<VoteHistoryStore>,
        source: Arc<dyn VoteSource>,
        events: EventBus,
        consensus: &ConsensusConfig,
        params: DeliberationParams,
    ) -> Self {
        Self {
            councils,
            registry,
            history,
            voting: VotingService::new(source, events.clone()),
            engine: consensus.engine(),
            weights: consensus.weight_calculator(),
            detector: consensus.outlier_strategy.detector(consensus.sigma),
            params,
            sink: Arc::new(NoDecisionSink),
            events,
            cancellation_token: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Deliberate and return the decision.
    ///
    /// An exhausted deliberation is not an error: the best-effort decision is
    /// returned with `no_consensus` set.
    pub async fn deliberate(
        &self,
        council_id: &CouncilId,
        topic: &str,
        context: DeliberationContext,
        max_turns: Option<usize>,
        threshold: Option<f64>,
    ) -> Result<Decision, DeliberationError> {
        let mut input = DeliberateInput::new(council_id.clone(), topic).with_context(context);
        input.max_turns = max_turns;
        input.threshold = threshold;
        Ok(self.execute(input).await?.into_decision())
    }

    /// Execute with default (no-op) progress
    pub async fn execute(
        &self,
        input: DeliberateInput,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: DeliberateInput,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        let council = self
            .councils
            .use_council(&input.council_id)
            .ok_or_else(|| DeliberationError::CouncilNotFound(input.council_id.clone()))?;
        input.context.validate()?;

        let threshold = input
            .threshold
            .or(self.params.threshold)
            .unwrap_or_else(|| self.engine.threshold_for(council.complexity));
        let max_turns = input.max_turns.unwrap_or(self.params.max_turns);

        info!(
            council = %council.id,
            topic = %input.topic,
            members = council.size(),
            threshold,
            max_turns,
            "Starting deliberation"
        );

        let activated = self.activate(&council);
        let result = self
            .run_rounds(&council, &input, threshold, max_turns, progress)
            .await;
        self.deactivate(&activated);

        let outcome = result?;
        let decision = outcome.decision();

        self.history.append(decision.clone());
        self.sink.record(decision);
        self.events.publish(CouncilEvent::DecisionRecorded {
            topic: decision.topic.clone(),
            council_id: decision.council_id.clone(),
            consensus: decision.consensus.clone(),
            confidence: decision.confidence_score,
            no_consensus: decision.no_consensus,
        });

        Ok(outcome)
    }

    async fn run_rounds(
        &self,
        council: &Council,
        input: &DeliberateInput,
        threshold: f64,
        max_turns: usize,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        let mut state = DeliberationState::new(max_turns);
        let mut best: Option<EvaluatedRound> = None;
        let mut previous: Vec<Vote> = Vec::new();

        loop {
            self.check_cancelled()?;
            state.advance(DeliberationPhase::Collecting);
            let round = state.round();
            progress.on_round_start(round, state.max_turns(), council.size());
            debug!(round, "Collecting votes");

            let request = VoteRequest::new(&input.topic, input.context.clone(), round)
                .with_previous(std::mem::take(&mut previous));
            let collected = self
                .voting
                .collect_votes(
                    council,
                    &request,
                    progress,
                    self.params.round_timeout,
                    self.cancellation_token.as_ref(),
                )
                .await;

            let RoundVotes { votes, abstained } = match collected {
                RoundCollection::Complete(round_votes) => round_votes,
                RoundCollection::Cancelled => return Err(DeliberationError::Cancelled),
                RoundCollection::TimedOut => {
                    warn!(round, timeout = ?self.params.round_timeout, "Round timed out, discarding");
                    progress.on_round_timeout(round);
                    if state.conclude_round(false) == DeliberationPhase::Exhausted {
                        progress.on_finished(DeliberationPhase::Exhausted);
                        return Ok(self.exhausted(council, input, best, state.round()));
                    }
                    continue;
                }
            };
            if !abstained.is_empty() {
                debug!(round, abstained = abstained.len(), "Members abstained");
            }

            state.advance(DeliberationPhase::Evaluating);
            let weights = self.compute_weights(council, input, &votes);
            let result = self.engine.evaluate(&votes, &weights);
            let reached =
                !votes.is_empty() && ConsensusEngine::is_consensus_reached(result.confidence, threshold);
            progress.on_round_complete(round, &result, threshold);
            info!(
                round,
                consensus = %result.consensus,
                confidence = result.confidence,
                reached,
                "Round evaluated"
            );

            match state.conclude_round(reached) {
                DeliberationPhase::Converged => {
                    progress.on_finished(DeliberationPhase::Converged);
                    info!(round, "Consensus reached");
                    let decision = self.build_decision(council, input, votes, &result, round);
                    return Ok(DeliberationOutcome::Converged(decision));
                }
                DeliberationPhase::Exhausted => {
                    let evaluated = EvaluatedRound { votes, result };
                    let best = Self::keep_best(best, evaluated);
                    progress.on_finished(DeliberationPhase::Exhausted);
                    return Ok(self.exhausted(council, input, Some(best), round));
                }
                _ => {
                    previous = votes.clone();
                    best = Some(Self::keep_best(best, EvaluatedRound { votes, result }));
                }
            }
        }
    }

    fn keep_best(best: Option<EvaluatedRound>, candidate: EvaluatedRound) -> EvaluatedRound {
        match best {
            Some(current) if current.result.confidence >= candidate.result.confidence => current,
            _ => candidate,
        }
    }

    fn exhausted(
        &self,
        council: &Council,
        input: &DeliberateInput,
        best: Option<EvaluatedRound>,
        rounds: usize,
    ) -> DeliberationOutcome {
        warn!(
            council = %council.id,
            rounds,
            "Turn limit reached without consensus"
        );
        let decision = match best {
            Some(EvaluatedRound { votes, result }) => {
                self.build_decision(council, input, votes, &result, rounds)
            }
            None => Decision::new(&input.topic, Vec::new(), "", 0.0)
                .with_rounds(rounds)
                .with_council(council.id.clone()),
        };
        DeliberationOutcome::Exhausted(decision.mark_no_consensus())
    }

    fn build_decision(
        &self,
        council: &Council,
        input: &DeliberateInput,
        votes: Vec<Vote>,
        result: &ConsensusResult,
        rounds: usize,
    ) -> Decision {
        let suspicious = self.detector.detect(&votes);
        if !suspicious.is_empty() {
            warn!(
                detector = self.detector.name(),
                flagged = suspicious.len(),
                "Suspicious votes detected"
            );
        }
        let analysis = SecurityAnalysis::from_suspicious(suspicious, votes.len());

        Decision::new(&input.topic, votes, &result.consensus, result.confidence)
            .with_security_analysis(analysis)
            .with_rounds(rounds)
            .with_council(council.id.clone())
    }

    /// Per-voter weights. A plan member's explicit weight wins over the
    /// calculator.
    fn compute_weights(
        &self,
        council: &Council,
        input: &DeliberateInput,
        votes: &[Vote],
    ) -> HashMap<AgentId, f64> {
        let plan = input.context.as_plan();
        votes
            .iter()
            .filter_map(|vote| {
                let agent = council.member(&vote.agent_id)?;
                if let Some(weight) = plan.and_then(|p| p.weight_for(&agent.id)) {
                    return Some((agent.id.clone(), weight));
                }
                let history = PerformanceHistory {
                    topic_accuracy: self.history.topic_accuracy(&agent.id, &input.topic),
                    task_stats: self.registry.task_stats(&agent.id).unwrap_or_default(),
                };
                let weight = self.weights.weight(&WeightInput {
                    agent,
                    topic: &input.topic,
                    vote_confidence: vote.confidence,
                    history,
                });
                Some((agent.id.clone(), weight))
            })
            .collect()
    }

    /// Move idle members to active; returns the ones that moved.
    fn activate(&self, council: &Council) -> Vec<AgentId> {
        council
            .agents
            .iter()
            .filter(|a| {
                self.registry
                    .compare_and_set_status(&a.id, AgentStatus::Idle, AgentStatus::Active)
            })
            .map(|a| a.id.clone())
            .collect()
    }

    fn deactivate(&self, activated: &[AgentId]) {
        for id in activated {
            self.registry
                .compare_and_set_status(id, AgentStatus::Active, AgentStatus::Idle);
        }
    }

    fn check_cancelled(&self) -> Result<(), DeliberationError> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(DeliberationError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::vote_source::VoteSourceError;
    use async_trait::async_trait;
    use council_domain::{Agent, CouncilBounds, FormationConfig, Plan, PlanMember};
    use std::time::Duration;

    /// Per-agent scripted answers, one per round (the last repeats).
    struct ScriptedSource {
        script: HashMap<String, Vec<(&'static str, f64)>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(script: &[(&str, &[(&'static str, f64)])]) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(id, rounds)| (id.to_string(), rounds.to_vec()))
                    .collect(),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl VoteSource for ScriptedSource {
        async fn cast_vote(
            &self,
            agent: &Agent,
            request: &VoteRequest,
        ) -> Result<Vote, VoteSourceError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let rounds = self
                .script
                .get(agent.id.as_str())
                .ok_or_else(|| VoteSourceError::EmptyVote(agent.id.to_string()))?;
            let (suggestion, confidence) = rounds[(request.round - 1).min(rounds.len() - 1)];
            Ok(Vote::new(agent.id.clone(), suggestion, confidence))
        }
    }

    struct Harness {
        registry: Arc<AgentRegistry>,
        councils: Arc<FormCouncilUseCase>,
        history: Arc<VoteHistoryStore>,
        events: EventBus,
    }

    impl Harness {
        fn new(ids: &[&str]) -> Self {
            let events = EventBus::new(256);
            let registry = Arc::new(AgentRegistry::new(events.clone()));
            for id in ids {
                registry.register_agent(Agent::new(*id, "general"));
            }
            let formation = FormationConfig {
                bounds: CouncilBounds::new(ids.len(), 7),
                ..FormationConfig::default()
            };
            let councils = Arc::new(FormCouncilUseCase::new(Arc::clone(&registry), formation, 10));
            Self {
                registry,
                councils,
                history: Arc::new(VoteHistoryStore::new(100)),
                events,
            }
        }

        fn orchestrator(&self, source: ScriptedSource, params: DeliberationParams) -> DeliberationOrchestrator {
            DeliberationOrchestrator::new(
                Arc::clone(&self.councils),
                Arc::clone(&self.registry),
                Arc::clone(&self.history),
                Arc::new(source),
                self.events.clone(),
                &ConsensusConfig::default(),
                params,
            )
        }

        fn council(&self, topic: &str) -> CouncilId {
            self.councils.execute(topic).unwrap().council.id
        }
    }

    #[tokio::test]
    async fn test_converges_in_first_round() {
        let harness = Harness::new(&["a", "b", "c"]);
        let source = ScriptedSource::new(&[
            ("a", &[("X", 0.9)]),
            ("b", &[("X", 0.85)]),
            ("c", &[("Y", 0.2)]),
        ]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("study plan");
        let mut decisions = harness.events.subscribe_event("decision:recorded");

        let outcome = orchestrator
            .execute(DeliberateInput::new(council_id.clone(), "study plan"))
            .await
            .unwrap();

        assert!(outcome.is_converged());
        let decision = outcome.decision();
        assert_eq!(decision.consensus, "X");
        assert!(decision.confidence_score > 0.8);
        assert_eq!(decision.rounds, 1);
        assert!(!decision.no_consensus);
        assert_eq!(decision.council_id.as_ref(), Some(&council_id));
        assert_eq!(harness.history.get_vote_history("study plan").len(), 1);
        assert_eq!(decisions.recv().await.unwrap().name(), "decision:recorded");
    }

    #[tokio::test]
    async fn test_exhausts_with_no_consensus_flag() {
        let harness = Harness::new(&["a", "b", "c"]);
        let source = ScriptedSource::new(&[
            ("a", &[("X", 0.5)]),
            ("b", &[("Y", 0.5)]),
            ("c", &[("Z", 0.5)]),
        ]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("split vote");

        let decision = orchestrator
            .deliberate(&council_id, "split vote", DeliberationContext::None, None, None)
            .await
            .unwrap();

        assert!(decision.no_consensus);
        assert!(!decision.has_consensus());
        assert_eq!(decision.rounds, 3);
        assert_eq!(decision.consensus, "X");
        assert_eq!(harness.history.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_best_round() {
        let harness = Harness::new(&["a", "b", "c"]);
        let source = ScriptedSource::new(&[
            ("a", &[("X", 0.9), ("X", 0.9)]),
            ("b", &[("X", 0.9), ("Y", 0.9)]),
            ("c", &[("Y", 0.9), ("Z", 0.9)]),
        ]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("best effort");

        let outcome = orchestrator
            .execute(DeliberateInput::new(council_id, "best effort").with_max_turns(2))
            .await
            .unwrap();

        let DeliberationOutcome::Exhausted(decision) = outcome else {
            panic!("expected exhaustion");
        };
        assert_eq!(decision.consensus, "X");
        assert!((decision.confidence_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(decision.rounds, 2);
    }

    #[tokio::test]
    async fn test_unknown_council_is_error() {
        let harness = Harness::new(&["a"]);
        let orchestrator =
            harness.orchestrator(ScriptedSource::new(&[]), DeliberationParams::default());

        let err = orchestrator
            .execute(DeliberateInput::new(CouncilId::new("council-404"), "t"))
            .await
            .unwrap_err();
        assert_eq!(err, DeliberationError::CouncilNotFound(CouncilId::new("council-404")));
    }

    #[tokio::test]
    async fn test_invalid_plan_rejected() {
        let harness = Harness::new(&["a"]);
        let orchestrator =
            harness.orchestrator(ScriptedSource::new(&[]), DeliberationParams::default());
        let council_id = harness.council("plan");

        let err = orchestrator
            .execute(
                DeliberateInput::new(council_id, "plan")
                    .with_context(DeliberationContext::plan(Plan::new("plan"))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeliberationError::InvalidContext(DomainError::InvalidPlan(_))));
        assert!(harness.history.is_empty());
    }

    #[tokio::test]
    async fn test_plan_member_weights_override() {
        let harness = Harness::new(&["expert", "novice"]);
        let source = ScriptedSource::new(&[("expert", &[("A", 0.9)]), ("novice", &[("B", 0.9)])]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("weighted plan");
        let plan = Plan::new("weighted plan")
            .with_task("pick an approach")
            .with_member(PlanMember::new("expert").with_weight(1.0))
            .with_member(PlanMember::new("novice").with_weight(0.5));

        let outcome = orchestrator
            .execute(
                DeliberateInput::new(council_id, "weighted plan")
                    .with_context(DeliberationContext::plan(plan))
                    .with_threshold(0.6),
            )
            .await
            .unwrap();

        assert!(outcome.is_converged());
        assert_eq!(outcome.decision().consensus, "A");
        assert!((outcome.decision().confidence_score - 0.9 / 1.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_suspicious_votes_annotated_not_blocking() {
        let harness = Harness::new(&["a", "b", "c", "d", "e"]);
        let source = ScriptedSource::new(&[
            ("a", &[("X", 0.99)]),
            ("b", &[("X", 0.98)]),
            ("c", &[("X", 0.6)]),
            ("d", &[("X", 0.6)]),
            ("e", &[("X", 0.6)]),
        ]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("integrity");

        let decision = orchestrator
            .deliberate(&council_id, "integrity", DeliberationContext::None, None, None)
            .await
            .unwrap();

        assert!(decision.has_consensus());
        let analysis = decision.security_analysis.expect("suspicious votes flagged");
        assert_eq!(analysis.suspicious_votes.len(), 2);
        assert!((analysis.risk_level - 0.4).abs() < 1e-9);
        assert!(!analysis.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_members_return_to_idle() {
        let harness = Harness::new(&["a", "b"]);
        harness.registry.set_agent_status(&AgentId::new("b"), AgentStatus::Error);
        let source = ScriptedSource::new(&[("a", &[("X", 0.9)]), ("b", &[("X", 0.9)])]);
        let orchestrator = harness.orchestrator(source, DeliberationParams::default());
        let council_id = harness.council("statuses");

        orchestrator
            .execute(DeliberateInput::new(council_id, "statuses"))
            .await
            .unwrap();

        let status = |id: &str| harness.registry.get_agent(&AgentId::new(id)).unwrap().status;
        assert_eq!(status("a"), AgentStatus::Idle);
        assert_eq!(status("b"), AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_round() {
        let harness = Harness::new(&["a"]);
        let token = CancellationToken::new();
        token.cancel();
        let orchestrator = harness
            .orchestrator(ScriptedSource::new(&[("a", &[("X", 0.9)])]), DeliberationParams::default())
            .with_cancellation(token);
        let council_id = harness.council("cancel");

        let err = orchestrator
            .execute(DeliberateInput::new(council_id, "cancel"))
            .await
            .unwrap_err();
        assert_eq!(err, DeliberationError::Cancelled);
        assert!(harness.history.is_empty());
        assert_eq!(
            harness.registry.get_agent(&AgentId::new("a")).unwrap().status,
            AgentStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_timed_out_rounds_count_toward_limit() {
        let harness = Harness::new(&["a"]);
        let source = ScriptedSource::new(&[("a", &[("X", 0.9)])]).with_delay(Duration::from_millis(200));
        let params = DeliberationParams::default()
            .with_max_turns(2)
            .with_round_timeout(Duration::from_millis(10));
        let orchestrator = harness.orchestrator(source, params);
        let council_id = harness.council("slow");

        let outcome = orchestrator
            .execute(DeliberateInput::new(council_id, "slow"))
            .await
            .unwrap();

        let decision = outcome.decision();
        assert!(!outcome.is_converged());
        assert!(decision.no_consensus);
        assert!(decision.votes.is_empty());
        assert_eq!(decision.rounds, 2);
    }
}
