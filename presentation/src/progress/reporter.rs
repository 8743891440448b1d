//! Progress reporting for deliberation rounds

use colored::Colorize;
use council_application::DeliberationProgress;
use council_domain::{AgentId, ConsensusResult, DeliberationPhase};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};

/// Reports progress during deliberation with one progress bar per round
pub struct ProgressReporter {
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            round_bar: Mutex::new(None),
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.round_bar.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn round_name(round: usize, max_turns: usize) -> String {
        format!("Round {}/{}", round, max_turns)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliberationProgress for ProgressReporter {
    fn on_round_start(&self, round: usize, max_turns: usize, members: usize) {
        let pb = ProgressBar::new(members as u64);
        pb.set_style(Self::round_style());
        pb.set_prefix(Self::round_name(round, max_turns));
        pb.set_message("Collecting votes...");

        *self.bar() = Some(pb);
    }

    fn on_vote(&self, agent_id: &AgentId, success: bool) {
        if let Some(pb) = self.bar().as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), agent_id)
            } else {
                format!("{} {}", "x".red(), agent_id)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, _round: usize, result: &ConsensusResult, threshold: f64) {
        if let Some(pb) = self.bar().take() {
            let summary = format!(
                "{:.0}% for '{}' (needs {:.0}%)",
                result.confidence * 100.0,
                result.consensus,
                threshold * 100.0
            );
            if result.confidence >= threshold {
                pb.finish_with_message(summary.green().to_string());
            } else {
                pb.finish_with_message(summary.yellow().to_string());
            }
        }
    }

    fn on_round_timeout(&self, _round: usize) {
        if let Some(pb) = self.bar().take() {
            pb.abandon_with_message("timed out, round discarded".red().to_string());
        }
    }

    fn on_finished(&self, phase: DeliberationPhase) {
        if let Some(pb) = self.bar().take() {
            pb.finish_and_clear();
        }
        if phase == DeliberationPhase::Exhausted {
            eprintln!("{}", "Turn limit reached without consensus".yellow());
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DeliberationProgress for SimpleProgress {
    fn on_round_start(&self, round: usize, max_turns: usize, members: usize) {
        println!(
            "{} {} ({} members)",
            "->".cyan(),
            ProgressReporter::round_name(round, max_turns).bold(),
            members
        );
    }

    fn on_vote(&self, agent_id: &AgentId, success: bool) {
        if success {
            println!("  {} {}", "v".green(), agent_id);
        } else {
            println!("  {} {} (abstained)", "x".red(), agent_id);
        }
    }

    fn on_round_complete(&self, _round: usize, result: &ConsensusResult, threshold: f64) {
        println!(
            "  {:.0}% for '{}' (needs {:.0}%)\n",
            result.confidence * 100.0,
            result.consensus,
            threshold * 100.0
        );
    }

    fn on_round_timeout(&self, round: usize) {
        println!("  {} round {} timed out\n", "x".red(), round);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_lifecycle_does_not_panic() {
        let reporter = ProgressReporter::new();
        reporter.on_round_start(1, 3, 2);
        reporter.on_vote(&AgentId::new("a"), true);
        reporter.on_vote(&AgentId::new("b"), false);
        reporter.on_round_complete(1, &ConsensusResult::empty(), 0.8);
        assert!(reporter.bar().is_none());

        reporter.on_round_start(2, 3, 2);
        reporter.on_round_timeout(2);
        assert!(reporter.bar().is_none());

        reporter.on_vote(&AgentId::new("late"), true);
        reporter.on_finished(DeliberationPhase::Exhausted);
    }

    #[test]
    fn test_round_name() {
        assert_eq!(ProgressReporter::round_name(2, 5), "Round 2/5");
    }
}
