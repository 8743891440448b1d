//! Console output formatter for councils, decisions and tasks

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::{AgentRegistry, FormedCouncil};
use council_domain::{Agent, ConfigIssue, Decision, Quota, Task, TaskStatus};
use serde::Serialize;

/// One row of the `agents` listing.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOverview {
    #[serde(flatten)]
    pub agent: Agent,
    pub max_concurrent_tasks: u32,
    pub current_usage: u32,
    pub success_rate: f64,
    pub successful_tasks: u32,
    pub total_tasks: u32,
}

impl AgentOverview {
    /// Snapshot of every registered agent, in registration order.
    pub fn collect(registry: &AgentRegistry) -> Vec<Self> {
        registry
            .agents()
            .into_iter()
            .map(|agent| {
                let quota = registry
                    .quota(&agent.id)
                    .unwrap_or_else(|| Quota::for_accuracy(agent.performance.accuracy));
                let stats = registry.task_stats(&agent.id).unwrap_or_default();
                let success_rate = registry.success_rate(&agent.id).unwrap_or_default();
                Self {
                    max_concurrent_tasks: quota.max_concurrent_tasks(),
                    current_usage: quota.current_usage(),
                    success_rate,
                    successful_tasks: stats.successful_tasks,
                    total_tasks: stats.total_tasks,
                    agent,
                }
            })
            .collect()
    }
}

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete decision
    pub fn format(decision: &Decision) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Council Decision"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            decision.topic
        ));
        if let Some(id) = &decision.council_id {
            output.push_str(&format!("{} {}\n", "Council:".cyan().bold(), id));
        }
        output.push_str(&format!(
            "{} {}\n",
            "Rounds:".cyan().bold(),
            decision.rounds
        ));

        output.push_str(&Self::section_header("Votes"));
        if decision.votes.is_empty() {
            output.push_str(&format!("\n{}\n", "No votes were cast".dimmed()));
        }
        for vote in &decision.votes {
            let marker = if vote.suggestion == decision.consensus {
                "*".green().bold()
            } else {
                " ".normal()
            };
            output.push_str(&format!(
                "\n{} {} ({:.0}%)\n  {}\n",
                marker,
                format!("── {} ──", vote.agent_id).yellow().bold(),
                vote.confidence * 100.0,
                vote.suggestion
            ));
            if !vote.reasoning.is_empty() {
                output.push_str(&format!("{}\n", Self::indent(&vote.reasoning, "    ").dimmed()));
            }
        }

        output.push_str(&Self::section_header("Result"));
        output.push_str(&Self::result_line(decision));

        if let Some(analysis) = &decision.security_analysis {
            output.push_str(&format!(
                "\n{} risk {:.0}%\n",
                "Suspicious votes:".red().bold(),
                analysis.risk_level * 100.0
            ));
            for suspicious in &analysis.suspicious_votes {
                output.push_str(&format!(
                    "  * {} ({:.2}, {})\n",
                    suspicious.agent_id, suspicious.confidence, suspicious.reason
                ));
            }
            output.push_str(&format!("{}\n", "Recommendations:".yellow().bold()));
            for recommendation in &analysis.recommendations {
                output.push_str(&format!("  * {}\n", recommendation));
            }
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(decision: &Decision) -> String {
        serde_json::to_string_pretty(decision).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format consensus and confidence only (concise output)
    pub fn format_summary(decision: &Decision) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Council Decision ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), decision.topic));
        output.push_str(&Self::result_line(decision));
        if decision.is_suspicious() {
            output.push_str(&format!(
                "{}\n",
                "Warning: suspicious votes detected, run with --output full for details".yellow()
            ));
        }

        output
    }

    fn result_line(decision: &Decision) -> String {
        let confidence = format!("{:.1}%", decision.confidence_score * 100.0);
        if decision.has_consensus() {
            format!(
                "{} {}\n{} {} after {} round(s)\n",
                "Consensus:".green().bold(),
                decision.consensus,
                "Confidence:".green().bold(),
                confidence,
                decision.rounds
            )
        } else {
            let best = if decision.consensus.is_empty() {
                "(none)".to_string()
            } else {
                decision.consensus.clone()
            };
            format!(
                "{} best suggestion was {} at {} after {} round(s)\n",
                "No consensus:".yellow().bold(),
                best,
                confidence,
                decision.rounds
            )
        }
    }

    /// Format a newly formed (or reused) council
    pub fn format_council(formed: &FormedCouncil) -> String {
        let mut output = String::new();
        let council = &formed.council;

        output.push_str(&Self::header("Council Formation"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Council:".cyan().bold(), council.id));
        output.push_str(&format!("{} {}\n", "Topic:".cyan().bold(), council.topic));
        output.push_str(&format!(
            "{} {} ({} agent(s) estimated)\n",
            "Complexity:".cyan().bold(),
            formed.profile.level,
            formed.profile.estimated_agent_count
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Domains:".cyan().bold(),
            Self::join(formed.profile.domains.iter())
        ));
        if formed.reused {
            output.push_str(&format!("{}\n", "Reusing an active council for this topic".dimmed()));
        }

        output.push_str(&Self::section_header("Members"));
        for agent in &council.agents {
            output.push_str(&format!(
                "  {} {} [{}]\n",
                agent.id.as_str().yellow().bold(),
                agent.domain,
                Self::join(agent.expertise.iter())
            ));
        }

        output.push_str(&format!("\n{} {}\n", "Reasoning:".cyan().bold(), formed.reasoning));
        output.push_str(&Self::footer());

        output
    }

    /// Format the registered roster as a table
    pub fn format_agents(agents: &[AgentOverview]) -> String {
        if agents.is_empty() {
            return format!(
                "{}\n",
                "No agents registered. Add [[agents]] entries to council.toml.".yellow()
            );
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            format!(
                "{:<20} {:<16} {:<8} {:>7} {:>9} {:>8}",
                "ID", "DOMAIN", "STATUS", "QUOTA", "SUCCESS", "TASKS"
            )
            .bold()
        ));
        for row in agents {
            output.push_str(&format!(
                "{:<20} {:<16} {:<8} {:>7} {:>8.0}% {:>8}\n",
                row.agent.id.as_str(),
                row.agent.domain,
                row.agent.status.as_str(),
                format!("{}/{}", row.current_usage, row.max_concurrent_tasks),
                row.success_rate * 100.0,
                format!("{}/{}", row.successful_tasks, row.total_tasks)
            ));
        }
        output
    }

    /// Format a finished task
    pub fn format_task(task: &Task) -> String {
        let status = match task.status {
            TaskStatus::Completed => task.status.as_str().green().bold(),
            TaskStatus::Failed => task.status.as_str().red().bold(),
            _ => task.status.as_str().yellow().bold(),
        };
        let mut output = format!(
            "{} {} ({} for {}, {})\n",
            status,
            task.id,
            task.task_type,
            task.agent_id,
            task.priority
        );
        if let Some(result) = &task.result {
            output.push_str(&format!("{}\n", Self::indent(result, "  ")));
        }
        if let Some(error) = &task.error {
            output.push_str(&format!("  {} {}\n", "Error:".red(), error));
        }
        output
    }

    /// Format configuration warnings and errors
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let label = if issue.is_error() {
                    "error:".red().bold()
                } else {
                    "warning:".yellow().bold()
                };
                format!("{} {}\n", label, issue.message)
            })
            .collect()
    }

    fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
        items.map(String::as_str).collect::<Vec<_>>().join(", ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, decision: &Decision) -> String {
        Self::format(decision)
    }

    fn format_json(&self, decision: &Decision) -> String {
        Self::format_json(decision)
    }

    fn format_summary(&self, decision: &Decision) -> String {
        Self::format_summary(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::EventBus;
    use council_domain::quorum::OutlierReason;
    use council_domain::{SecurityAnalysis, SuspiciousVote, Vote};

    fn decision() -> Decision {
        Decision::new(
            "Best sorting algorithm?",
            vec![
                Vote::new("a", "merge sort", 0.9).with_reasoning("stable\nn log n"),
                Vote::new("b", "merge sort", 0.8),
                Vote::new("c", "quicksort", 0.6),
            ],
            "merge sort",
            0.74,
        )
    }

    #[test]
    fn test_format_full_lists_votes() {
        let out = ConsoleFormatter::format(&decision().with_rounds(2));
        assert!(out.contains("Best sorting algorithm?"));
        assert!(out.contains("quicksort"));
        assert!(out.contains("74.0%"));
        assert!(out.contains("2 round(s)"));
        assert!(out.contains("    n log n"));
    }

    #[test]
    fn test_summary_reports_no_consensus() {
        let out = ConsoleFormatter::format_summary(&decision().mark_no_consensus());
        assert!(out.contains("No consensus:"));
        assert!(out.contains("merge sort"));
    }

    #[test]
    fn test_full_includes_security_analysis() {
        let analysis = SecurityAnalysis::from_suspicious(
            vec![SuspiciousVote {
                agent_id: "c".into(),
                confidence: 0.99,
                reason: OutlierReason::Overconfident,
            }],
            3,
        );
        let out = ConsoleFormatter::format(&decision().with_security_analysis(analysis));
        assert!(out.contains("Suspicious votes:"));
        assert!(out.contains("overconfident"));
        assert!(ConsoleFormatter::format_summary(&decision()).find("suspicious").is_none());
    }

    #[test]
    fn test_json_is_parseable() {
        let json = ConsoleFormatter::format_json(&decision());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["consensus"], "merge sort");
    }

    #[test]
    fn test_format_agents() {
        let registry = AgentRegistry::new(EventBus::default());
        assert!(ConsoleFormatter::format_agents(&AgentOverview::collect(&registry))
            .contains("No agents registered"));

        registry.register_agent(Agent::new("algebra-1", "mathematics").with_accuracy(1.0));
        let rows = AgentOverview::collect(&registry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].max_concurrent_tasks, 3);
        assert_eq!(rows[0].success_rate, 0.5);

        let out = ConsoleFormatter::format_agents(&rows);
        assert!(out.contains("algebra-1"));
        assert!(out.contains("0/3"));
    }
}
