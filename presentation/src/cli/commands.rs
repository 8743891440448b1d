//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use council_domain::TaskPriority;
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every round's votes, the tally and the security analysis
    Full,
    /// Only the final consensus and confidence
    Summary,
    /// JSON output
    Json,
}

/// CLI arguments for agent-council
#[derive(Parser, Debug)]
#[command(name = "agent-council")]
#[command(author, version, about = "Agent Council - specialised agents vote and reach weighted consensus")]
#[command(long_about = r#"
Agent Council forms a bounded, domain-balanced council of agents for a query
and runs weighted voting rounds until consensus or the turn limit.

1. Formation: the query is profiled and the best-scoring agents are picked
2. Deliberation: members vote each round; votes are weighted and tallied
3. Decision: the leading suggestion is recorded with its confidence

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/agent-council/config.toml   Global config

Example:
  agent-council agents
  agent-council form "Derive the orbital period from Kepler's laws"
  agent-council deliberate --max-turns 5 "Which sorting algorithm fits nearly-sorted data?"
  agent-council task --agent algebra-1 --type solve "x^2 - 4 = 0"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and the merged config, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the registered agents with their quota and success rate
    Agents,

    /// Form a council for a query and show who was picked and why
    Form {
        /// The query to form a council for
        query: String,
    },

    /// Form a council and deliberate on the query until consensus
    Deliberate {
        /// The question to put to the council
        query: String,

        /// Maximum number of voting rounds
        #[arg(long, value_name = "N")]
        max_turns: Option<usize>,

        /// Fixed consensus threshold (0.0 to 1.0) for this run
        #[arg(long, value_name = "T", value_parser = parse_threshold)]
        threshold: Option<f64>,
    },

    /// Submit a task to one agent and wait for its result
    Task {
        /// Target agent id
        #[arg(long, value_name = "ID")]
        agent: String,

        /// Task type passed to the executor
        #[arg(long = "type", value_name = "TYPE")]
        task_type: String,

        /// low, normal, high or critical
        #[arg(long, default_value = "normal", value_parser = parse_priority)]
        priority: TaskPriority,

        /// Task content
        content: String,
    },
}

fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    s.parse()
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be between 0 and 1, got {value}"))
    }
}
