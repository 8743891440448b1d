//! Executor and logging settings from TOML (`[executor]`, `[logging]`)

use council_domain::core::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default per-task timeout for the process executor.
pub const DEFAULT_EXECUTOR_TIMEOUT_SECS: u64 = 60;

/// External command that runs agent tasks.
///
/// # Example
///
/// ```toml
/// [executor]
/// command = "python3"
/// args = ["agents/run.py"]
/// timeout_secs = 60
/// ```
///
/// The command receives the task as JSON on stdin and answers on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutorConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FileExecutorConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            timeout_secs: DEFAULT_EXECUTOR_TIMEOUT_SECS,
        }
    }
}

impl FileExecutorConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.command.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyExecutorCommand,
                "executor.command cannot be empty",
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "executor.timeout_secs".to_string(),
                },
                "executor.timeout_secs cannot be 0",
            ));
        }
        issues
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Append every decision to this JSONL file
    pub decision_log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_parse() {
        let config: FileExecutorConfig = toml::from_str(
            r#"
command = "python3"
args = ["run.py", "--json"]
"#,
        )
        .unwrap();
        assert_eq!(config.command, "python3");
        assert_eq!(config.args.len(), 2);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_empty_command() {
        let issues = FileExecutorConfig::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyExecutorCommand);
    }
}
