//! Output formatter trait

use council_domain::Decision;

/// Trait for formatting deliberation decisions
pub trait OutputFormatter {
    /// Format the complete decision
    fn format(&self, decision: &Decision) -> String;

    /// Format as JSON
    fn format_json(&self, decision: &Decision) -> String;

    /// Format consensus and confidence only (concise output)
    fn format_summary(&self, decision: &Decision) -> String;
}
