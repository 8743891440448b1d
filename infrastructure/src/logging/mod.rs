//! Logging infrastructure: structured decision logging.
//!
//! Provides [`JsonlDecisionLog`], a JSONL file writer that implements
//! the [`DecisionSink`](council_application::DecisionSink) port.

mod jsonl_decision_log;

pub use jsonl_decision_log::JsonlDecisionLog;
