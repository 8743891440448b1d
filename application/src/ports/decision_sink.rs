//! Port for persisting decisions.
//!
//! Separate from the in-memory vote history: a sink writes decisions to an
//! external store (a JSONL file, a dashboard feed). The `record` method is
//! synchronous and non-fallible; sink failures must not disturb
//! deliberation.

use council_domain::Decision;

pub trait DecisionSink: Send + Sync {
    fn record(&self, decision: &Decision);
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoDecisionSink;

impl DecisionSink for NoDecisionSink {
    fn record(&self, _decision: &Decision) {}
}
