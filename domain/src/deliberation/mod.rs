//! Deliberation phases and context.

pub mod context;
pub mod phase;

pub use context::{DeliberationContext, Plan, PlanMember};
pub use phase::{DeliberationPhase, DeliberationState};
