//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod deliberate;
pub mod form_council;
pub mod scheduler;
pub mod voting;
