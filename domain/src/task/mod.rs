//! Task entities for the scheduler.

pub mod entities;

pub use entities::{Task, TaskId, TaskPriority, TaskStatus, dispatch_order};
