//! Task executor adapters implementing the
//! [`AgentTaskExecutor`](council_application::AgentTaskExecutor) port.

mod command;

pub use command::CommandExecutor;
