//! The [`Agent`]: protocol services wired to one wallet, a dispatcher for
//! inbound messages and the application facing flows on top of them.

mod agent_struct;
pub mod config;
mod connections;
mod exchanges;
mod init;

pub use self::{agent_struct::Agent, config::AgentConfig, init::default_resolver_registry};
