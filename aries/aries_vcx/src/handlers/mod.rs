//! Inbound message handling: the [`dispatcher::Dispatcher`] routes each
//! message by its type to the handler of its protocol family, which runs the
//! protocol service and decides whether to answer right away.

pub mod connection;
pub mod discover_features;
pub mod dispatcher;
pub mod issuance;
pub mod problem_report;
pub mod proof_presentation;
pub mod thread_locks;

use std::fmt::Debug;

use async_trait::async_trait;
use messages::msg_types::MessageType;

pub use self::dispatcher::Dispatcher;
use crate::{
    errors::error::VcxResult,
    transport::{InboundMessageContext, OutboundMessage},
};

#[async_trait]
pub trait MessageHandler: Send + Sync + Debug {
    fn supported_message_types(&self) -> Vec<MessageType>;

    /// Processes the message and returns the reply to send, if any.
    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>>;
}
