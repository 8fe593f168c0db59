//! Boundary towards the envelope and wire layers. Messages arrive here
//! already unpacked and leave as plaintext together with the key material
//! needed to pack them.

use async_trait::async_trait;
use messages::AriesMessage;
use public_key::Key;
use url::Url;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::connection::ConnectionRecord,
};

#[derive(Clone, Debug, PartialEq)]
pub struct OutboundMessage {
    pub message: AriesMessage,
    pub connection_id: Option<String>,
    pub endpoint: Url,
    pub recipient_keys: Vec<Key>,
    pub routing_keys: Vec<Key>,
    /// Absent for anonymous (authcrypt-less) envelopes.
    pub sender_key: Option<Key>,
}

/// Packs and delivers outbound messages.
#[async_trait]
pub trait MessageSender: Send + Sync + std::fmt::Debug {
    async fn send_message(&self, outbound: OutboundMessage) -> VcxResult<()>;
}

#[derive(Clone, Debug)]
pub struct InboundMessageContext {
    pub message: AriesMessage,
    pub sender_key: Option<Key>,
    pub recipient_key: Option<Key>,
    /// Set by the dispatcher when the envelope keys map to a connection.
    pub connection: Option<ConnectionRecord>,
}

impl InboundMessageContext {
    pub fn new(message: AriesMessage) -> Self {
        Self {
            message,
            sender_key: None,
            recipient_key: None,
            connection: None,
        }
    }

    pub fn with_keys(mut self, sender_key: Option<Key>, recipient_key: Option<Key>) -> Self {
        self.sender_key = sender_key;
        self.recipient_key = recipient_key;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionRecord) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection.as_ref().map(|connection| connection.id())
    }

    pub fn assert_ready_connection(&self) -> VcxResult<&ConnectionRecord> {
        match &self.connection {
            Some(connection) if connection.is_ready() => Ok(connection),
            Some(connection) => Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!(
                    "Connection {} is not ready, state: {}",
                    connection.id(),
                    connection.state()
                ),
            )),
            None => Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!(
                    "No connection associated with inbound message {}",
                    self.message.id()
                ),
            )),
        }
    }
}
