use std::{collections::HashMap, sync::Arc};

use messages::msg_types::{MessageType, Protocol};

use super::{
    thread_locks::{ThreadKey, ThreadLocks},
    MessageHandler,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::{AgentEvent, EventBus},
    protocols::connection::ConnectionService,
    transport::{InboundMessageContext, MessageSender},
};

/// Routes inbound messages to the handler registered for their type.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
    connections: ConnectionService,
    sender: Arc<dyn MessageSender>,
    events: EventBus,
    locks: ThreadLocks,
}

impl Dispatcher {
    pub fn new(
        connections: ConnectionService,
        sender: Arc<dyn MessageSender>,
        events: EventBus,
    ) -> Self {
        Self {
            handlers: HashMap::new(),
            connections,
            sender,
            events,
            locks: ThreadLocks::new(),
        }
    }

    /// Registers `handler` for every type it supports, replacing handlers
    /// registered earlier for the same types.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        for msg_type in handler.supported_message_types() {
            if self.handlers.insert(msg_type.clone(), handler.clone()).is_some() {
                warn!("Dispatcher::register >> handler for {msg_type} replaced");
            }
        }
    }

    pub fn supported_message_types(&self) -> Vec<MessageType> {
        self.handlers.keys().cloned().collect()
    }

    /// Protocols with at least one registered message type.
    pub fn supported_protocols(&self) -> Vec<Protocol> {
        let mut protocols: Vec<Protocol> = Vec::new();
        for msg_type in self.handlers.keys() {
            if !protocols.contains(&msg_type.protocol) {
                protocols.push(msg_type.protocol);
            }
        }
        protocols.sort_by_key(|protocol| protocol.pid());
        protocols
    }

    pub fn can_handle(&self, msg_type: &MessageType) -> bool {
        self.handlers.contains_key(msg_type)
    }

    /// Hands the message to its handler and sends whatever the handler
    /// answers with.
    ///
    /// A failure the peer caused is answered with its problem report when
    /// the message came over a connection; without one there is no way
    /// back and the error is returned instead.
    pub async fn dispatch(&self, mut ctx: InboundMessageContext) -> VcxResult<()> {
        let msg_type = ctx.message.msg_type();
        let Some(handler) = self.handlers.get(&msg_type) else {
            warn!(
                "Dispatcher::dispatch >> no handler for {msg_type}, dropping message {}",
                ctx.message.id()
            );
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::UnroutableMessage,
                format!("No handler registered for message type {msg_type}"),
            ));
        };

        if ctx.connection.is_none() {
            if let (Some(sender_key), Some(recipient_key)) = (&ctx.sender_key, &ctx.recipient_key) {
                ctx.connection = self
                    .connections
                    .find_by_keys(sender_key, recipient_key)
                    .await?;
            }
        }

        let key = ThreadKey::new(ctx.message.thread_id(), ctx.connection_id());
        let _guard = self.locks.lock(key).await?;
        debug!(
            "Dispatcher::dispatch >> {msg_type} id: {}, thread: {}, connection: {:?}",
            ctx.message.id(),
            ctx.message.thread_id(),
            ctx.connection_id()
        );

        match handler.handle(&ctx).await {
            Ok(Some(outbound)) => self.sender.send_message(outbound).await?,
            Ok(None) => {}
            Err(err) => {
                let connection = match (&ctx.connection, err.problem()) {
                    (Some(connection), Some(_)) => connection,
                    _ => return Err(err),
                };
                let Some(problem) = err.into_problem() else {
                    return Ok(());
                };
                warn!(
                    "Dispatcher::dispatch >> answering {} with problem report {}",
                    ctx.message.id(),
                    problem.code
                );
                let outbound = self
                    .connections
                    .outbound_message(connection, problem.report)
                    .await?;
                self.sender.send_message(outbound).await?;
            }
        }

        self.events.emit(AgentEvent::MessageProcessed {
            message_id: ctx.message.id().to_owned(),
            message_type: msg_type.to_string(),
            connection_id: ctx.connection_id().map(ToOwned::to_owned),
        });
        Ok(())
    }
}
