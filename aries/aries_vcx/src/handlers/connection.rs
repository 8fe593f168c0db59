use async_trait::async_trait;
use messages::{
    msg_fields::protocols::{
        did_exchange::DidExchange, did_rotate::DidRotate, out_of_band::OutOfBand,
    },
    msg_types::{DidExchangeKind, DidRotateKind, MessageKind, MessageType, OutOfBandKind},
    AriesMessage,
};
use strum::IntoEnumIterator;

use super::MessageHandler;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        connection::ConnectionService, did_exchange::DidExchangeService,
        did_rotate::DidRotateService, out_of_band::OutOfBandService,
    },
    transport::{InboundMessageContext, OutboundMessage},
};

fn misrouted(message: &AriesMessage, handler: &str) -> AriesVcxError {
    AriesVcxError::from_msg(
        AriesVcxErrorKind::UnroutableMessage,
        format!("{handler} cannot handle {}", message.msg_type()),
    )
}

#[derive(Clone, Debug)]
pub struct DidExchangeHandler {
    did_exchange: DidExchangeService,
}

impl DidExchangeHandler {
    pub fn new(did_exchange: DidExchangeService) -> Self {
        Self { did_exchange }
    }

    fn connections(&self) -> &ConnectionService {
        self.did_exchange.connections()
    }
}

#[async_trait]
impl MessageHandler for DidExchangeHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        DidExchangeKind::iter().map(|kind| kind.msg_type()).collect()
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let AriesMessage::DidExchange(message) = &ctx.message else {
            return Err(misrouted(&ctx.message, "DidExchangeHandler"));
        };
        match message {
            DidExchange::Request(request) => {
                let mut connection = self.did_exchange.process_request(ctx, request).await?;
                if !self.did_exchange.should_auto_accept(&connection) {
                    return Ok(None);
                }
                info!(
                    "DidExchangeHandler::handle >> auto accepting request on connection {}",
                    connection.id()
                );
                let response = self.did_exchange.create_response(&mut connection).await?;
                Ok(Some(
                    self.connections()
                        .outbound_message(&connection, response)
                        .await?,
                ))
            }
            DidExchange::Response(response) => {
                let mut connection = self.did_exchange.process_response(ctx, response).await?;
                if !self.did_exchange.should_auto_accept(&connection) {
                    return Ok(None);
                }
                let complete = self.did_exchange.create_complete(&mut connection).await?;
                Ok(Some(
                    self.connections()
                        .outbound_message(&connection, complete)
                        .await?,
                ))
            }
            DidExchange::Complete(complete) => {
                self.did_exchange.process_complete(ctx, complete).await?;
                Ok(None)
            }
            DidExchange::ProblemReport(report) => {
                self.did_exchange.process_problem_report(report).await?;
                Ok(None)
            }
        }
    }
}

/// Handshake reuse. Invitations travel out of band and never reach the
/// dispatcher.
#[derive(Clone, Debug)]
pub struct OutOfBandHandler {
    out_of_band: OutOfBandService,
    connections: ConnectionService,
}

impl OutOfBandHandler {
    pub fn new(out_of_band: OutOfBandService, connections: ConnectionService) -> Self {
        Self {
            out_of_band,
            connections,
        }
    }
}

#[async_trait]
impl MessageHandler for OutOfBandHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        vec![
            OutOfBandKind::HandshakeReuse.msg_type(),
            OutOfBandKind::HandshakeReuseAccepted.msg_type(),
        ]
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        match &ctx.message {
            AriesMessage::OutOfBand(OutOfBand::HandshakeReuse(reuse)) => {
                let accepted = self.out_of_band.process_handshake_reuse(ctx, reuse).await?;
                let connection = ctx.assert_ready_connection()?;
                Ok(Some(
                    self.connections
                        .outbound_message(connection, accepted)
                        .await?,
                ))
            }
            AriesMessage::OutOfBand(OutOfBand::HandshakeReuseAccepted(accepted)) => {
                self.out_of_band
                    .process_handshake_reuse_accepted(ctx, accepted)
                    .await?;
                Ok(None)
            }
            other => Err(misrouted(other, "OutOfBandHandler")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DidRotateHandler {
    did_rotate: DidRotateService,
    connections: ConnectionService,
}

impl DidRotateHandler {
    pub fn new(did_rotate: DidRotateService, connections: ConnectionService) -> Self {
        Self {
            did_rotate,
            connections,
        }
    }
}

#[async_trait]
impl MessageHandler for DidRotateHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        DidRotateKind::iter().map(|kind| kind.msg_type()).collect()
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let AriesMessage::DidRotate(message) = &ctx.message else {
            return Err(misrouted(&ctx.message, "DidRotateHandler"));
        };
        match message {
            DidRotate::Rotate(rotate) => {
                let ack = self.did_rotate.process_rotate(ctx, rotate).await?;
                // The ack goes to the DID the peer rotated away from, which
                // the routed connection still carries.
                let connection = ctx.assert_ready_connection()?;
                Ok(Some(
                    self.connections.outbound_message(connection, ack).await?,
                ))
            }
            DidRotate::Ack(ack) => {
                self.did_rotate.process_rotate_ack(ctx, ack).await?;
                Ok(None)
            }
            DidRotate::ProblemReport(report) => {
                self.did_rotate.process_problem_report(ctx, report).await?;
                Ok(None)
            }
            DidRotate::Hangup(hangup) => {
                self.did_rotate.process_hangup(ctx, hangup).await?;
                Ok(None)
            }
        }
    }
}
