use std::sync::Arc;

use async_trait::async_trait;
use messages::{
    msg_fields::protocols::cred_issuance::{v2::CredentialIssuanceV2, CredentialIssuance},
    msg_types::MessageType,
    AriesMessage,
};

use super::MessageHandler;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        connection::{ConnectionService, ConnectionlessService},
        issuance::{AcceptCredentialOptions, CredentialExchangeRecord, CredentialProtocol},
    },
    transport::{InboundMessageContext, OutboundMessage},
};

/// Runs every issue-credential message through the protocol version it
/// belongs to, answering right away when the auto accept policy allows.
#[derive(Clone, Debug)]
pub struct CredentialHandler {
    protocols: Vec<Arc<dyn CredentialProtocol>>,
    connections: ConnectionService,
    connectionless: ConnectionlessService,
}

impl CredentialHandler {
    pub fn new(
        protocols: Vec<Arc<dyn CredentialProtocol>>,
        connections: ConnectionService,
        connectionless: ConnectionlessService,
    ) -> Self {
        Self {
            protocols,
            connections,
            connectionless,
        }
    }

    fn protocol_for(&self, msg_type: &MessageType) -> VcxResult<&Arc<dyn CredentialProtocol>> {
        self.protocols
            .iter()
            .find(|protocol| protocol.supported_message_types().contains(msg_type))
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::UnroutableMessage,
                    format!("No credential protocol handles {msg_type}"),
                )
            })
    }

    async fn reply(
        &self,
        ctx: &InboundMessageContext,
        record: &CredentialExchangeRecord,
        message: AriesMessage,
    ) -> VcxResult<Option<OutboundMessage>> {
        let outbound = match &ctx.connection {
            Some(connection) => self.connections.outbound_message(connection, message).await?,
            None => {
                self.connectionless
                    .outbound_message(record.id(), message)
                    .await?
            }
        };
        Ok(Some(outbound))
    }
}

#[async_trait]
impl MessageHandler for CredentialHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        self.protocols
            .iter()
            .flat_map(|protocol| protocol.supported_message_types())
            .collect()
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let protocol = self.protocol_for(&ctx.message.msg_type())?;
        let AriesMessage::CredentialIssuance(CredentialIssuance::V2(message)) = &ctx.message else {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::UnroutableMessage,
                format!("CredentialHandler cannot handle {}", ctx.message.msg_type()),
            ));
        };

        let (mut record, respond) = match message {
            CredentialIssuanceV2::ProposeCredential(_) => {
                let record = protocol.process_proposal(ctx).await?;
                let respond = protocol.should_auto_respond_to_proposal(&record).await?;
                (record, respond)
            }
            CredentialIssuanceV2::OfferCredential(_) => {
                let record = protocol.process_offer(ctx).await?;
                let respond = protocol.should_auto_respond_to_offer(&record).await?;
                (record, respond)
            }
            CredentialIssuanceV2::RequestCredential(_) => {
                let record = protocol.process_request(ctx).await?;
                let respond = protocol.should_auto_respond_to_request(&record).await?;
                (record, respond)
            }
            CredentialIssuanceV2::IssueCredential(_) => {
                let record = protocol.process_credential(ctx).await?;
                let respond = protocol.should_auto_respond_to_credential(&record).await?;
                (record, respond)
            }
            CredentialIssuanceV2::Ack(_) => {
                protocol.process_ack(ctx).await?;
                return Ok(None);
            }
            CredentialIssuanceV2::ProblemReport(_) => {
                protocol.process_problem_report(ctx).await?;
                return Ok(None);
            }
        };

        if ctx.connection.is_none() {
            self.connectionless
                .remember_their_service(record.id(), &ctx.message)
                .await?;
        }

        if !respond {
            debug!(
                "CredentialHandler::handle << record {} waits in state {}",
                record.id(),
                record.state()
            );
            return Ok(None);
        }
        info!(
            "CredentialHandler::handle >> auto responding on record {} in state {}",
            record.id(),
            record.state()
        );
        if ctx.connection.is_none() {
            self.connectionless.assert_route(record.id()).await?;
        }
        let reply = match message {
            CredentialIssuanceV2::ProposeCredential(_) => {
                protocol
                    .accept_proposal(&mut record, AcceptCredentialOptions::default())
                    .await?
            }
            CredentialIssuanceV2::OfferCredential(_) => {
                protocol
                    .accept_offer(&mut record, AcceptCredentialOptions::default())
                    .await?
            }
            CredentialIssuanceV2::RequestCredential(_) => {
                protocol
                    .accept_request(&mut record, AcceptCredentialOptions::default())
                    .await?
            }
            _ => protocol.accept_credential(&mut record).await?,
        };
        self.reply(ctx, &record, reply).await
    }
}
