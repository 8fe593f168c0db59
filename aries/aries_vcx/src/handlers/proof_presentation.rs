use std::sync::Arc;

use async_trait::async_trait;
use messages::{
    msg_fields::protocols::present_proof::{v2::PresentProofV2, PresentProof},
    msg_types::MessageType,
    AriesMessage,
};

use super::MessageHandler;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        connection::{ConnectionService, ConnectionlessService},
        proof_presentation::{AcceptProofOptions, ProofExchangeRecord, ProofProtocol},
    },
    transport::{InboundMessageContext, OutboundMessage},
};

#[derive(Clone, Debug)]
pub struct ProofHandler {
    protocols: Vec<Arc<dyn ProofProtocol>>,
    connections: ConnectionService,
    connectionless: ConnectionlessService,
}

impl ProofHandler {
    pub fn new(
        protocols: Vec<Arc<dyn ProofProtocol>>,
        connections: ConnectionService,
        connectionless: ConnectionlessService,
    ) -> Self {
        Self {
            protocols,
            connections,
            connectionless,
        }
    }

    /// Whether to answer `record` right away. Without a connection the
    /// peer's `~service` is the only way back, and it must be known before
    /// anything is accepted.
    async fn auto_respond(
        &self,
        ctx: &InboundMessageContext,
        record: &ProofExchangeRecord,
        respond: bool,
    ) -> VcxResult<bool> {
        if ctx.connection.is_none() {
            self.connectionless
                .remember_their_service(record.id(), &ctx.message)
                .await?;
            if respond {
                self.connectionless.assert_route(record.id()).await?;
            }
        }
        Ok(respond)
    }

    fn protocol_for(&self, msg_type: &MessageType) -> VcxResult<&Arc<dyn ProofProtocol>> {
        self.protocols
            .iter()
            .find(|protocol| protocol.supported_message_types().contains(msg_type))
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::UnroutableMessage,
                    format!("No proof protocol handles {msg_type}"),
                )
            })
    }
}

#[async_trait]
impl MessageHandler for ProofHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        self.protocols
            .iter()
            .flat_map(|protocol| protocol.supported_message_types())
            .collect()
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let protocol = self.protocol_for(&ctx.message.msg_type())?;
        let AriesMessage::PresentProof(PresentProof::V2(message)) = &ctx.message else {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::UnroutableMessage,
                format!("ProofHandler cannot handle {}", ctx.message.msg_type()),
            ));
        };

        let (record, reply) = match message {
            PresentProofV2::ProposePresentation(_) => {
                let mut record = protocol.process_proposal(ctx).await?;
                let respond = protocol.should_auto_respond_to_proposal(&record).await?;
                if !self.auto_respond(ctx, &record, respond).await? {
                    return Ok(None);
                }
                let reply = protocol
                    .accept_proposal(&mut record, AcceptProofOptions::default())
                    .await?;
                (record, reply)
            }
            PresentProofV2::RequestPresentation(_) => {
                let mut record = protocol.process_request(ctx).await?;
                let respond = protocol.should_auto_respond_to_request(&record).await?;
                if !self.auto_respond(ctx, &record, respond).await? {
                    return Ok(None);
                }
                let reply = protocol
                    .accept_request(&mut record, AcceptProofOptions::default())
                    .await?;
                (record, reply)
            }
            PresentProofV2::Presentation(_) => {
                let mut record = protocol.process_presentation(ctx).await?;
                let respond = protocol.should_auto_respond_to_presentation(&record).await?;
                if !self.auto_respond(ctx, &record, respond).await? {
                    return Ok(None);
                }
                let reply = protocol.accept_presentation(&mut record).await?;
                (record, reply)
            }
            PresentProofV2::Ack(_) => {
                protocol.process_ack(ctx).await?;
                return Ok(None);
            }
            PresentProofV2::ProblemReport(_) => {
                protocol.process_problem_report(ctx).await?;
                return Ok(None);
            }
        };

        let outbound = match &ctx.connection {
            Some(connection) => self.connections.outbound_message(connection, reply).await?,
            None => {
                self.connectionless
                    .outbound_message(record.id(), reply)
                    .await?
            }
        };
        Ok(Some(outbound))
    }
}
