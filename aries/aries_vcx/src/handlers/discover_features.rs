use std::sync::Arc;

use async_trait::async_trait;
use messages::{
    msg_fields::protocols::discover_features::{
        v1::DiscoverFeaturesV1, v2::DiscoverFeaturesV2, DiscoverFeatures,
    },
    msg_types::MessageType,
    AriesMessage,
};

use super::MessageHandler;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{connection::ConnectionService, discover_features::DiscoverFeaturesProtocol},
    transport::{InboundMessageContext, OutboundMessage},
};

#[derive(Clone, Debug)]
pub struct DiscoverFeaturesHandler {
    protocols: Vec<Arc<dyn DiscoverFeaturesProtocol>>,
    connections: ConnectionService,
    /// Answer queries without asking the application first.
    auto_respond: bool,
}

impl DiscoverFeaturesHandler {
    pub fn new(
        protocols: Vec<Arc<dyn DiscoverFeaturesProtocol>>,
        connections: ConnectionService,
        auto_respond: bool,
    ) -> Self {
        Self {
            protocols,
            connections,
            auto_respond,
        }
    }
}

#[async_trait]
impl MessageHandler for DiscoverFeaturesHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        self.protocols
            .iter()
            .flat_map(|protocol| protocol.supported_message_types())
            .collect()
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let msg_type = ctx.message.msg_type();
        let protocol = self
            .protocols
            .iter()
            .find(|protocol| protocol.supported_message_types().contains(&msg_type))
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::UnroutableMessage,
                    format!("No discover features protocol handles {msg_type}"),
                )
            })?;

        match &ctx.message {
            AriesMessage::DiscoverFeatures(
                DiscoverFeatures::V1(DiscoverFeaturesV1::Query(_))
                | DiscoverFeatures::V2(DiscoverFeaturesV2::Queries(_)),
            ) => {
                let mut record = protocol.process_query(ctx).await?;
                if !self.auto_respond {
                    return Ok(None);
                }
                let disclosure = protocol.create_disclosure(&mut record).await?;
                let connection = ctx.assert_ready_connection()?;
                Ok(Some(
                    self.connections
                        .outbound_message(connection, disclosure)
                        .await?,
                ))
            }
            AriesMessage::DiscoverFeatures(_) => {
                protocol.process_disclosure(ctx).await?;
                Ok(None)
            }
            other => Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::UnroutableMessage,
                format!("DiscoverFeaturesHandler cannot handle {}", other.msg_type()),
            )),
        }
    }
}
