use async_trait::async_trait;
use messages::{
    decorators::timing::Timing,
    msg_fields::protocols::discover_features::{
        v2::{
            DiscoverFeaturesV2, Disclosures, DisclosuresContent, DisclosuresDecorators, Queries,
            QueriesContent, QueriesDecorators,
        },
        DiscoverFeatures,
    },
    msg_types::{DiscoverFeaturesV2Kind, MessageKind, MessageType},
    AriesMessage,
};
use strum::IntoEnumIterator;

use super::{
    protocol::{DiscoverFeaturesProtocol, DiscoverFeaturesRecords, QueryOptions},
    DiscoverFeaturesRecord, DISCOVER_FEATURES_V2,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        common::{new_message_id, record_thread},
        connection::ConnectionRecord,
    },
    transport::InboundMessageContext,
};

/// Discover features 2.0: any number of protocol and goal code queries.
#[derive(Clone, Debug)]
pub struct DiscoverFeaturesV2Protocol {
    records: DiscoverFeaturesRecords,
}

impl DiscoverFeaturesV2Protocol {
    pub fn new(records: DiscoverFeaturesRecords) -> Self {
        Self { records }
    }
}

fn v2_message(message: &AriesMessage) -> Option<&DiscoverFeaturesV2> {
    match message {
        AriesMessage::DiscoverFeatures(DiscoverFeatures::V2(msg)) => Some(msg),
        _ => None,
    }
}

fn unexpected(message: &AriesMessage, expected: DiscoverFeaturesV2Kind) -> AriesVcxError {
    AriesVcxError::from_msg(
        AriesVcxErrorKind::InvalidInput,
        format!("Expected {}, got {}", expected.msg_type(), message.msg_type()),
    )
}

#[async_trait]
impl DiscoverFeaturesProtocol for DiscoverFeaturesV2Protocol {
    fn version(&self) -> &'static str {
        DISCOVER_FEATURES_V2
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        DiscoverFeaturesV2Kind::iter()
            .map(|kind| kind.msg_type())
            .collect()
    }

    async fn create_query(
        &self,
        connection: &ConnectionRecord,
        options: QueryOptions,
    ) -> VcxResult<(DiscoverFeaturesRecord, AriesMessage)> {
        if options.queries.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "Discover features query without queries",
            ));
        }
        let message = Queries::with_decorators(
            new_message_id(),
            QueriesContent {
                queries: options.queries.clone(),
            },
            QueriesDecorators {
                timing: Some(Timing::out_now()),
            },
        );
        let record = self
            .records
            .query_sent(&message.id, connection, DISCOVER_FEATURES_V2, options.queries)
            .await?;
        Ok((record, message.into()))
    }

    async fn process_query(&self, ctx: &InboundMessageContext) -> VcxResult<DiscoverFeaturesRecord> {
        let Some(DiscoverFeaturesV2::Queries(queries)) = v2_message(&ctx.message) else {
            return Err(unexpected(&ctx.message, DiscoverFeaturesV2Kind::Queries));
        };
        self.records
            .query_received(ctx, DISCOVER_FEATURES_V2, queries.content.queries.clone())
            .await
    }

    async fn create_disclosure(
        &self,
        record: &mut DiscoverFeaturesRecord,
    ) -> VcxResult<AriesMessage> {
        let disclosures = self.records.disclose(record).await?;
        Ok(Disclosures::with_decorators(
            new_message_id(),
            DisclosuresContent { disclosures },
            DisclosuresDecorators {
                thread: record_thread(record),
                timing: Some(Timing::out_now()),
            },
        )
        .into())
    }

    async fn process_disclosure(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<DiscoverFeaturesRecord> {
        let Some(DiscoverFeaturesV2::Disclosures(disclosures)) = v2_message(&ctx.message) else {
            return Err(unexpected(&ctx.message, DiscoverFeaturesV2Kind::Disclosures));
        };
        self.records
            .disclosure_received(ctx, disclosures.content.disclosures.clone())
            .await
    }
}
