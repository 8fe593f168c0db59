use async_trait::async_trait;
use messages::{
    decorators::timing::Timing,
    msg_fields::protocols::discover_features::{
        v1::{
            Disclose, DiscloseContent, DiscloseDecorators, DiscoverFeaturesV1, ProtocolDescriptor,
            Query, QueryContent, QueryDecorators,
        },
        v2::{FeatureDisclosure, FeatureQuery},
        DiscoverFeatures, FeatureType,
    },
    msg_types::{DiscoverFeaturesV1Kind, MessageKind, MessageType},
    AriesMessage,
};
use strum::IntoEnumIterator;

use super::{
    protocol::{DiscoverFeaturesProtocol, DiscoverFeaturesRecords, QueryOptions},
    DiscoverFeaturesRecord, DISCOVER_FEATURES_V1,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        common::{new_message_id, record_thread},
        connection::ConnectionRecord,
    },
    transport::InboundMessageContext,
};

/// Discover features 1.0. Only protocols can be queried, one pattern per
/// query.
#[derive(Clone, Debug)]
pub struct DiscoverFeaturesV1Protocol {
    records: DiscoverFeaturesRecords,
}

impl DiscoverFeaturesV1Protocol {
    pub fn new(records: DiscoverFeaturesRecords) -> Self {
        Self { records }
    }
}

fn v1_message(message: &AriesMessage) -> Option<&DiscoverFeaturesV1> {
    match message {
        AriesMessage::DiscoverFeatures(DiscoverFeatures::V1(msg)) => Some(msg),
        _ => None,
    }
}

fn unexpected(message: &AriesMessage, expected: DiscoverFeaturesV1Kind) -> AriesVcxError {
    AriesVcxError::from_msg(
        AriesVcxErrorKind::InvalidInput,
        format!("Expected {}, got {}", expected.msg_type(), message.msg_type()),
    )
}

#[async_trait]
impl DiscoverFeaturesProtocol for DiscoverFeaturesV1Protocol {
    fn version(&self) -> &'static str {
        DISCOVER_FEATURES_V1
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        DiscoverFeaturesV1Kind::iter()
            .map(|kind| kind.msg_type())
            .collect()
    }

    async fn create_query(
        &self,
        connection: &ConnectionRecord,
        options: QueryOptions,
    ) -> VcxResult<(DiscoverFeaturesRecord, AriesMessage)> {
        let query = match options.queries.as_slice() {
            [query] if query.feature_type == FeatureType::Protocol => query.match_.clone(),
            _ => {
                return Err(AriesVcxError::from_msg(
                    AriesVcxErrorKind::InvalidInput,
                    "Discover features 1.0 takes exactly one protocol query",
                ))
            }
        };

        let message = Query::with_decorators(
            new_message_id(),
            QueryContent {
                query,
                comment: options.comment,
            },
            QueryDecorators {
                timing: Some(Timing::out_now()),
            },
        );
        let record = self
            .records
            .query_sent(&message.id, connection, DISCOVER_FEATURES_V1, options.queries)
            .await?;
        Ok((record, message.into()))
    }

    async fn process_query(&self, ctx: &InboundMessageContext) -> VcxResult<DiscoverFeaturesRecord> {
        let Some(DiscoverFeaturesV1::Query(query)) = v1_message(&ctx.message) else {
            return Err(unexpected(&ctx.message, DiscoverFeaturesV1Kind::Query));
        };
        let queries = vec![FeatureQuery::new(
            FeatureType::Protocol,
            query.content.query.clone(),
        )];
        self.records
            .query_received(ctx, DISCOVER_FEATURES_V1, queries)
            .await
    }

    async fn create_disclosure(
        &self,
        record: &mut DiscoverFeaturesRecord,
    ) -> VcxResult<AriesMessage> {
        let protocols = self
            .records
            .disclose(record)
            .await?
            .into_iter()
            .filter(|feature| feature.feature_type == FeatureType::Protocol)
            .map(|feature| ProtocolDescriptor {
                pid: feature.id,
                roles: feature.roles,
            })
            .collect();
        Ok(Disclose::with_decorators(
            new_message_id(),
            DiscloseContent { protocols },
            DiscloseDecorators {
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
        let Some(DiscoverFeaturesV1::Disclose(disclose)) = v1_message(&ctx.message) else {
            return Err(unexpected(&ctx.message, DiscoverFeaturesV1Kind::Disclose));
        };
        let disclosures = disclose
            .content
            .protocols
            .iter()
            .map(|protocol| FeatureDisclosure {
                feature_type: FeatureType::Protocol,
                id: protocol.pid.clone(),
                roles: protocol.roles.clone(),
            })
            .collect();
        self.records.disclosure_received(ctx, disclosures).await
    }
}
