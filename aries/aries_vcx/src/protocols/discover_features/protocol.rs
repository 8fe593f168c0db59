use std::{fmt::Debug, sync::Arc};

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use async_trait::async_trait;
use messages::{
    msg_fields::protocols::{
        discover_features::v2::{FeatureDisclosure, FeatureQuery},
        report_problem::ProblemReport,
    },
    msg_types::MessageType,
    AriesMessage,
};
use typed_builder::TypedBuilder;

use super::{
    registry::FeatureRegistry, DiscoverFeaturesData, DiscoverFeaturesRecord, DiscoverFeaturesRole,
    DiscoverFeaturesState,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::EventBus,
    protocols::{common::problem_report_reason, connection::ConnectionRecord},
    storage::Repository,
    transport::InboundMessageContext,
};

#[derive(Clone, Debug, TypedBuilder)]
pub struct QueryOptions {
    pub queries: Vec<FeatureQuery>,
    #[builder(default, setter(strip_option))]
    pub comment: Option<String>,
}

#[async_trait]
pub trait DiscoverFeaturesProtocol: Send + Sync + Debug {
    fn version(&self) -> &'static str;

    fn supported_message_types(&self) -> Vec<MessageType>;

    async fn create_query(
        &self,
        connection: &ConnectionRecord,
        options: QueryOptions,
    ) -> VcxResult<(DiscoverFeaturesRecord, AriesMessage)>;

    async fn process_query(&self, ctx: &InboundMessageContext)
        -> VcxResult<DiscoverFeaturesRecord>;

    /// Answers the stored queries from the registry.
    async fn create_disclosure(&self, record: &mut DiscoverFeaturesRecord)
        -> VcxResult<AriesMessage>;

    async fn process_disclosure(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<DiscoverFeaturesRecord>;
}

/// Record handling shared by both protocol versions.
#[derive(Clone, Debug)]
pub struct DiscoverFeaturesRecords {
    records: Repository<DiscoverFeaturesRecord>,
    events: EventBus,
    registry: Arc<FeatureRegistry>,
}

impl DiscoverFeaturesRecords {
    pub fn new(wallet: Arc<dyn BaseWallet>, events: EventBus, registry: Arc<FeatureRegistry>) -> Self {
        Self {
            records: Repository::new(wallet),
            events,
            registry,
        }
    }

    pub fn repository(&self) -> &Repository<DiscoverFeaturesRecord> {
        &self.records
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub(super) async fn query_sent(
        &self,
        thread_id: &str,
        connection: &ConnectionRecord,
        version: &str,
        queries: Vec<FeatureQuery>,
    ) -> VcxResult<DiscoverFeaturesRecord> {
        connection.assert_ready()?;
        let record = DiscoverFeaturesRecord::new(
            thread_id,
            DiscoverFeaturesRole::Requester,
            DiscoverFeaturesState::QuerySent,
            version,
            DiscoverFeaturesData {
                queries,
                disclosures: Vec::new(),
            },
        )
        .with_connection_id(Some(connection.id().to_owned()));
        self.records.save_and_emit(&self.events, &record).await?;
        Ok(record)
    }

    pub(super) async fn query_received(
        &self,
        ctx: &InboundMessageContext,
        version: &str,
        queries: Vec<FeatureQuery>,
    ) -> VcxResult<DiscoverFeaturesRecord> {
        let connection = ctx.assert_ready_connection()?;
        let thread_id = ctx.message.thread_id();
        if let Some(existing) = self
            .records
            .find_by_thread(thread_id, DiscoverFeaturesRole::Responder, Some(connection.id()))
            .await?
        {
            // A query always opens its thread, so only a replay can get here.
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::IllegalStateTransition,
                format!(
                    "Query on thread {thread_id} was already received, record is {}",
                    existing.state()
                ),
            ));
        }
        let record = DiscoverFeaturesRecord::new(
            thread_id,
            DiscoverFeaturesRole::Responder,
            DiscoverFeaturesState::QueryReceived,
            version,
            DiscoverFeaturesData {
                queries,
                disclosures: Vec::new(),
            },
        )
        .with_connection_id(Some(connection.id().to_owned()))
        .with_parent_thread_id(ctx.message.parent_thread_id().map(ToOwned::to_owned));
        self.records.save_and_emit(&self.events, &record).await?;
        Ok(record)
    }

    /// Features answering the record's queries, recorded as disclosed.
    pub(super) async fn disclose(
        &self,
        record: &mut DiscoverFeaturesRecord,
    ) -> VcxResult<Vec<FeatureDisclosure>> {
        record.assert_role(DiscoverFeaturesRole::Responder)?;
        let disclosures = self.registry.query(&record.data.queries);
        let previous = record.transition(
            &[DiscoverFeaturesState::QueryReceived],
            DiscoverFeaturesState::DisclosureSent,
        )?;
        record.data.disclosures = disclosures.clone();
        self.records
            .update_and_emit(&self.events, record, previous)
            .await?;
        Ok(disclosures)
    }

    pub(super) async fn disclosure_received(
        &self,
        ctx: &InboundMessageContext,
        disclosures: Vec<FeatureDisclosure>,
    ) -> VcxResult<DiscoverFeaturesRecord> {
        let mut record = self
            .records
            .get_by_thread(
                ctx.message.thread_id(),
                DiscoverFeaturesRole::Requester,
                ctx.connection_id(),
            )
            .await?;
        let previous = record.transition(
            &[DiscoverFeaturesState::QuerySent],
            DiscoverFeaturesState::DisclosureReceived,
        )?;
        record.data.disclosures = disclosures;
        self.records
            .update_and_emit(&self.events, &record, previous)
            .await?;
        Ok(record)
    }

    /// Abandons the exchange on the report's thread, if there is one still
    /// open. Discover features has no problem report of its own; peers use
    /// the generic one.
    pub async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
        report: &ProblemReport,
    ) -> VcxResult<Option<DiscoverFeaturesRecord>> {
        let Some(mut record) = self
            .records
            .find_by_thread_any_role(ctx.message.thread_id(), ctx.connection_id())
            .await?
        else {
            return Ok(None);
        };
        if record.is_terminal() {
            return Ok(Some(record));
        }
        let previous = record.abandon(problem_report_reason(&report.content))?;
        self.records
            .update_and_emit(&self.events, &record, previous)
            .await?;
        Ok(Some(record))
    }
}
