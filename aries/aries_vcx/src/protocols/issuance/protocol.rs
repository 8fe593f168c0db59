use std::fmt::Debug;

use async_trait::async_trait;
use messages::{
    msg_fields::protocols::cred_issuance::v2::CredentialPreviewV2, msg_types::MessageType,
    AriesMessage,
};
use typed_builder::TypedBuilder;

use super::{format::CredentialFormatInputs, CredentialExchangeRecord};
use crate::{
    errors::error::VcxResult,
    protocols::{auto_accept::AutoAcceptPolicy, connection::ConnectionRecord},
    transport::InboundMessageContext,
};

/// Input for messages this agent opens or renegotiates a thread with.
#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct CredentialOptions {
    #[builder(default)]
    pub formats: CredentialFormatInputs,
    #[builder(default, setter(strip_option))]
    pub credential_preview: Option<CredentialPreviewV2>,
    #[builder(default, setter(strip_option))]
    pub comment: Option<String>,
    #[builder(default, setter(strip_option))]
    pub goal_code: Option<String>,
    #[builder(default, setter(strip_option))]
    pub auto_accept: Option<AutoAcceptPolicy>,
}

/// Input for answering the peer's last message. Formats without input
/// answer from the peer's attachment alone.
#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct AcceptCredentialOptions {
    #[builder(default)]
    pub formats: CredentialFormatInputs,
    #[builder(default, setter(strip_option))]
    pub credential_preview: Option<CredentialPreviewV2>,
    #[builder(default, setter(strip_option))]
    pub comment: Option<String>,
    #[builder(default, setter(strip_option))]
    pub auto_accept: Option<AutoAcceptPolicy>,
}

/// One version of the issue-credential protocol. Records remember the
/// version they were created with and are only ever handled by it.
///
/// `process_*` methods read the message from the context and fail with
/// [`crate::errors::error::AriesVcxErrorKind::ProblemReport`] when the peer
/// sent something unacceptable. `create_*`, `accept_*`, `negotiate_*` and
/// `decline_*` methods return the message to send.
#[async_trait]
pub trait CredentialProtocol: Send + Sync + Debug {
    fn version(&self) -> &'static str;

    fn supported_message_types(&self) -> Vec<MessageType>;

    async fn create_proposal(
        &self,
        connection: &ConnectionRecord,
        options: CredentialOptions,
    ) -> VcxResult<(CredentialExchangeRecord, AriesMessage)>;

    async fn process_proposal(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord>;

    async fn accept_proposal(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage>;

    /// Answers a proposal with an offer of different content.
    async fn negotiate_proposal(
        &self,
        record: &mut CredentialExchangeRecord,
        options: CredentialOptions,
    ) -> VcxResult<AriesMessage>;

    /// Without a connection the offer is meant to travel in an out-of-band
    /// invitation.
    async fn create_offer(
        &self,
        connection: Option<&ConnectionRecord>,
        options: CredentialOptions,
    ) -> VcxResult<(CredentialExchangeRecord, AriesMessage)>;

    async fn process_offer(&self, ctx: &InboundMessageContext)
        -> VcxResult<CredentialExchangeRecord>;

    async fn accept_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage>;

    /// Answers an offer with a proposal of different content.
    async fn negotiate_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        options: CredentialOptions,
    ) -> VcxResult<AriesMessage>;

    /// Returns the problem report telling the issuer.
    async fn decline_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage>;

    async fn process_request(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord>;

    async fn accept_request(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage>;

    /// Returns the problem report telling the holder.
    async fn decline_request(
        &self,
        record: &mut CredentialExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage>;

    async fn process_credential(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord>;

    /// Returns the ack for the issuer.
    async fn accept_credential(&self, record: &mut CredentialExchangeRecord)
        -> VcxResult<AriesMessage>;

    async fn process_ack(&self, ctx: &InboundMessageContext) -> VcxResult<CredentialExchangeRecord>;

    /// Problem report on the record's thread. Does not change the record.
    fn create_problem_report(
        &self,
        record: &CredentialExchangeRecord,
        description: Option<String>,
    ) -> AriesMessage;

    async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord>;

    async fn should_auto_respond_to_proposal(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_offer(&self, record: &CredentialExchangeRecord)
        -> VcxResult<bool>;

    async fn should_auto_respond_to_request(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_credential(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool>;

    async fn get_by_id(&self, id: &str) -> VcxResult<CredentialExchangeRecord>;

    /// Removes the record together with its message transcript.
    async fn delete_by_id(&self, id: &str) -> VcxResult<()>;
}
