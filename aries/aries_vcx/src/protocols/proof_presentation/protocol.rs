use std::fmt::Debug;

use async_trait::async_trait;
use messages::{msg_types::MessageType, AriesMessage};
use typed_builder::TypedBuilder;

use super::{format::ProofFormatInputs, ProofExchangeRecord};
use crate::{
    errors::error::VcxResult,
    protocols::{auto_accept::AutoAcceptPolicy, connection::ConnectionRecord},
    transport::InboundMessageContext,
};

#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct ProofOptions {
    #[builder(default)]
    pub formats: ProofFormatInputs,
    #[builder(default, setter(strip_option))]
    pub comment: Option<String>,
    #[builder(default, setter(strip_option))]
    pub goal_code: Option<String>,
    /// Asks the prover to wait for the verifier's ack.
    #[builder(default, setter(strip_option))]
    pub will_confirm: Option<bool>,
    #[builder(default, setter(strip_option))]
    pub auto_accept: Option<AutoAcceptPolicy>,
}

#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct AcceptProofOptions {
    #[builder(default)]
    pub formats: ProofFormatInputs,
    #[builder(default, setter(strip_option))]
    pub comment: Option<String>,
    #[builder(default, setter(strip_option))]
    pub auto_accept: Option<AutoAcceptPolicy>,
}

/// One version of the present-proof protocol, for both roles.
#[async_trait]
pub trait ProofProtocol: Send + Sync + Debug {
    fn version(&self) -> &'static str;

    fn supported_message_types(&self) -> Vec<MessageType>;

    async fn create_proposal(
        &self,
        connection: &ConnectionRecord,
        options: ProofOptions,
    ) -> VcxResult<(ProofExchangeRecord, AriesMessage)>;

    async fn process_proposal(&self, ctx: &InboundMessageContext)
        -> VcxResult<ProofExchangeRecord>;

    async fn accept_proposal(
        &self,
        record: &mut ProofExchangeRecord,
        options: AcceptProofOptions,
    ) -> VcxResult<AriesMessage>;

    async fn negotiate_proposal(
        &self,
        record: &mut ProofExchangeRecord,
        options: ProofOptions,
    ) -> VcxResult<AriesMessage>;

    /// Without a connection the request is meant to travel in an
    /// out-of-band invitation.
    async fn create_request(
        &self,
        connection: Option<&ConnectionRecord>,
        options: ProofOptions,
    ) -> VcxResult<(ProofExchangeRecord, AriesMessage)>;

    async fn process_request(&self, ctx: &InboundMessageContext) -> VcxResult<ProofExchangeRecord>;

    async fn accept_request(
        &self,
        record: &mut ProofExchangeRecord,
        options: AcceptProofOptions,
    ) -> VcxResult<AriesMessage>;

    /// Answers a request with a proposal of what the prover is willing to
    /// show instead.
    async fn negotiate_request(
        &self,
        record: &mut ProofExchangeRecord,
        options: ProofOptions,
    ) -> VcxResult<AriesMessage>;

    async fn decline_request(
        &self,
        record: &mut ProofExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage>;

    /// A presentation that fails verification abandons the record and
    /// fails with a problem report for the prover.
    async fn process_presentation(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<ProofExchangeRecord>;

    async fn accept_presentation(&self, record: &mut ProofExchangeRecord)
        -> VcxResult<AriesMessage>;

    async fn process_ack(&self, ctx: &InboundMessageContext) -> VcxResult<ProofExchangeRecord>;

    fn create_problem_report(
        &self,
        record: &ProofExchangeRecord,
        description: Option<String>,
    ) -> AriesMessage;

    async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<ProofExchangeRecord>;

    async fn should_auto_respond_to_proposal(&self, record: &ProofExchangeRecord)
        -> VcxResult<bool>;

    async fn should_auto_respond_to_request(&self, record: &ProofExchangeRecord) -> VcxResult<bool>;

    async fn should_auto_respond_to_presentation(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<bool>;

    async fn get_by_id(&self, id: &str) -> VcxResult<ProofExchangeRecord>;

    async fn delete_by_id(&self, id: &str) -> VcxResult<()>;
}
