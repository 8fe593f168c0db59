use std::{collections::HashMap, fmt::Debug};

use async_trait::async_trait;
use messages::decorators::attachment::Attachment;
use serde_json::Value;

use super::CredentialExchangeRecord;
use crate::{errors::error::VcxResult, protocols::common::FormatAttachment};

/// Format specific input for creating or accepting a message, keyed by
/// [`CredentialFormatService::key`].
pub type CredentialFormatInputs = HashMap<String, Value>;

/// Encodes and checks the attachments of one credential format. The
/// `process_*` methods fail on content the peer got wrong; the protocol
/// reports those failures back to the peer.
#[async_trait]
pub trait CredentialFormatService: Send + Sync + Debug {
    /// Short name under which callers pass input for this format.
    fn key(&self) -> &'static str;

    /// Format identifier placed in the `formats` field of messages.
    fn format(&self) -> &'static str;

    fn supports_format(&self, format: &str) -> bool {
        format == self.format()
    }

    async fn create_proposal(
        &self,
        record: &CredentialExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment>;

    async fn process_proposal(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &Attachment,
    ) -> VcxResult<()>;

    /// Builds an offer answering `proposal`. Without input the offer
    /// mirrors the proposal.
    async fn accept_proposal(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment>;

    async fn create_offer(
        &self,
        record: &CredentialExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment>;

    async fn process_offer(
        &self,
        record: &CredentialExchangeRecord,
        offer: &Attachment,
    ) -> VcxResult<()>;

    async fn accept_offer(
        &self,
        record: &CredentialExchangeRecord,
        offer: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment>;

    async fn process_request(
        &self,
        record: &CredentialExchangeRecord,
        request: &Attachment,
    ) -> VcxResult<()>;

    /// Issues the credential. `offer` is absent when the holder opened the
    /// thread with a request.
    async fn accept_request(
        &self,
        record: &CredentialExchangeRecord,
        offer: Option<&Attachment>,
        request: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment>;

    /// Checks and stores a received credential, returning the id it is
    /// stored under.
    async fn process_credential(
        &self,
        record: &CredentialExchangeRecord,
        request: &Attachment,
        credential: &Attachment,
    ) -> VcxResult<String>;

    // The comparators below must only look at what the credential says,
    // never at nonces or format versions.

    async fn should_auto_respond_to_proposal(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &Attachment,
        offer: &Attachment,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_offer(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &Attachment,
        offer: &Attachment,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_request(
        &self,
        record: &CredentialExchangeRecord,
        proposal: Option<&Attachment>,
        offer: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_credential(
        &self,
        record: &CredentialExchangeRecord,
        request: &Attachment,
        credential: &Attachment,
    ) -> VcxResult<bool>;
}
