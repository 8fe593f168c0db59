use std::{collections::HashMap, fmt::Debug};

use async_trait::async_trait;
use messages::decorators::attachment::Attachment;
use serde_json::Value;

use super::ProofExchangeRecord;
use crate::{errors::error::VcxResult, protocols::common::FormatAttachment};

/// Format specific input keyed by [`ProofFormatService::key`].
pub type ProofFormatInputs = HashMap<String, Value>;

/// Outcome of checking a presentation. An invalid presentation is not an
/// error of the format service; the protocol decides what to do with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationVerification {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl PresentationVerification {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

#[async_trait]
pub trait ProofFormatService: Send + Sync + Debug {
    fn key(&self) -> &'static str;

    fn format(&self) -> &'static str;

    fn supports_format(&self, format: &str) -> bool {
        format == self.format()
    }

    async fn create_proposal(
        &self,
        record: &ProofExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment>;

    async fn process_proposal(
        &self,
        record: &ProofExchangeRecord,
        proposal: &Attachment,
    ) -> VcxResult<()>;

    /// Builds a request answering `proposal`.
    async fn accept_proposal(
        &self,
        record: &ProofExchangeRecord,
        proposal: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment>;

    async fn create_request(
        &self,
        record: &ProofExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment>;

    async fn process_request(
        &self,
        record: &ProofExchangeRecord,
        request: &Attachment,
    ) -> VcxResult<()>;

    /// Builds the presentation. Without input the service picks what to
    /// present on its own.
    async fn accept_request(
        &self,
        record: &ProofExchangeRecord,
        request: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment>;

    /// Fails only on malformed attachments.
    async fn process_presentation(
        &self,
        record: &ProofExchangeRecord,
        request: &Attachment,
        presentation: &Attachment,
    ) -> VcxResult<PresentationVerification>;

    // Comparators look at what is requested, never at nonces or versions.

    async fn should_auto_respond_to_proposal(
        &self,
        record: &ProofExchangeRecord,
        proposal: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_request(
        &self,
        record: &ProofExchangeRecord,
        proposal: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool>;

    async fn should_auto_respond_to_presentation(
        &self,
        record: &ProofExchangeRecord,
        proposal: Option<&Attachment>,
        request: &Attachment,
        presentation: &Attachment,
    ) -> VcxResult<bool>;
}
