//! Presentations of attributes held in credentials of the JSON credential
//! format. The verifier may pin expected values; a presentation is valid
//! when it answers the request nonce and reveals every requested attribute
//! with the pinned value, if any.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use async_trait::async_trait;
use messages::decorators::attachment::Attachment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{
    format::{PresentationVerification, ProofFormatService},
    ProofExchangeRecord,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        common::{attachment_json, new_message_id, FormatAttachment},
        issuance::json_format::JsonCredentialRecord,
    },
    storage::Repository,
};

pub const JSON_PROOF_KEY: &str = "json";
pub const JSON_PROOF_FORMAT: &str = "aries/vcx-json-proof@v1.0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct JsonProofProposal {
    requested_attributes: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct JsonProofRequest {
    requested_attributes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    expected: BTreeMap<String, String>,
    nonce: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct JsonPresentation {
    revealed: BTreeMap<String, String>,
    nonce: String,
}

#[derive(Debug, Default, Deserialize)]
struct RequestInput {
    #[serde(default)]
    requested_attributes: BTreeSet<String>,
    #[serde(default)]
    expected: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PresentationInput {
    revealed: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct JsonProofFormat {
    credentials: Repository<JsonCredentialRecord>,
}

impl JsonProofFormat {
    pub fn new(wallet: Arc<dyn BaseWallet>) -> Self {
        Self {
            credentials: Repository::new(wallet),
        }
    }

    fn attachment(&self, value: impl Serialize) -> VcxResult<FormatAttachment> {
        Ok(FormatAttachment::new(
            JSON_PROOF_FORMAT,
            Attachment::json(new_message_id(), serde_json::to_value(value)?),
        ))
    }

    /// Takes each requested attribute from the first stored credential
    /// holding it.
    async fn reveal_from_wallet(
        &self,
        requested: &BTreeSet<String>,
    ) -> VcxResult<BTreeMap<String, String>> {
        let credentials = self.credentials.get_all().await?;
        requested
            .iter()
            .map(|name| {
                credentials
                    .iter()
                    .find_map(|credential| credential.attributes.get(name))
                    .map(|value| (name.clone(), value.clone()))
                    .ok_or_else(|| {
                        AriesVcxError::from_msg(
                            AriesVcxErrorKind::InvalidInput,
                            format!("No stored JSON credential has attribute {name}"),
                        )
                    })
            })
            .collect()
    }
}

fn request_input(input: &Value) -> VcxResult<RequestInput> {
    let input: RequestInput = serde_json::from_value(input.clone())?;
    if input.requested_attributes.is_empty() {
        return Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            "JSON proof request input needs requested_attributes",
        ));
    }
    Ok(input)
}

fn verify(request: &JsonProofRequest, presentation: &JsonPresentation) -> PresentationVerification {
    if request.nonce != presentation.nonce {
        return PresentationVerification::invalid("Presentation does not answer the request nonce");
    }
    for name in &request.requested_attributes {
        let Some(value) = presentation.revealed.get(name) else {
            return PresentationVerification::invalid(format!("Attribute {name} was not revealed"));
        };
        if request.expected.get(name).is_some_and(|expected| expected != value) {
            return PresentationVerification::invalid(format!(
                "Attribute {name} does not have the expected value"
            ));
        }
    }
    PresentationVerification::valid()
}

#[async_trait]
impl ProofFormatService for JsonProofFormat {
    fn key(&self) -> &'static str {
        JSON_PROOF_KEY
    }

    fn format(&self) -> &'static str {
        JSON_PROOF_FORMAT
    }

    async fn create_proposal(
        &self,
        _record: &ProofExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment> {
        let input = request_input(input)?;
        self.attachment(JsonProofProposal {
            requested_attributes: input.requested_attributes,
        })
    }

    async fn process_proposal(
        &self,
        _record: &ProofExchangeRecord,
        proposal: &Attachment,
    ) -> VcxResult<()> {
        attachment_json::<JsonProofProposal>(proposal)?;
        Ok(())
    }

    async fn accept_proposal(
        &self,
        _record: &ProofExchangeRecord,
        proposal: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment> {
        let proposal: JsonProofProposal = attachment_json(proposal)?;
        let input = input.map(request_input).transpose()?;
        let (requested_attributes, expected) = match input {
            Some(input) => (input.requested_attributes, input.expected),
            None => (proposal.requested_attributes, BTreeMap::new()),
        };
        self.attachment(JsonProofRequest {
            requested_attributes,
            expected,
            nonce: Uuid::new_v4().simple().to_string(),
        })
    }

    async fn create_request(
        &self,
        _record: &ProofExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment> {
        let input = request_input(input)?;
        self.attachment(JsonProofRequest {
            requested_attributes: input.requested_attributes,
            expected: input.expected,
            nonce: Uuid::new_v4().simple().to_string(),
        })
    }

    async fn process_request(
        &self,
        _record: &ProofExchangeRecord,
        request: &Attachment,
    ) -> VcxResult<()> {
        let request: JsonProofRequest = attachment_json(request)?;
        if request.requested_attributes.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "JSON proof request asks for nothing",
            ));
        }
        Ok(())
    }

    async fn accept_request(
        &self,
        _record: &ProofExchangeRecord,
        request: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment> {
        let request: JsonProofRequest = attachment_json(request)?;
        let revealed = match input {
            Some(input) => serde_json::from_value::<PresentationInput>(input.clone())?.revealed,
            None => self.reveal_from_wallet(&request.requested_attributes).await?,
        };
        self.attachment(JsonPresentation {
            revealed,
            nonce: request.nonce,
        })
    }

    async fn process_presentation(
        &self,
        _record: &ProofExchangeRecord,
        request: &Attachment,
        presentation: &Attachment,
    ) -> VcxResult<PresentationVerification> {
        let request: JsonProofRequest = attachment_json(request)?;
        let presentation: JsonPresentation = attachment_json(presentation)?;
        Ok(verify(&request, &presentation))
    }

    async fn should_auto_respond_to_proposal(
        &self,
        _record: &ProofExchangeRecord,
        proposal: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool> {
        let proposal: JsonProofProposal = attachment_json(proposal)?;
        let request: JsonProofRequest = attachment_json(request)?;
        Ok(proposal.requested_attributes == request.requested_attributes)
    }

    async fn should_auto_respond_to_request(
        &self,
        record: &ProofExchangeRecord,
        proposal: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool> {
        self.should_auto_respond_to_proposal(record, proposal, request)
            .await
    }

    async fn should_auto_respond_to_presentation(
        &self,
        _record: &ProofExchangeRecord,
        _proposal: Option<&Attachment>,
        _request: &Attachment,
        _presentation: &Attachment,
    ) -> VcxResult<bool> {
        // Verification already happened when the presentation arrived.
        Ok(true)
    }
}

/// Request input for [`JsonProofFormat`].
pub fn json_proof_request_input<'a>(
    requested_attributes: impl IntoIterator<Item = &'a str>,
    expected: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Value {
    let requested: BTreeSet<&str> = requested_attributes.into_iter().collect();
    let expected: BTreeMap<&str, &str> = expected.into_iter().collect();
    json!({ "requested_attributes": requested, "expected": expected })
}

/// Presentation input revealing exactly the given values.
pub fn json_presentation_input<'a>(
    revealed: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Value {
    let revealed: BTreeMap<&str, &str> = revealed.into_iter().collect();
    json!({ "revealed": revealed })
}
