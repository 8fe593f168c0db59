//! A credential format whose credentials are plain JSON attribute maps,
//! bound to the exchange by a nonce. Carries no cryptography; it exists so
//! the protocol can run end to end without a ledger.

use std::{collections::BTreeMap, sync::Arc};

use aries_vcx_wallet::wallet::base_wallet::{record_tags::RecordTags, BaseWallet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use messages::decorators::attachment::Attachment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{format::CredentialFormatService, CredentialExchangeRecord};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::common::{attachment_json, new_message_id, FormatAttachment},
    storage::{Repository, StorageRecord},
};

pub const JSON_CREDENTIAL_KEY: &str = "json";
pub const JSON_CREDENTIAL_FORMAT: &str = "aries/vcx-json-credential@v1.0";

type Attributes = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct JsonCredentialInput {
    #[serde(default)]
    attributes: Option<Attributes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct JsonCredentialProposal {
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct JsonCredentialOffer {
    attributes: Attributes,
    nonce: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct JsonCredentialRequest {
    attributes: Attributes,
    nonce: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct JsonCredential {
    attributes: Attributes,
    nonce: String,
    issued_at: DateTime<Utc>,
}

/// A credential received through [`JsonCredentialFormat`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonCredentialRecord {
    id: String,
    credential_exchange_id: String,
    pub attributes: BTreeMap<String, String>,
    pub issued_at: DateTime<Utc>,
}

impl JsonCredentialRecord {
    pub fn credential_exchange_id(&self) -> &str {
        &self.credential_exchange_id
    }
}

impl StorageRecord for JsonCredentialRecord {
    const CATEGORY: &'static str = "json_credential";

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> RecordTags {
        RecordTags::new(vec![(
            "credential_exchange_id".to_owned(),
            self.credential_exchange_id.clone(),
        )])
    }
}

#[derive(Clone, Debug)]
pub struct JsonCredentialFormat {
    credentials: Repository<JsonCredentialRecord>,
}

impl JsonCredentialFormat {
    pub fn new(wallet: Arc<dyn BaseWallet>) -> Self {
        Self {
            credentials: Repository::new(wallet),
        }
    }

    pub async fn get_credential(&self, id: &str) -> VcxResult<JsonCredentialRecord> {
        self.credentials.get_by_id(id).await
    }

    fn attachment(&self, value: impl Serialize) -> VcxResult<FormatAttachment> {
        Ok(FormatAttachment::new(
            JSON_CREDENTIAL_FORMAT,
            Attachment::json(new_message_id(), serde_json::to_value(value)?),
        ))
    }
}

fn input_attributes(input: Option<&Value>) -> VcxResult<Option<Attributes>> {
    match input {
        Some(input) => Ok(serde_json::from_value::<JsonCredentialInput>(input.clone())?.attributes),
        None => Ok(None),
    }
}

fn required_attributes(input: &Value) -> VcxResult<Attributes> {
    input_attributes(Some(input))?.ok_or_else(|| {
        AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            "JSON credential input needs attributes",
        )
    })
}

fn nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl CredentialFormatService for JsonCredentialFormat {
    fn key(&self) -> &'static str {
        JSON_CREDENTIAL_KEY
    }

    fn format(&self) -> &'static str {
        JSON_CREDENTIAL_FORMAT
    }

    async fn create_proposal(
        &self,
        _record: &CredentialExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment> {
        let attributes = input_attributes(Some(input))?.unwrap_or_default();
        self.attachment(JsonCredentialProposal { attributes })
    }

    async fn process_proposal(
        &self,
        _record: &CredentialExchangeRecord,
        proposal: &Attachment,
    ) -> VcxResult<()> {
        attachment_json::<JsonCredentialProposal>(proposal)?;
        Ok(())
    }

    async fn accept_proposal(
        &self,
        _record: &CredentialExchangeRecord,
        proposal: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment> {
        let proposal: JsonCredentialProposal = attachment_json(proposal)?;
        let attributes = input_attributes(input)?.unwrap_or(proposal.attributes);
        self.attachment(JsonCredentialOffer {
            attributes,
            nonce: nonce(),
        })
    }

    async fn create_offer(
        &self,
        _record: &CredentialExchangeRecord,
        input: &Value,
    ) -> VcxResult<FormatAttachment> {
        self.attachment(JsonCredentialOffer {
            attributes: required_attributes(input)?,
            nonce: nonce(),
        })
    }

    async fn process_offer(
        &self,
        _record: &CredentialExchangeRecord,
        offer: &Attachment,
    ) -> VcxResult<()> {
        let offer: JsonCredentialOffer = attachment_json(offer)?;
        if offer.nonce.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "JSON credential offer has an empty nonce",
            ));
        }
        Ok(())
    }

    async fn accept_offer(
        &self,
        _record: &CredentialExchangeRecord,
        offer: &Attachment,
        _input: Option<&Value>,
    ) -> VcxResult<FormatAttachment> {
        let offer: JsonCredentialOffer = attachment_json(offer)?;
        self.attachment(JsonCredentialRequest {
            attributes: offer.attributes,
            nonce: offer.nonce,
        })
    }

    async fn process_request(
        &self,
        _record: &CredentialExchangeRecord,
        request: &Attachment,
    ) -> VcxResult<()> {
        attachment_json::<JsonCredentialRequest>(request)?;
        Ok(())
    }

    async fn accept_request(
        &self,
        _record: &CredentialExchangeRecord,
        offer: Option<&Attachment>,
        request: &Attachment,
        input: Option<&Value>,
    ) -> VcxResult<FormatAttachment> {
        let request: JsonCredentialRequest = attachment_json(request)?;
        let attributes = match offer {
            Some(offer) => {
                let offer: JsonCredentialOffer = attachment_json(offer)?;
                if offer.nonce != request.nonce {
                    return Err(AriesVcxError::from_msg(
                        AriesVcxErrorKind::InvalidInput,
                        "JSON credential request does not answer the offer",
                    ));
                }
                offer.attributes
            }
            None => input_attributes(input)?.unwrap_or(request.attributes),
        };
        self.attachment(JsonCredential {
            attributes,
            nonce: request.nonce,
            issued_at: Utc::now(),
        })
    }

    async fn process_credential(
        &self,
        record: &CredentialExchangeRecord,
        request: &Attachment,
        credential: &Attachment,
    ) -> VcxResult<String> {
        let request: JsonCredentialRequest = attachment_json(request)?;
        let credential: JsonCredential = attachment_json(credential)?;
        if credential.nonce != request.nonce {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "JSON credential was not issued for our request",
            ));
        }

        let stored = JsonCredentialRecord {
            id: Uuid::new_v4().to_string(),
            credential_exchange_id: record.id().to_owned(),
            attributes: credential.attributes,
            issued_at: credential.issued_at,
        };
        self.credentials.save(&stored).await?;
        debug!(
            "JsonCredentialFormat::process_credential >> stored credential {} for exchange {}",
            stored.id,
            record.id()
        );
        Ok(stored.id)
    }

    async fn should_auto_respond_to_proposal(
        &self,
        _record: &CredentialExchangeRecord,
        proposal: &Attachment,
        offer: &Attachment,
    ) -> VcxResult<bool> {
        let proposal: JsonCredentialProposal = attachment_json(proposal)?;
        let offer: JsonCredentialOffer = attachment_json(offer)?;
        Ok(proposal.attributes == offer.attributes)
    }

    async fn should_auto_respond_to_offer(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &Attachment,
        offer: &Attachment,
    ) -> VcxResult<bool> {
        self.should_auto_respond_to_proposal(record, proposal, offer)
            .await
    }

    async fn should_auto_respond_to_request(
        &self,
        _record: &CredentialExchangeRecord,
        _proposal: Option<&Attachment>,
        offer: &Attachment,
        request: &Attachment,
    ) -> VcxResult<bool> {
        let offer: JsonCredentialOffer = attachment_json(offer)?;
        let request: JsonCredentialRequest = attachment_json(request)?;
        Ok(offer.attributes == request.attributes)
    }

    async fn should_auto_respond_to_credential(
        &self,
        _record: &CredentialExchangeRecord,
        request: &Attachment,
        credential: &Attachment,
    ) -> VcxResult<bool> {
        let request: JsonCredentialRequest = attachment_json(request)?;
        let credential: JsonCredential = attachment_json(credential)?;
        Ok(request.attributes == credential.attributes)
    }
}

/// Input for [`JsonCredentialFormat`] carrying the given attributes.
pub fn json_credential_input<'a>(
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Value {
    let attributes: Attributes = attributes
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
    json!({ "attributes": attributes })
}
