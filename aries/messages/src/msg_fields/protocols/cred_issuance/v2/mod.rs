//! Messages of version 2.0 of the `issue-credential` protocol.

pub mod ack;
pub mod issue_credential;
pub mod offer_credential;
pub mod problem_report;
pub mod propose_credential;
pub mod request_credential;

use derive_more::From;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

use self::{
    ack::AckCredentialV2, issue_credential::IssueCredentialV2,
    offer_credential::OfferCredentialV2, problem_report::CredIssuanceProblemReportV2,
    propose_credential::ProposeCredentialV2, request_credential::RequestCredentialV2,
};
use super::{CredentialAttr, CredentialIssuance};
use crate::{
    error::{MsgTypeError, MsgTypeResult},
    misc::utils::transit_to_aries_msg,
    msg_fields::{
        protocols::common::attachment_format_specifier::AttachmentFormatSpecifier,
        traits::delayed_serde_for_protocol,
    },
    msg_types::{CredentialIssuanceKind, MessageKind, MessageType},
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum CredentialIssuanceV2 {
    ProposeCredential(ProposeCredentialV2),
    OfferCredential(OfferCredentialV2),
    RequestCredential(RequestCredentialV2),
    IssueCredential(IssueCredentialV2),
    Ack(AckCredentialV2),
    ProblemReport(CredIssuanceProblemReportV2),
}

impl CredentialIssuanceV2 {
    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::ProposeCredential(msg) => {
                validate_formats(&msg.content.formats, &msg.content.filters_attach)
            }
            Self::OfferCredential(msg) => {
                validate_formats(&msg.content.formats, &msg.content.offers_attach)
            }
            Self::RequestCredential(msg) => {
                validate_formats(&msg.content.formats, &msg.content.requests_attach)
            }
            Self::IssueCredential(msg) => {
                validate_formats(&msg.content.formats, &msg.content.credentials_attach)
            }
            Self::Ack(_) | Self::ProblemReport(_) => Ok(()),
        }
    }
}

/// Every attachment must be described by a format specifier, and every
/// specifier must point at an attachment.
pub(crate) fn validate_formats(
    formats: &[AttachmentFormatSpecifier],
    attachments: &[crate::decorators::attachment::Attachment],
) -> MsgTypeResult<()> {
    if formats.len() != attachments.len() {
        return Err(MsgTypeError::validation(format!(
            "{} formats given for {} attachments",
            formats.len(),
            attachments.len()
        )));
    }
    for format in formats {
        if !attachments
            .iter()
            .any(|attachment| attachment.id() == Some(format.attach_id.as_str()))
        {
            return Err(MsgTypeError::validation(format!(
                "no attachment with id {} for format {}",
                format.attach_id, format.format
            )));
        }
    }
    Ok(())
}

delayed_serde_for_protocol!(CredentialIssuanceV2, CredentialIssuanceKind, {
    ProposeCredential => ProposeCredential,
    OfferCredential => OfferCredential,
    RequestCredential => RequestCredential,
    IssueCredential => IssueCredential,
    Ack => Ack,
    ProblemReport => ProblemReport,
});

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CredentialPreviewV2 {
    #[serde(rename = "@type")]
    msg_type: CredentialPreviewV2MsgType,
    pub attributes: Vec<CredentialAttr>,
}

impl CredentialPreviewV2 {
    pub fn new(attributes: Vec<CredentialAttr>) -> Self {
        Self {
            msg_type: CredentialPreviewV2MsgType,
            attributes,
        }
    }

    /// Whether both previews hold the same attributes, regardless of their order.
    pub fn same_attributes(&self, other: &CredentialPreviewV2) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|attr| other.attributes.contains(attr))
    }
}

/// Non-standalone message type.
/// This is only encountered as part of an existent message.
/// It is not a message on it's own.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct CredentialPreviewV2MsgType;

impl Serialize for CredentialPreviewV2MsgType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        CredentialIssuanceKind::CredentialPreview
            .msg_type()
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CredentialPreviewV2MsgType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let msg_type = MessageType::deserialize(deserializer)?;
        if msg_type == CredentialIssuanceKind::CredentialPreview.msg_type() {
            Ok(Self)
        } else {
            Err(D::Error::custom(format!(
                "expected a credential preview, found {msg_type}"
            )))
        }
    }
}

transit_to_aries_msg!(ProposeCredentialV2, CredentialIssuanceV2, CredentialIssuance);
transit_to_aries_msg!(OfferCredentialV2, CredentialIssuanceV2, CredentialIssuance);
transit_to_aries_msg!(RequestCredentialV2, CredentialIssuanceV2, CredentialIssuance);
transit_to_aries_msg!(IssueCredentialV2, CredentialIssuanceV2, CredentialIssuance);
transit_to_aries_msg!(AckCredentialV2, CredentialIssuanceV2, CredentialIssuance);
transit_to_aries_msg!(CredIssuanceProblemReportV2, CredentialIssuanceV2, CredentialIssuance);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    fn attr(name: &str, value: &str) -> CredentialAttr {
        CredentialAttr::builder()
            .name(name.to_owned())
            .value(value.to_owned())
            .build()
    }

    #[test]
    fn test_credential_preview() {
        let preview = CredentialPreviewV2::new(vec![attr("name", "Alice")]);
        let expected = json!({
            "@type": "https://didcomm.org/issue-credential/2.0/credential-preview",
            "attributes": [{ "name": "name", "value": "Alice" }]
        });
        test_utils::test_serde(preview, expected);
    }

    #[test]
    fn test_preview_with_wrong_type_is_rejected() {
        let value = json!({
            "@type": "https://didcomm.org/issue-credential/2.0/offer-credential",
            "attributes": []
        });
        assert!(serde_json::from_value::<CredentialPreviewV2>(value).is_err());
    }

    #[test]
    fn test_preview_attribute_order_is_ignored() {
        let a = CredentialPreviewV2::new(vec![attr("name", "Alice"), attr("age", "28")]);
        let b = CredentialPreviewV2::new(vec![attr("age", "28"), attr("name", "Alice")]);
        let c = CredentialPreviewV2::new(vec![attr("age", "29"), attr("name", "Alice")]);
        assert!(a.same_attributes(&b));
        assert!(!a.same_attributes(&c));
    }
}
