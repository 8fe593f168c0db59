use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;
use url::Url;

use crate::misc::{utils, MimeType};

/// Struct representing the `~attach` decorator from its [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/concepts/0017-attachments/README.md>).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TypedBuilder)]
pub struct Attachment {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "@id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "mime-type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<MimeType>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub lastmod_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_count: Option<u64>,
    pub data: AttachmentData,
}

impl Attachment {
    /// Attachment carrying already base64 encoded content.
    pub fn base64(id: String, mime_type: MimeType, encoded: String) -> Self {
        Self::builder()
            .id(id)
            .mime_type(mime_type)
            .data(AttachmentData::new(AttachmentType::Base64(encoded)))
            .build()
    }

    pub fn json(id: String, value: Value) -> Self {
        Self::builder()
            .id(id)
            .mime_type(MimeType::Json)
            .data(AttachmentData::new(AttachmentType::Json(value)))
            .build()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, TypedBuilder)]
pub struct AttachmentData {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<AttachmentJws>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(flatten)]
    pub content: AttachmentType,
}

impl AttachmentData {
    pub fn new(content: AttachmentType) -> Self {
        Self {
            jws: None,
            sha256: None,
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentType {
    Base64(String),
    Json(Value),
    Links(Vec<Url>),
}

/// Detached JWS over an attachment's base64 content. A single signature uses the
/// flattened serialization, several use the general one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttachmentJws {
    General { signatures: Vec<JwsSignature> },
    Flattened(JwsSignature),
}

impl AttachmentJws {
    pub fn from_signatures(mut signatures: Vec<JwsSignature>) -> Option<Self> {
        match signatures.len() {
            0 => None,
            1 => signatures.pop().map(Self::Flattened),
            _ => Some(Self::General { signatures }),
        }
    }

    pub fn signatures(&self) -> Vec<&JwsSignature> {
        match self {
            Self::General { signatures } => signatures.iter().collect(),
            Self::Flattened(signature) => vec![signature],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwsSignature {
    pub header: JwsHeader,
    pub protected: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwsHeader {
    pub kid: String,
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    pub fn make_extended_attachment() -> Attachment {
        Attachment::builder()
            .id("test_id".to_owned())
            .description("test_description".to_owned())
            .filename("test_filename".to_owned())
            .mime_type(MimeType::Json)
            .byte_count(128)
            .data(AttachmentData::new(AttachmentType::Json(
                json!({ "field": "test_json_data" }),
            )))
            .build()
    }

    fn signature(kid: &str) -> JwsSignature {
        JwsSignature {
            header: JwsHeader {
                kid: kid.to_owned(),
            },
            protected: "protected".to_owned(),
            signature: "signature".to_owned(),
        }
    }

    #[test]
    fn test_extended_attachment() {
        let expected = json!({
            "@id": "test_id",
            "description": "test_description",
            "filename": "test_filename",
            "mime-type": "application/json",
            "byte_count": 128,
            "data": { "json": { "field": "test_json_data" } }
        });
        test_utils::test_serde(make_extended_attachment(), expected);
    }

    #[test]
    fn test_base64_attachment_with_flattened_jws() {
        let mut attachment = Attachment::base64("1".to_owned(), MimeType::Plain, "ZGlk".to_owned());
        attachment.data.jws = AttachmentJws::from_signatures(vec![signature("did:key:z6Mk")]);
        let expected = json!({
            "@id": "1",
            "mime-type": "text/plain",
            "data": {
                "base64": "ZGlk",
                "jws": {
                    "header": { "kid": "did:key:z6Mk" },
                    "protected": "protected",
                    "signature": "signature"
                }
            }
        });
        test_utils::test_serde(attachment, expected);
    }

    #[test]
    fn test_general_jws_keeps_every_signature() {
        let jws = AttachmentJws::from_signatures(vec![signature("a"), signature("b")]).unwrap();
        let value = serde_json::to_value(&jws).unwrap();
        assert_eq!(value["signatures"].as_array().unwrap().len(), 2);

        let jws: AttachmentJws = serde_json::from_value(value).unwrap();
        let kids: Vec<_> = jws.signatures().iter().map(|s| s.header.kid.as_str()).collect();
        assert_eq!(kids, ["a", "b"]);
        assert_eq!(AttachmentJws::from_signatures(vec![]), None);
    }
}
