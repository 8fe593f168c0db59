//! Module containing the `issue-credential` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0453-issue-credential-v2/README.md>).

pub mod v2;

use derive_more::From;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use typed_builder::TypedBuilder;

use self::v2::CredentialIssuanceV2;
use crate::{
    error::MsgTypeResult,
    misc::MimeType,
    msg_fields::traits::DelayedSerde,
    msg_types::MessageType,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum CredentialIssuance {
    V2(CredentialIssuanceV2),
}

impl DelayedSerde for CredentialIssuance {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        CredentialIssuanceV2::delayed_deserialize(msg_type, value).map(Self::V2)
    }

    fn msg_type(&self) -> MessageType {
        match self {
            Self::V2(msg) => msg.msg_type(),
        }
    }

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::V2(msg) => msg.delayed_serialize(serializer),
        }
    }
}

/// A credential attribute, as found in credential previews.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct CredentialAttr {
    pub name: String,
    pub value: String,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "mime-type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<MimeType>,
}
