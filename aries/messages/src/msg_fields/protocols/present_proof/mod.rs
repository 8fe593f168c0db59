//! Module containing the `present-proof` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0454-present-proof-v2/README.md>).

pub mod v2;

use derive_more::From;
use serde::Serializer;
use serde_json::Value;

use self::v2::PresentProofV2;
use crate::{error::MsgTypeResult, msg_fields::traits::DelayedSerde, msg_types::MessageType};

#[derive(Clone, Debug, From, PartialEq)]
pub enum PresentProof {
    V2(PresentProofV2),
}

impl DelayedSerde for PresentProof {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        PresentProofV2::delayed_deserialize(msg_type, value).map(Self::V2)
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
