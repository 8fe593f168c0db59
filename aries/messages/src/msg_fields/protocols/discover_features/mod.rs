//! Module containing the `discover-features` protocol messages, for both
//! [1.0](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0031-discover-features/README.md>)
//! and [2.0](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0557-discover-features-v2/README.md>).

pub mod v1;
pub mod v2;

use derive_more::From;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use self::{v1::DiscoverFeaturesV1, v2::DiscoverFeaturesV2};
use crate::{
    error::{MsgTypeError, MsgTypeResult},
    msg_fields::traits::DelayedSerde,
    msg_types::{MessageType, Protocol},
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum DiscoverFeatures {
    V1(DiscoverFeaturesV1),
    V2(DiscoverFeaturesV2),
}

impl DelayedSerde for DiscoverFeatures {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        match msg_type.protocol {
            Protocol::DiscoverFeaturesV1 => {
                DiscoverFeaturesV1::delayed_deserialize(msg_type, value).map(Self::V1)
            }
            Protocol::DiscoverFeaturesV2 => {
                DiscoverFeaturesV2::delayed_deserialize(msg_type, value).map(Self::V2)
            }
            other => Err(MsgTypeError::InvalidMsgType(format!(
                "{other} is not a discover-features protocol"
            ))),
        }
    }

    fn msg_type(&self) -> MessageType {
        match self {
            Self::V1(msg) => msg.msg_type(),
            Self::V2(msg) => msg.msg_type(),
        }
    }

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::V1(msg) => msg.delayed_serialize(serializer),
            Self::V2(msg) => msg.delayed_serialize(serializer),
        }
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureType {
    Protocol,
    GoalCode,
}
