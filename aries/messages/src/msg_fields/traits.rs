use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    error::{MsgTypeError, MsgTypeResult},
    msg_types::MessageType,
};

/// Trait implemented on the enums grouping the messages of a protocol. The `@type`
/// is read up front, so deserialization only has the message kind left to match on.
pub(crate) trait DelayedSerde: Sized {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self>;

    fn msg_type(&self) -> MessageType;

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;
}

/// Serialization helper that prepends the `@type` field to a message.
#[derive(Serialize)]
pub(crate) struct MsgWithType<'a, T> {
    #[serde(rename = "@type")]
    msg_type: MessageType,
    #[serde(flatten)]
    message: &'a T,
}

impl<'a, T> MsgWithType<'a, T> {
    pub fn new(msg_type: MessageType, message: &'a T) -> Self {
        Self { msg_type, message }
    }
}

pub(crate) fn msg_kind<K>(msg_type: &MessageType) -> MsgTypeResult<K>
where
    K: FromStr,
{
    K::from_str(&msg_type.kind).map_err(|_| MsgTypeError::UnknownMsgKind {
        protocol: msg_type.protocol.to_string(),
        kind: msg_type.kind.clone(),
    })
}

/// Implements [`crate::msg_fields::traits::DelayedSerde`] for a protocol enum whose
/// variants map one to one onto the kinds of a single message kind enum.
macro_rules! delayed_serde_for_protocol {
    ($protocol:ty, $kind:ident, { $($variant:ident => $kind_variant:ident),+ $(,)? }) => {
        impl $crate::msg_fields::traits::DelayedSerde for $protocol {
            fn delayed_deserialize(
                msg_type: &$crate::msg_types::MessageType,
                value: serde_json::Value,
            ) -> $crate::error::MsgTypeResult<Self> {
                let kind: $kind = $crate::msg_fields::traits::msg_kind(msg_type)?;
                match kind {
                    $($kind::$kind_variant => Ok(Self::$variant(serde_json::from_value(value)?)),)+
                    #[allow(unreachable_patterns)]
                    _ => Err($crate::error::MsgTypeError::NotStandalone(msg_type.to_string())),
                }
            }

            fn msg_type(&self) -> $crate::msg_types::MessageType {
                use $crate::msg_types::MessageKind;
                match self {
                    $(Self::$variant(_) => $kind::$kind_variant.msg_type(),)+
                }
            }

            fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                use serde::Serialize;
                let msg_type = self.msg_type();
                match self {
                    $(Self::$variant(v) => {
                        $crate::msg_fields::traits::MsgWithType::new(msg_type, v).serialize(serializer)
                    })+
                }
            }
        }
    };
}

pub(crate) use delayed_serde_for_protocol;
