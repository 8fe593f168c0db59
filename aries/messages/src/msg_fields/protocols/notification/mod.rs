//! Module containing the `notification` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0015-acks/README.md>).
//!
//! Acks of other protocols reuse [`AckContent`] and [`AckDecorators`].

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    error::MsgTypeResult,
    msg_fields::traits::{msg_kind, DelayedSerde, MsgWithType},
    msg_parts::MsgParts,
    msg_types::{MessageKind, MessageType, NotificationKind},
};

pub type Ack = MsgParts<AckContent, AckDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct AckContent {
    pub status: AckStatus,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckStatus {
    Ok,
    Fail,
    Pending,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct AckDecorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

impl AckDecorators {
    pub fn new(thread: Thread) -> Self {
        Self {
            thread,
            timing: None,
        }
    }
}

impl DelayedSerde for Ack {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        let NotificationKind::Ack = msg_kind(msg_type)?;
        Ok(serde_json::from_value(value)?)
    }

    fn msg_type(&self) -> MessageType {
        NotificationKind::Ack.msg_type()
    }

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        MsgWithType::new(self.msg_type(), self).serialize(serializer)
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        decorators::{thread::tests::make_extended_thread, timing::tests::make_extended_timing},
        misc::test_utils,
    };

    #[test]
    fn test_minimal_ack() {
        let content = AckContent::builder().status(AckStatus::Ok).build();
        let decorators = AckDecorators::new(make_extended_thread());

        let expected = json!({
            "status": "OK",
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            Ack::with_decorators("test".to_owned(), content, decorators),
            NotificationKind::Ack.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_extended_ack() {
        let content = AckContent::builder().status(AckStatus::Pending).build();
        let decorators = AckDecorators::builder()
            .thread(make_extended_thread())
            .timing(make_extended_timing())
            .build();

        let expected = json!({
            "status": "PENDING",
            "~thread": decorators.thread,
            "~timing": decorators.timing
        });

        test_utils::test_msg(
            Ack::with_decorators("test".to_owned(), content, decorators),
            NotificationKind::Ack.msg_type(),
            expected,
        );
    }
}
