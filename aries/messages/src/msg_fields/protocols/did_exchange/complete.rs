use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    misc::NoDecorators as NoContent,
    msg_parts::MsgParts,
};

pub type Complete = MsgParts<NoContent, CompleteDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct CompleteDecorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        misc::test_utils,
        msg_types::{DidExchangeKind, MessageKind},
        AriesMessage,
    };

    #[test]
    fn test_didexchange_complete() {
        let decorators = CompleteDecorators::builder()
            .thread(Thread::with_parent("thid".to_owned(), "invitation".to_owned()))
            .build();

        let expected = json!({
            "~thread": { "thid": "thid", "pthid": "invitation" }
        });

        test_utils::test_msg(
            Complete::with_decorators("test".to_owned(), NoContent, decorators),
            DidExchangeKind::Complete.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_complete_without_pthid_fails_validation() {
        let value = json!({
            "@id": "test",
            "@type": "https://didcomm.org/didexchange/1.1/complete",
            "~thread": { "thid": "thid" }
        });
        assert!(serde_json::from_value::<AriesMessage>(value).is_err());
    }
}
