use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    misc::NoDecorators as NoContent,
    msg_parts::MsgParts,
};

pub type HandshakeReuse = MsgParts<NoContent, HandshakeReuseDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct HandshakeReuseDecorators {
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
        msg_types::{MessageKind, OutOfBandKind},
    };

    #[test]
    fn test_handshake_reuse() {
        let decorators = HandshakeReuseDecorators::builder()
            .thread(Thread::with_parent("test".to_owned(), "invitation".to_owned()))
            .build();

        let expected = json!({
            "~thread": { "thid": "test", "pthid": "invitation" }
        });

        test_utils::test_msg(
            HandshakeReuse::with_decorators("test".to_owned(), NoContent, decorators),
            OutOfBandKind::HandshakeReuse.msg_type(),
            expected,
        );
    }
}
