use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{attachment::Attachment, thread::Thread, timing::Timing},
    msg_parts::MsgParts,
};

pub type Request = MsgParts<RequestContent, RequestDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct RequestContent {
    pub label: String,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_code: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub did: String,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "did_doc~attach", skip_serializing_if = "Option::is_none")]
    pub did_doc: Option<Attachment>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct RequestDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~thread")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        decorators::{
            attachment::tests::make_extended_attachment, thread::tests::make_extended_thread,
            timing::tests::make_extended_timing,
        },
        misc::test_utils,
        msg_types::{DidExchangeKind, MessageKind},
        AriesMessage,
    };

    pub fn request_content() -> RequestContent {
        RequestContent::builder()
            .label("test_request_label".to_owned())
            .goal_code("aries.rel.build".to_owned())
            .goal("test_goal".to_owned())
            .did("did:peer:1zQmtest".to_owned())
            .did_doc(make_extended_attachment())
            .build()
    }

    #[test]
    fn test_minimal_didexchange_request() {
        let content = RequestContent::builder()
            .label("test_request_label".to_owned())
            .did("did:peer:1zQmtest".to_owned())
            .build();
        let expected = json!({
            "label": content.label,
            "did": content.did,
        });
        test_utils::test_msg(
            Request::with_decorators("test".to_owned(), content, RequestDecorators::default()),
            DidExchangeKind::Request.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_extended_didexchange_request() {
        let content = request_content();
        let decorators = RequestDecorators::builder()
            .thread(make_extended_thread())
            .timing(make_extended_timing())
            .build();

        let expected = json!({
            "label": content.label,
            "goal_code": content.goal_code,
            "goal": content.goal,
            "did": content.did,
            "did_doc~attach": content.did_doc,
            "~thread": decorators.thread,
            "~timing": decorators.timing
        });

        test_utils::test_msg(
            Request::with_decorators("test".to_owned(), content, decorators),
            DidExchangeKind::Request.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_request_without_label_fails_validation() {
        let value = json!({
            "@id": "test",
            "@type": "https://didcomm.org/didexchange/1.1/request",
            "label": "",
            "did": "did:peer:1zQmtest"
        });
        assert!(serde_json::from_value::<AriesMessage>(value).is_err());
    }
}
