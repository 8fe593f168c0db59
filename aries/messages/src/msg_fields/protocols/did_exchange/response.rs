use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{attachment::Attachment, thread::Thread, timing::Timing},
    msg_parts::MsgParts,
};

pub type Response = MsgParts<ResponseContent, ResponseDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ResponseContent {
    pub did: String,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "did_doc~attach", skip_serializing_if = "Option::is_none")]
    pub did_doc: Option<Attachment>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "did_rotate~attach", skip_serializing_if = "Option::is_none")]
    pub did_rotate: Option<Attachment>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ResponseDecorators {
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
        decorators::{
            attachment::{AttachmentData, AttachmentType},
            thread::tests::make_extended_thread,
            timing::tests::make_extended_timing,
        },
        misc::{test_utils, MimeType},
        msg_types::{DidExchangeKind, MessageKind},
    };

    fn response_content() -> ResponseContent {
        ResponseContent::builder()
            .did("did:peer:4zQmtest".to_owned())
            .did_rotate(
                Attachment::builder()
                    .data(AttachmentData::new(AttachmentType::Base64(
                        "ZGlkOnBlZXI6NHpRbXRlc3Q".to_owned(),
                    )))
                    .mime_type(MimeType::Plain)
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_minimal_didexchange_response() {
        let content = ResponseContent::builder()
            .did("did:peer:4zQmtest".to_owned())
            .build();
        let decorators = ResponseDecorators::builder()
            .thread(make_extended_thread())
            .build();

        let expected = json!({
            "did": content.did,
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            Response::with_decorators("test".to_owned(), content, decorators),
            DidExchangeKind::Response.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_extended_didexchange_response() {
        let content = response_content();
        let decorators = ResponseDecorators::builder()
            .thread(make_extended_thread())
            .timing(make_extended_timing())
            .build();

        let expected = json!({
            "did": content.did,
            "did_rotate~attach": content.did_rotate,
            "~thread": decorators.thread,
            "~timing": decorators.timing
        });

        test_utils::test_msg(
            Response::with_decorators("test".to_owned(), content, decorators),
            DidExchangeKind::Response.msg_type(),
            expected,
        );
    }
}
