use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::CredentialPreviewV2;
use crate::{
    decorators::{attachment::Attachment, service::Service, thread::Thread, timing::Timing},
    msg_fields::protocols::common::attachment_format_specifier::AttachmentFormatSpecifier,
    msg_parts::MsgParts,
};

pub type ProposeCredentialV2 = MsgParts<ProposeCredentialV2Content, ProposeCredentialV2Decorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ProposeCredentialV2Content {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_code: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_preview: Option<CredentialPreviewV2>,
    pub formats: Vec<AttachmentFormatSpecifier>,
    #[serde(rename = "filters~attach")]
    pub filters_attach: Vec<Attachment>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct ProposeCredentialV2Decorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~thread")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~service")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        decorators::{
            attachment::tests::make_extended_attachment, thread::tests::make_extended_thread,
        },
        misc::test_utils,
        msg_fields::protocols::cred_issuance::CredentialAttr,
        msg_types::{CredentialIssuanceKind, MessageKind},
    };

    #[test]
    fn test_extended_propose_cred() {
        let preview = CredentialPreviewV2::new(vec![CredentialAttr::builder()
            .name("name".to_owned())
            .value("Alice".to_owned())
            .build()]);
        let content = ProposeCredentialV2Content::builder()
            .comment("test_comment".to_owned())
            .credential_preview(preview)
            .formats(vec![AttachmentFormatSpecifier::new(
                "test_id",
                "hlindy/cred-filter@v2.0",
            )])
            .filters_attach(vec![make_extended_attachment()])
            .build();
        let decorators = ProposeCredentialV2Decorators::builder()
            .thread(make_extended_thread())
            .build();

        let expected = json!({
            "comment": content.comment,
            "credential_preview": content.credential_preview,
            "formats": content.formats,
            "filters~attach": content.filters_attach,
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            ProposeCredentialV2::with_decorators("test".to_owned(), content, decorators),
            CredentialIssuanceKind::ProposeCredential.msg_type(),
            expected,
        );
    }
}
