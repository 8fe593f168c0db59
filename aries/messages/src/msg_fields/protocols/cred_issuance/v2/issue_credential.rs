use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{
        attachment::Attachment, please_ack::PleaseAck, service::Service, thread::Thread,
        timing::Timing,
    },
    msg_fields::protocols::common::attachment_format_specifier::AttachmentFormatSpecifier,
    msg_parts::MsgParts,
};

pub type IssueCredentialV2 = MsgParts<IssueCredentialV2Content, IssueCredentialV2Decorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct IssueCredentialV2Content {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_code: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_id: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub formats: Vec<AttachmentFormatSpecifier>,
    #[serde(rename = "credentials~attach")]
    pub credentials_attach: Vec<Attachment>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct IssueCredentialV2Decorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~please_ack")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub please_ack: Option<PleaseAck>,
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
        msg_types::{CredentialIssuanceKind, MessageKind},
    };

    #[test]
    fn test_issue_cred_with_please_ack() {
        let content = IssueCredentialV2Content::builder()
            .formats(vec![AttachmentFormatSpecifier::new("test_id", "hlindy/cred@v2.0")])
            .credentials_attach(vec![make_extended_attachment()])
            .build();
        let decorators = IssueCredentialV2Decorators::builder()
            .thread(make_extended_thread())
            .please_ack(PleaseAck::outcome())
            .build();

        let expected = json!({
            "formats": content.formats,
            "credentials~attach": content.credentials_attach,
            "~thread": decorators.thread,
            "~please_ack": { "on": ["OUTCOME"] }
        });

        test_utils::test_msg(
            IssueCredentialV2::with_decorators("test".to_owned(), content, decorators),
            CredentialIssuanceKind::IssueCredential.msg_type(),
            expected,
        );
    }
}
