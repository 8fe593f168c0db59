use did_doc::schema::service::Service;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{attachment::Attachment, timing::Timing},
    error::{MsgTypeError, MsgTypeResult},
    msg_parts::MsgParts,
    msg_types::Protocol,
};

pub type Invitation = MsgParts<InvitationContent, InvitationDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct InvitationContent {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_code: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<Vec<String>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshake_protocols: Option<Vec<String>>,
    pub services: Vec<OobService>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "requests~attach", skip_serializing_if = "Option::is_none")]
    pub requests_attach: Option<Vec<Attachment>>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl InvitationContent {
    /// The handshake protocols of the invitation this crate knows about, in
    /// the inviter's order of preference.
    pub fn known_handshake_protocols(&self) -> Vec<Protocol> {
        self.handshake_protocols
            .iter()
            .flatten()
            .filter_map(|pid| pid.parse().ok())
            .collect()
    }

    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        if self.services.is_empty() {
            return Err(MsgTypeError::validation("invitation has no services"));
        }
        let has_handshakes = self
            .handshake_protocols
            .as_ref()
            .is_some_and(|protocols| !protocols.is_empty());
        let has_requests = self
            .requests_attach
            .as_ref()
            .is_some_and(|requests| !requests.is_empty());
        if !has_handshakes && !has_requests {
            return Err(MsgTypeError::validation(
                "invitation needs handshake_protocols or requests~attach",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct InvitationDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

/// A service of an invitation, either a resolvable DID or an inline DIDComm
/// service block.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OobService {
    Did(String),
    Inline(Box<Service>),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        misc::test_utils,
        msg_types::{MessageKind, OutOfBandKind},
        AriesMessage,
    };

    fn inline_service() -> Service {
        Service::new_didcomm_v1(
            "#inline-0".to_owned(),
            "https://agent.example/didcomm".parse().unwrap(),
            vec!["did:key:z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th".to_owned()],
            vec![],
        )
    }

    #[test]
    fn test_invitation_with_inline_and_did_services() {
        let content = InvitationContent::builder()
            .label("Faber".to_owned())
            .handshake_protocols(vec![
                "https://didcomm.org/connections/1.0".to_owned(),
                Protocol::DidExchangeV1.pid(),
            ])
            .services(vec![
                OobService::Inline(Box::new(inline_service())),
                OobService::Did("did:peer:2.Ez6LS".to_owned()),
            ])
            .build();

        let expected = json!({
            "label": "Faber",
            "handshake_protocols": [
                "https://didcomm.org/connections/1.0",
                "https://didcomm.org/didexchange/1.1"
            ],
            "services": [inline_service(), "did:peer:2.Ez6LS"]
        });

        test_utils::test_msg(
            Invitation::with_decorators(
                "test".to_owned(),
                content,
                InvitationDecorators::default(),
            ),
            OutOfBandKind::Invitation.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_unknown_handshake_protocols_are_skipped() {
        let content = InvitationContent::builder()
            .handshake_protocols(vec![
                "https://didcomm.org/connections/1.0".to_owned(),
                "https://didcomm.org/didexchange/1.0".to_owned(),
            ])
            .services(vec![OobService::Did("did:peer:2.Ez6LS".to_owned())])
            .build();
        assert_eq!(content.known_handshake_protocols(), vec![Protocol::DidExchangeV1]);
    }

    #[test]
    fn test_invitation_without_services_fails_validation() {
        let value = json!({
            "@id": "test",
            "@type": "https://didcomm.org/out-of-band/1.1/invitation",
            "handshake_protocols": ["https://didcomm.org/didexchange/1.0"],
            "services": []
        });
        assert!(serde_json::from_value::<AriesMessage>(value).is_err());
    }

    #[test]
    fn test_invitation_without_handshake_or_requests_fails_validation() {
        let value = json!({
            "@id": "test",
            "@type": "https://didcomm.org/out-of-band/1.1/invitation",
            "services": ["did:peer:2.Ez6LS"]
        });
        assert!(serde_json::from_value::<AriesMessage>(value).is_err());
    }
}
