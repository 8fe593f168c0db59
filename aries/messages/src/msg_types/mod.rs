//! Message types: the protocol (name and version) together with the message
//! kind, as carried in the `@type` field.

pub mod protocols;
pub mod registry;

use std::{fmt, str::FromStr};

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

pub use self::protocols::{
    cred_issuance::CredentialIssuanceKind, did_exchange::DidExchangeKind,
    did_rotate::DidRotateKind,
    discover_features::{DiscoverFeaturesV1Kind, DiscoverFeaturesV2Kind},
    notification::NotificationKind, out_of_band::OutOfBandKind,
    present_proof::PresentProofKind, report_problem::ReportProblemKind, Protocol,
};
use crate::error::MsgTypeError;

/// Fully qualified message type, e.g. `https://didcomm.org/didexchange/1.1/request`.
///
/// The protocol is resolved to the version this crate implements, so two
/// types that only differ in the minor version are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageType {
    pub protocol: Protocol,
    pub kind: String,
}

impl MessageType {
    pub fn new(protocol: Protocol, kind: impl AsRef<str>) -> Self {
        Self {
            protocol,
            kind: kind.as_ref().to_owned(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.kind)
    }
}

impl FromStr for MessageType {
    type Err = MsgTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol_str, kind) = s
            .rsplit_once('/')
            .filter(|(_, kind)| !kind.is_empty())
            .ok_or_else(|| MsgTypeError::InvalidMsgType(s.to_owned()))?;
        let protocol = Protocol::from_str(protocol_str)?;
        Ok(Self::new(protocol, kind))
    }
}

impl Serialize for MessageType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format_args!("{self}").serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Implemented by the per protocol message kind enums, so that a kind knows
/// which protocol it belongs to.
pub trait MessageKind: AsRef<str> + FromStr {
    fn protocol() -> Protocol;

    fn msg_type(&self) -> MessageType {
        MessageType::new(Self::protocol(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_type() {
        let msg_type: MessageType = "https://didcomm.org/didexchange/1.1/request".parse().unwrap();
        assert_eq!(msg_type.protocol, Protocol::DidExchangeV1);
        assert_eq!(msg_type.kind, "request");
        assert_eq!(
            msg_type.to_string(),
            "https://didcomm.org/didexchange/1.1/request"
        );
    }

    #[test]
    fn test_minor_version_is_tolerated() {
        let older: MessageType = "https://didcomm.org/didexchange/1.0/request".parse().unwrap();
        let newer: MessageType = "https://didcomm.org/didexchange/1.7/request".parse().unwrap();
        assert_eq!(older, newer);
        assert_eq!(older, DidExchangeKind::Request.msg_type());
    }

    #[test]
    fn test_legacy_prefix_is_normalized() {
        let msg_type: MessageType =
            "did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/out-of-band/1.1/invitation"
                .parse()
                .unwrap();
        assert_eq!(msg_type, OutOfBandKind::Invitation.msg_type());
        assert_eq!(
            msg_type.to_string(),
            "https://didcomm.org/out-of-band/1.1/invitation"
        );
    }

    #[test]
    fn test_unsupported_major_version() {
        let err = "https://didcomm.org/didexchange/2.0/request"
            .parse::<MessageType>()
            .unwrap_err();
        assert!(matches!(err, MsgTypeError::UnsupportedVersion { major: 2, .. }));
    }

    #[test]
    fn test_invalid_message_types() {
        assert!("request".parse::<MessageType>().is_err());
        assert!("https://didcomm.org/didexchange/1.1/".parse::<MessageType>().is_err());
        assert!("https://didcomm.org/unknown/1.0/x".parse::<MessageType>().is_err());
        assert!("https://didcomm.org/didexchange/x.y/request"
            .parse::<MessageType>()
            .is_err());
    }
}
