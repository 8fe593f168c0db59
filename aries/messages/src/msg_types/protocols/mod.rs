pub mod cred_issuance;
pub mod did_exchange;
pub mod did_rotate;
pub mod discover_features;
pub mod notification;
pub mod out_of_band;
pub mod present_proof;
pub mod report_problem;

use std::{fmt, str::FromStr};

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::EnumIter;

use crate::error::MsgTypeError;

pub const DIDCOMM_PREFIX: &str = "https://didcomm.org/";
pub const LEGACY_DID_SOV_PREFIX: &str = "did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/";

/// The protocols, by family and major version, this crate has messages for.
/// Each carries the minor version it is implemented at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Protocol {
    DidExchangeV1,
    OutOfBandV1,
    CredentialIssuanceV2,
    PresentProofV2,
    DiscoverFeaturesV1,
    DiscoverFeaturesV2,
    DidRotateV1,
    NotificationV1,
    ReportProblemV1,
}

impl Protocol {
    pub fn family(&self) -> &'static str {
        match self {
            Self::DidExchangeV1 => "didexchange",
            Self::OutOfBandV1 => "out-of-band",
            Self::CredentialIssuanceV2 => "issue-credential",
            Self::PresentProofV2 => "present-proof",
            Self::DiscoverFeaturesV1 | Self::DiscoverFeaturesV2 => "discover-features",
            Self::DidRotateV1 => "did-rotate",
            Self::NotificationV1 => "notification",
            Self::ReportProblemV1 => "report-problem",
        }
    }

    pub fn version(&self) -> (u8, u8) {
        match self {
            Self::DidExchangeV1 | Self::OutOfBandV1 => (1, 1),
            Self::CredentialIssuanceV2 | Self::PresentProofV2 | Self::DiscoverFeaturesV2 => (2, 0),
            Self::DiscoverFeaturesV1
            | Self::DidRotateV1
            | Self::NotificationV1
            | Self::ReportProblemV1 => (1, 0),
        }
    }

    /// Roles an agent can play in the protocol, as advertised through
    /// discover features.
    pub fn roles(&self) -> &'static [&'static str] {
        match self {
            Self::DidExchangeV1 => &["requester", "responder"],
            Self::OutOfBandV1 => &["sender", "receiver"],
            Self::CredentialIssuanceV2 => &["holder", "issuer"],
            Self::PresentProofV2 => &["prover", "verifier"],
            Self::DiscoverFeaturesV1 | Self::DiscoverFeaturesV2 => &["requester", "responder"],
            Self::DidRotateV1 => &["rotating_party", "observing_party"],
            Self::NotificationV1 | Self::ReportProblemV1 => &["notifier", "notified"],
        }
    }

    /// Protocol URI without the message kind, e.g. `https://didcomm.org/didexchange/1.1`.
    pub fn pid(&self) -> String {
        self.to_string()
    }

    fn resolve(family: &str, major: u8, minor: u8) -> Result<Self, MsgTypeError> {
        use strum::IntoEnumIterator;

        let mut known_family = false;
        for protocol in Protocol::iter() {
            if protocol.family() != family {
                continue;
            }
            known_family = true;
            if protocol.version().0 == major {
                return Ok(protocol);
            }
        }

        if known_family {
            Err(MsgTypeError::UnsupportedVersion {
                family: family.to_owned(),
                major,
                minor,
            })
        } else {
            Err(MsgTypeError::UnknownProtocol(family.to_owned()))
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.version();
        write!(f, "{DIDCOMM_PREFIX}{}/{major}.{minor}", self.family())
    }
}

impl FromStr for Protocol {
    type Err = MsgTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MsgTypeError::InvalidMsgType(s.to_owned());

        let rest = s
            .strip_prefix(DIDCOMM_PREFIX)
            .or_else(|| s.strip_prefix(LEGACY_DID_SOV_PREFIX))
            .ok_or_else(invalid)?;
        let (family, version) = rest.split_once('/').ok_or_else(invalid)?;
        let (major, minor) = version.split_once('.').ok_or_else(invalid)?;
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;

        Self::resolve(family, major, minor)
    }
}

impl Serialize for Protocol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format_args!("{self}").serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    #[test]
    fn test_protocol_serde() {
        test_utils::test_serde(
            Protocol::DiscoverFeaturesV2,
            json!("https://didcomm.org/discover-features/2.0"),
        );
        test_utils::test_serde(
            Protocol::DiscoverFeaturesV1,
            json!("https://didcomm.org/discover-features/1.0"),
        );
    }

    #[test]
    fn test_unknown_protocol() {
        assert_eq!(
            "https://didcomm.org/basicmessage/1.0".parse::<Protocol>(),
            Err(MsgTypeError::UnknownProtocol("basicmessage".to_owned()))
        );
    }
}
