use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum CredentialIssuanceKind {
    ProposeCredential,
    OfferCredential,
    RequestCredential,
    IssueCredential,
    Ack,
    ProblemReport,
    CredentialPreview,
}

impl MessageKind for CredentialIssuanceKind {
    fn protocol() -> Protocol {
        Protocol::CredentialIssuanceV2
    }
}
