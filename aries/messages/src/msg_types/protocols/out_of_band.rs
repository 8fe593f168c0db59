use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum OutOfBandKind {
    Invitation,
    HandshakeReuse,
    HandshakeReuseAccepted,
}

impl MessageKind for OutOfBandKind {
    fn protocol() -> Protocol {
        Protocol::OutOfBandV1
    }
}
