use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum DidRotateKind {
    Rotate,
    Ack,
    ProblemReport,
    Hangup,
}

impl MessageKind for DidRotateKind {
    fn protocol() -> Protocol {
        Protocol::DidRotateV1
    }
}
