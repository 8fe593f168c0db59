use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum PresentProofKind {
    ProposePresentation,
    RequestPresentation,
    Presentation,
    Ack,
    ProblemReport,
}

impl MessageKind for PresentProofKind {
    fn protocol() -> Protocol {
        Protocol::PresentProofV2
    }
}
