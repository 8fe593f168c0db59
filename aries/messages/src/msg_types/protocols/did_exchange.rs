use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum DidExchangeKind {
    Request,
    Response,
    Complete,
    ProblemReport,
}

impl MessageKind for DidExchangeKind {
    fn protocol() -> Protocol {
        Protocol::DidExchangeV1
    }
}
