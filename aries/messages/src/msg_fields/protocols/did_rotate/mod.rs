//! Module containing the `did-rotate` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0794-did-rotate/README.md>).

use derive_more::From;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    error::{MsgTypeError, MsgTypeResult},
    misc::{utils::transit_to_aries_msg, NoDecorators as NoContent},
    msg_fields::{
        protocols::{
            notification::{AckContent, AckDecorators},
            report_problem::{ProblemReportContent, ProblemReportDecorators},
        },
        traits::delayed_serde_for_protocol,
    },
    msg_parts::MsgParts,
    msg_types::DidRotateKind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum DidRotate {
    Rotate(Rotate),
    Ack(RotateAck),
    ProblemReport(RotateProblemReport),
    Hangup(Hangup),
}

impl DidRotate {
    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::Rotate(msg) if msg.content.to_did.is_empty() => {
                Err(MsgTypeError::validation("rotate is missing to_did"))
            }
            _ => Ok(()),
        }
    }
}

delayed_serde_for_protocol!(DidRotate, DidRotateKind, {
    Rotate => Rotate,
    Ack => Ack,
    ProblemReport => ProblemReport,
    Hangup => Hangup,
});

transit_to_aries_msg!(Rotate, DidRotate);
transit_to_aries_msg!(RotateAck, DidRotate);
transit_to_aries_msg!(RotateProblemReport, DidRotate);
transit_to_aries_msg!(Hangup, DidRotate);

pub type Rotate = MsgParts<RotateContent, RotateDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct RotateContent {
    pub to_did: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct RotateDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~thread")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

pub type RotateAck = MsgParts<RotateAckContent, AckDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RotateAckContent {
    pub inner: AckContent,
}

impl From<AckContent> for RotateAckContent {
    fn from(inner: AckContent) -> Self {
        Self { inner }
    }
}

pub type RotateProblemReport = MsgParts<RotateProblemReportContent, ProblemReportDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RotateProblemReportContent {
    pub inner: ProblemReportContent,
}

impl From<ProblemReportContent> for RotateProblemReportContent {
    fn from(inner: ProblemReportContent) -> Self {
        Self { inner }
    }
}

pub type Hangup = MsgParts<NoContent, HangupDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct HangupDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

/// Problem codes a rotation can be rejected with.
pub mod problem_codes {
    pub const METHOD_UNSUPPORTED: &str = "e.did.method_unsupported";
    pub const UNRESOLVABLE: &str = "e.did.unresolvable";
    pub const DOC_UNSUPPORTED: &str = "e.did.doc_unsupported";
}
