//! Messages of version 2.0 of the `present-proof` protocol.

pub mod ack;
pub mod presentation;
pub mod problem_report;
pub mod propose;
pub mod request;

use derive_more::From;

use self::{
    ack::AckPresentationV2, presentation::PresentationV2,
    problem_report::PresentProofProblemReportV2, propose::ProposePresentationV2,
    request::RequestPresentationV2,
};
use super::PresentProof;
use crate::{
    error::MsgTypeResult,
    misc::utils::transit_to_aries_msg,
    msg_fields::{
        protocols::cred_issuance::v2::validate_formats, traits::delayed_serde_for_protocol,
    },
    msg_types::PresentProofKind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum PresentProofV2 {
    ProposePresentation(ProposePresentationV2),
    RequestPresentation(RequestPresentationV2),
    Presentation(PresentationV2),
    Ack(AckPresentationV2),
    ProblemReport(PresentProofProblemReportV2),
}

impl PresentProofV2 {
    pub(crate) fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::ProposePresentation(msg) => {
                validate_formats(&msg.content.formats, &msg.content.proposals_attach)
            }
            Self::RequestPresentation(msg) => {
                validate_formats(&msg.content.formats, &msg.content.request_presentations_attach)
            }
            Self::Presentation(msg) => {
                validate_formats(&msg.content.formats, &msg.content.presentations_attach)
            }
            Self::Ack(_) | Self::ProblemReport(_) => Ok(()),
        }
    }
}

delayed_serde_for_protocol!(PresentProofV2, PresentProofKind, {
    ProposePresentation => ProposePresentation,
    RequestPresentation => RequestPresentation,
    Presentation => Presentation,
    Ack => Ack,
    ProblemReport => ProblemReport,
});

transit_to_aries_msg!(ProposePresentationV2, PresentProofV2, PresentProof);
transit_to_aries_msg!(RequestPresentationV2, PresentProofV2, PresentProof);
transit_to_aries_msg!(PresentationV2, PresentProofV2, PresentProof);
transit_to_aries_msg!(AckPresentationV2, PresentProofV2, PresentProof);
transit_to_aries_msg!(PresentProofProblemReportV2, PresentProofV2, PresentProof);
