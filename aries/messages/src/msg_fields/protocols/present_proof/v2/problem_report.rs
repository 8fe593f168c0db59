use serde::{Deserialize, Serialize};

use crate::{
    msg_fields::protocols::report_problem::{ProblemReportContent, ProblemReportDecorators},
    msg_parts::MsgParts,
};

pub type PresentProofProblemReportV2 =
    MsgParts<PresentProofV2ProblemReportContent, ProblemReportDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct PresentProofV2ProblemReportContent {
    pub inner: ProblemReportContent,
}

impl From<ProblemReportContent> for PresentProofV2ProblemReportContent {
    fn from(inner: ProblemReportContent) -> Self {
        Self { inner }
    }
}
