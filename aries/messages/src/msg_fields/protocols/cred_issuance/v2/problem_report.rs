use serde::{Deserialize, Serialize};

use crate::{
    msg_fields::protocols::report_problem::{ProblemReportContent, ProblemReportDecorators},
    msg_parts::MsgParts,
};

pub type CredIssuanceProblemReportV2 =
    MsgParts<CredIssuanceV2ProblemReportContent, ProblemReportDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct CredIssuanceV2ProblemReportContent {
    pub inner: ProblemReportContent,
}

impl From<ProblemReportContent> for CredIssuanceV2ProblemReportContent {
    fn from(inner: ProblemReportContent) -> Self {
        Self { inner }
    }
}
