use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    msg_parts::MsgParts,
};

pub type ProblemReport = MsgParts<ProblemReportContent, ProblemReportDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ProblemReportContent {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_code: Option<ProblemCode>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCode {
    RequestNotAccepted,
    RequestProcessingError,
    ResponseNotAccepted,
    ResponseProcessingError,
    CompleteRejected,
}

impl std::fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::RequestNotAccepted => "request_not_accepted",
            Self::RequestProcessingError => "request_processing_error",
            Self::ResponseNotAccepted => "response_not_accepted",
            Self::ResponseProcessingError => "response_processing_error",
            Self::CompleteRejected => "complete_rejected",
        };
        f.write_str(code)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ProblemReportDecorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        decorators::thread::tests::make_extended_thread,
        misc::test_utils,
        msg_types::{DidExchangeKind, MessageKind},
    };

    #[test]
    fn test_didexchange_problem_report() {
        let content = ProblemReportContent::builder()
            .problem_code(ProblemCode::ResponseNotAccepted)
            .explain("Invalid signature".to_owned())
            .build();
        let decorators = ProblemReportDecorators::builder()
            .thread(make_extended_thread())
            .build();

        let expected = json!({
            "problem_code": "response_not_accepted",
            "explain": "Invalid signature",
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            ProblemReport::with_decorators("test".to_owned(), content, decorators),
            DidExchangeKind::ProblemReport.msg_type(),
            expected,
        );
    }
}
