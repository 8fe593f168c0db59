//! Module containing the `report-problem` protocol messages, as defined in the [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0035-report-problem/README.md>).
//!
//! The content and decorators here are reused by the problem reports of
//! other protocols, which only differ in their `@type`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::{
    decorators::{thread::Thread, timing::Timing},
    error::MsgTypeResult,
    misc::utils,
    msg_fields::traits::{msg_kind, DelayedSerde, MsgWithType},
    msg_parts::MsgParts,
    msg_types::{MessageKind, MessageType, ReportProblemKind},
};

pub type ProblemReport = MsgParts<ProblemReportContent, ProblemReportDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct ProblemReportContent {
    pub description: Description,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problem_items: Vec<HashMap<String, String>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who_retries: Option<WhoRetries>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "where")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub noticed_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_uri: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_uri: Option<String>,
}

impl ProblemReportContent {
    pub fn code(&self) -> &str {
        &self.description.code
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct Description {
    pub code: String,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WhoRetries {
    Me,
    You,
    Both,
    None,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    MessageContent,
    Thread,
    Connection,
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

impl ProblemReportDecorators {
    pub fn new(thread: Thread) -> Self {
        Self {
            thread,
            timing: None,
        }
    }
}

impl DelayedSerde for ProblemReport {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        let ReportProblemKind::ProblemReport = msg_kind(msg_type)?;
        Ok(serde_json::from_value(value)?)
    }

    fn msg_type(&self) -> MessageType {
        ReportProblemKind::ProblemReport.msg_type()
    }

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        MsgWithType::new(self.msg_type(), self).serialize(serializer)
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::{decorators::thread::tests::make_extended_thread, misc::test_utils};

    pub fn make_problem_report_content(code: &str) -> ProblemReportContent {
        ProblemReportContent::builder()
            .description(
                Description::builder()
                    .code(code.to_owned())
                    .en("test_en".to_owned())
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_minimal_problem_report() {
        let content = make_problem_report_content("abandoned");
        let decorators = ProblemReportDecorators::new(make_extended_thread());

        let expected = json!({
            "description": { "code": "abandoned", "en": "test_en" },
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            ProblemReport::with_decorators("test".to_owned(), content, decorators),
            ReportProblemKind::ProblemReport.msg_type(),
            expected,
        );
    }

    #[test]
    fn test_extended_problem_report() {
        let mut content = make_problem_report_content("request_not_accepted");
        content.who_retries = Some(WhoRetries::Me);
        content.impact = Some(Impact::Thread);
        content.location = Some("you".to_owned());
        content.problem_items = vec![HashMap::from([("did".to_owned(), "x".to_owned())])];
        let decorators = ProblemReportDecorators::new(make_extended_thread());

        let expected = json!({
            "description": { "code": "request_not_accepted", "en": "test_en" },
            "who_retries": "me",
            "impact": "thread",
            "where": "you",
            "problem_items": [{ "did": "x" }],
            "~thread": decorators.thread
        });

        test_utils::test_msg(
            ProblemReport::with_decorators("test".to_owned(), content, decorators),
            ReportProblemKind::ProblemReport.msg_type(),
            expected,
        );
    }
}
