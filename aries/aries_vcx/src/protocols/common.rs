use messages::{
    decorators::{attachment::Attachment, thread::Thread, timing::Timing},
    msg_fields::protocols::{
        common::attachment_format_specifier::AttachmentFormatSpecifier,
        notification::{AckContent, AckDecorators, AckStatus},
        report_problem::{
            Description, ProblemReport, ProblemReportContent, ProblemReportDecorators,
        },
    },
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::did_exchange::jws::attachment_content,
};

/// Problem code sent when an exchange is given up.
pub const ABANDONED_PROBLEM_CODE: &str = "abandoned";

pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Thread decorator continuing the record's thread.
pub fn record_thread<S, R, D>(record: &ExchangeRecord<S, R, D>) -> Thread
where
    S: RecordState,
    R: RecordRole,
    D: RecordData,
{
    match record.parent_thread_id() {
        Some(pthid) => Thread::with_parent(record.thread_id().to_owned(), pthid.to_owned()),
        None => Thread::new(record.thread_id().to_owned()),
    }
}

pub fn problem_report_content(code: &str, description: Option<String>) -> ProblemReportContent {
    let description = match description {
        Some(en) => Description::builder().code(code.to_owned()).en(en).build(),
        None => Description::builder().code(code.to_owned()).build(),
    };
    ProblemReportContent::builder()
        .description(description)
        .build()
}

/// Reason recorded on a record the peer abandoned through `content`.
pub fn problem_report_reason(content: &ProblemReportContent) -> String {
    match &content.description.en {
        Some(en) => format!("{}: {en}", content.code()),
        None => content.code().to_owned(),
    }
}

pub fn problem_report_decorators(thread: Thread) -> ProblemReportDecorators {
    ProblemReportDecorators::builder()
        .thread(thread)
        .timing(Timing::out_now())
        .build()
}

/// Problem report threaded to the same thread and parent thread as `record`.
/// Protocol families wrap the parts into their own message type.
pub fn create_problem_report<S, R, D>(
    record: &ExchangeRecord<S, R, D>,
    code: &str,
    description: Option<String>,
) -> (ProblemReportContent, ProblemReportDecorators)
where
    S: RecordState,
    R: RecordRole,
    D: RecordData,
{
    (
        problem_report_content(code, description),
        problem_report_decorators(record_thread(record)),
    )
}

pub fn build_problem_report_msg(comment: Option<String>, thread_id: &str) -> ProblemReport {
    let content = problem_report_content(ABANDONED_PROBLEM_CODE, comment);
    let decorators = problem_report_decorators(Thread::new(thread_id.to_owned()));
    ProblemReport::with_decorators(new_message_id(), content, decorators)
}

pub fn ack_parts(thread: Thread) -> (AckContent, AckDecorators) {
    let mut decorators = AckDecorators::new(thread);
    decorators.timing = Some(Timing::out_now());
    (
        AckContent {
            status: AckStatus::Ok,
        },
        decorators,
    )
}

/// An attachment produced by a format service, with the format it is in.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatAttachment {
    pub format: String,
    pub attachment: Attachment,
}

impl FormatAttachment {
    pub fn new(format: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            format: format.into(),
            attachment,
        }
    }
}

/// Splits format attachments into the `formats` and `~attach` fields of a
/// message.
pub fn split_format_attachments(
    attachments: Vec<FormatAttachment>,
) -> VcxResult<(Vec<AttachmentFormatSpecifier>, Vec<Attachment>)> {
    let mut formats = Vec::with_capacity(attachments.len());
    let mut attached = Vec::with_capacity(attachments.len());
    for FormatAttachment { format, attachment } in attachments {
        let attach_id = attachment.id().map(ToOwned::to_owned).ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!("Attachment in format {format} has no id"),
            )
        })?;
        formats.push(AttachmentFormatSpecifier::new(attach_id, format));
        attached.push(attachment);
    }
    Ok((formats, attached))
}

/// Parses the JSON carried by an attachment, inline or base64 encoded.
pub fn attachment_json<T: DeserializeOwned>(attachment: &Attachment) -> VcxResult<T> {
    Ok(serde_json::from_slice(&attachment_content(attachment)?)?)
}

/// The attachment a message carries for the first format `supports` accepts.
pub fn find_format_attachment<'a>(
    formats: &[AttachmentFormatSpecifier],
    attachments: &'a [Attachment],
    supports: impl Fn(&str) -> bool,
) -> Option<&'a Attachment> {
    formats
        .iter()
        .find(|specifier| supports(&specifier.format))
        .and_then(|specifier| {
            attachments
                .iter()
                .find(|attachment| attachment.id() == Some(specifier.attach_id.as_str()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::record::tests::{PingData, PingRecord, PingRole, PingState};

    #[test]
    fn test_problem_report_follows_record_thread() {
        let record = PingRecord::new(
            "thid",
            PingRole::Sender,
            PingState::Sent,
            "v1",
            PingData::default(),
        )
        .with_parent_thread_id(Some("invitation".to_owned()));

        let (content, decorators) =
            create_problem_report(&record, "abandoned", Some("rejected".to_owned()));
        assert_eq!(content.code(), "abandoned");
        assert_eq!(content.description.en.as_deref(), Some("rejected"));
        assert_eq!(decorators.thread.thid.as_deref(), Some("thid"));
        assert_eq!(decorators.thread.pthid.as_deref(), Some("invitation"));
    }

    #[test]
    fn test_format_attachments_are_linked_by_id() {
        let (formats, attachments) = split_format_attachments(vec![
            FormatAttachment::new("a@v1", Attachment::json("att-a".to_owned(), serde_json::json!(1))),
            FormatAttachment::new("b@v1", Attachment::json("att-b".to_owned(), serde_json::json!(2))),
        ])
        .unwrap();
        assert_eq!(formats[1], AttachmentFormatSpecifier::new("att-b", "b@v1"));

        let found = find_format_attachment(&formats, &attachments, |format| format == "b@v1");
        assert_eq!(found.and_then(|a| a.id()), Some("att-b"));
        assert!(find_format_attachment(&formats, &attachments, |format| format == "c@v1").is_none());
    }

    #[test]
    fn test_holder_build_problem_report_msg() {
        let msg = build_problem_report_msg(Some("foo".into()), "12345");

        assert_eq!(msg.decorators.thread.thid.as_deref(), Some("12345"));
        assert_eq!(msg.content.description.en.as_deref(), Some("foo"));
        assert!(msg.decorators.timing.and_then(|t| t.out_time).is_some());
    }
}
