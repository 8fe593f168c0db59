use async_trait::async_trait;
use messages::{
    msg_types::{MessageKind, MessageType, ReportProblemKind},
    AriesMessage,
};

use super::MessageHandler;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{common::problem_report_reason, discover_features::protocol::DiscoverFeaturesRecords},
    transport::{InboundMessageContext, OutboundMessage},
};

/// The generic report-problem message. Protocols without a problem report of
/// their own (discover features) are ended through it.
#[derive(Clone, Debug)]
pub struct ProblemReportHandler {
    discover_features: DiscoverFeaturesRecords,
}

impl ProblemReportHandler {
    pub fn new(discover_features: DiscoverFeaturesRecords) -> Self {
        Self { discover_features }
    }
}

#[async_trait]
impl MessageHandler for ProblemReportHandler {
    fn supported_message_types(&self) -> Vec<MessageType> {
        vec![ReportProblemKind::ProblemReport.msg_type()]
    }

    async fn handle(&self, ctx: &InboundMessageContext) -> VcxResult<Option<OutboundMessage>> {
        let AriesMessage::ReportProblem(report) = &ctx.message else {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::UnroutableMessage,
                format!("ProblemReportHandler cannot handle {}", ctx.message.msg_type()),
            ));
        };
        match self
            .discover_features
            .process_problem_report(ctx, report)
            .await?
        {
            Some(record) => info!(
                "ProblemReportHandler::handle >> discover features record {} is {}",
                record.id(),
                record.state()
            ),
            None => warn!(
                "ProblemReportHandler::handle >> no exchange on thread {}, report ignored: {}",
                ctx.message.thread_id(),
                problem_report_reason(&report.content)
            ),
        }
        Ok(None)
    }
}
