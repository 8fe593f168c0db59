use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use async_trait::async_trait;
use messages::{
    decorators::{attachment::Attachment, timing::Timing},
    msg_fields::protocols::{
        common::attachment_format_specifier::AttachmentFormatSpecifier,
        present_proof::{
            v2::{
                ack::AckPresentationV2,
                presentation::{PresentationV2, PresentationV2Content, PresentationV2Decorators},
                problem_report::PresentProofProblemReportV2,
                propose::{
                    ProposePresentationV2, ProposePresentationV2Content,
                    ProposePresentationV2Decorators,
                },
                request::{
                    RequestPresentationV2, RequestPresentationV2Content,
                    RequestPresentationV2Decorators,
                },
                PresentProofV2,
            },
            PresentProof,
        },
    },
    msg_types::{MessageKind, MessageType, PresentProofKind},
    AriesMessage,
};
use strum::IntoEnumIterator;

use super::{
    format::{PresentationVerification, ProofFormatInputs, ProofFormatService},
    protocol::{AcceptProofOptions, ProofOptions, ProofProtocol},
    ProofExchangeData, ProofExchangeRecord, ProofRole, ProofState, PROOF_PROTOCOL_V2,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::EventBus,
    protocols::{
        auto_accept::{compose_auto_accept, should_auto_respond, AutoAcceptPolicy},
        common::{
            ack_parts, create_problem_report, find_format_attachment, new_message_id,
            problem_report_reason, record_thread, split_format_attachments, FormatAttachment,
            ABANDONED_PROBLEM_CODE,
        },
        connection::ConnectionRecord,
    },
    storage::{
        agent_message::{AgentMessageRole, AgentMessageStore},
        Repository,
    },
    transport::InboundMessageContext,
};

macro_rules! message_extractor {
    ($name:ident, $variant:ident, $msg:ty) => {
        fn $name(message: &AriesMessage) -> VcxResult<&$msg> {
            match message {
                AriesMessage::PresentProof(PresentProof::V2(PresentProofV2::$variant(msg))) => {
                    Ok(msg)
                }
                other => Err(AriesVcxError::from_msg(
                    AriesVcxErrorKind::InvalidInput,
                    format!(
                        "Expected present-proof {}, got {}",
                        stringify!($variant),
                        other.msg_type()
                    ),
                )),
            }
        }
    };
}

message_extractor!(proposal_message, ProposePresentation, ProposePresentationV2);
message_extractor!(request_message, RequestPresentation, RequestPresentationV2);
message_extractor!(presentation_message, Presentation, PresentationV2);
message_extractor!(ack_message, Ack, AckPresentationV2);
message_extractor!(problem_report_message, ProblemReport, PresentProofProblemReportV2);

type FormatService = Arc<dyn ProofFormatService>;

fn format_attachment<'a>(
    service: &FormatService,
    formats: &[AttachmentFormatSpecifier],
    attachments: &'a [Attachment],
) -> VcxResult<&'a Attachment> {
    find_format_attachment(formats, attachments, |format| service.supports_format(format))
        .ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                format!("Message has no attachment in format {}", service.format()),
            )
        })
}

/// Present proof 2.0, for both the prover and the verifier.
#[derive(Clone, Debug)]
pub struct ProofV2Protocol {
    records: Repository<ProofExchangeRecord>,
    messages: AgentMessageStore,
    events: EventBus,
    formats: Vec<FormatService>,
    auto_accept: AutoAcceptPolicy,
}

impl ProofV2Protocol {
    pub fn new(
        wallet: Arc<dyn BaseWallet>,
        events: EventBus,
        formats: Vec<FormatService>,
        auto_accept: AutoAcceptPolicy,
    ) -> Self {
        Self {
            records: Repository::new(wallet.clone()),
            messages: AgentMessageStore::new(wallet),
            events,
            formats,
            auto_accept,
        }
    }

    pub fn records(&self) -> &Repository<ProofExchangeRecord> {
        &self.records
    }

    fn policy(&self, record: &ProofExchangeRecord) -> AutoAcceptPolicy {
        compose_auto_accept(record.auto_accept(), self.auto_accept)
    }

    fn services_for_inputs<'a>(
        &'a self,
        inputs: &'a ProofFormatInputs,
    ) -> VcxResult<Vec<(&'a FormatService, &'a serde_json::Value)>> {
        if inputs.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "No proof format input given",
            ));
        }
        inputs
            .iter()
            .map(|(key, input)| {
                self.formats
                    .iter()
                    .find(|service| service.key() == key)
                    .map(|service| (service, input))
                    .ok_or_else(|| {
                        AriesVcxError::from_msg(
                            AriesVcxErrorKind::InvalidInput,
                            format!("No proof format service for {key}"),
                        )
                    })
            })
            .collect()
    }

    fn supporting(&self, formats: &[AttachmentFormatSpecifier]) -> Vec<&FormatService> {
        self.formats
            .iter()
            .filter(|service| {
                formats
                    .iter()
                    .any(|specifier| service.supports_format(&specifier.format))
            })
            .collect()
    }

    fn require_supporting(
        &self,
        formats: &[AttachmentFormatSpecifier],
    ) -> VcxResult<Vec<&FormatService>> {
        let services = self.supporting(formats);
        if services.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                format!(
                    "None of the proof formats {:?} is supported",
                    formats.iter().map(|f| f.format.as_str()).collect::<Vec<_>>()
                ),
            ));
        }
        Ok(services)
    }

    async fn save_message(
        &self,
        record: &ProofExchangeRecord,
        role: AgentMessageRole,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<()> {
        self.messages
            .save_or_update_agent_message(record.id(), role, &message.into())
            .await
    }

    async fn find_message<T: Clone>(
        &self,
        record: &ProofExchangeRecord,
        kind: PresentProofKind,
        extract: fn(&AriesMessage) -> VcxResult<&T>,
    ) -> VcxResult<Option<T>> {
        let message = self
            .messages
            .find_agent_message(record.id(), &kind.msg_type(), None)
            .await?;
        message.as_ref().map(|m| extract(m).cloned()).transpose()
    }

    async fn get_message<T: Clone>(
        &self,
        record: &ProofExchangeRecord,
        kind: PresentProofKind,
        extract: fn(&AriesMessage) -> VcxResult<&T>,
    ) -> VcxResult<T> {
        self.find_message(record, kind, extract)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No {kind} stored for proof exchange {}", record.id()),
                )
            })
    }

    pub async fn find_proposal_message(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<Option<ProposePresentationV2>> {
        self.find_message(record, PresentProofKind::ProposePresentation, proposal_message)
            .await
    }

    pub async fn find_request_message(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<Option<RequestPresentationV2>> {
        self.find_message(record, PresentProofKind::RequestPresentation, request_message)
            .await
    }

    pub async fn find_presentation_message(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<Option<PresentationV2>> {
        self.find_message(record, PresentProofKind::Presentation, presentation_message)
            .await
    }

    fn problem_report(
        &self,
        record: &ProofExchangeRecord,
        description: Option<String>,
    ) -> PresentProofProblemReportV2 {
        let (content, decorators) =
            create_problem_report(record, ABANDONED_PROBLEM_CODE, description);
        PresentProofProblemReportV2::with_decorators(new_message_id(), content.into(), decorators)
    }

    fn report_error(
        &self,
        record: &ProofExchangeRecord,
        description: &str,
        detail: &str,
    ) -> AriesVcxError {
        AriesVcxError::problem_report(
            format!("{description}: {detail}"),
            ABANDONED_PROBLEM_CODE,
            self.problem_report(record, Some(description.to_owned())),
        )
    }

    async fn peer_failure(
        &self,
        record: &mut ProofExchangeRecord,
        stored: bool,
        err: AriesVcxError,
        description: &str,
    ) -> AriesVcxError {
        warn!(
            "ProofV2Protocol >> {description} on thread {}: {err}",
            record.thread_id()
        );
        if stored && !record.is_terminal() {
            if let Err(abandon_err) = self.abandon(record, err.msg().to_owned()).await {
                return abandon_err;
            }
        }
        self.report_error(record, description, err.msg())
    }

    async fn abandon(&self, record: &mut ProofExchangeRecord, reason: String) -> VcxResult<()> {
        let previous = record.abandon(reason)?;
        self.records
            .update_and_emit(&self.events, record, previous)
            .await
    }

    async fn transition(
        &self,
        record: &mut ProofExchangeRecord,
        expected: &[ProofState],
        next: ProofState,
    ) -> VcxResult<()> {
        let previous = record.transition(expected, next)?;
        self.records
            .update_and_emit(&self.events, record, previous)
            .await
    }

    fn new_record(
        &self,
        thread_id: &str,
        role: ProofRole,
        state: ProofState,
        connection_id: Option<&str>,
        auto_accept: Option<AutoAcceptPolicy>,
    ) -> ProofExchangeRecord {
        ProofExchangeRecord::new(
            thread_id,
            role,
            state,
            PROOF_PROTOCOL_V2,
            ProofExchangeData::default(),
        )
        .with_connection_id(connection_id.map(ToOwned::to_owned))
        .with_auto_accept(auto_accept)
    }

    /// The record of `role` on the message's thread. A record created
    /// without a connection also answers messages arriving over one.
    async fn find_thread_record(
        &self,
        ctx: &InboundMessageContext,
        role: ProofRole,
    ) -> VcxResult<Option<ProofExchangeRecord>> {
        let thread_id = ctx.message.thread_id();
        let connection_id = ctx.connection_id();
        let record = self
            .records
            .find_by_thread(thread_id, role, connection_id)
            .await?;
        if record.is_some() || connection_id.is_none() {
            return Ok(record);
        }
        let connectionless = self.records.find_by_thread(thread_id, role, None).await?;
        Ok(connectionless.map(|record| {
            record.with_connection_id(connection_id.map(ToOwned::to_owned))
        }))
    }

    async fn get_thread_record(
        &self,
        ctx: &InboundMessageContext,
        role: ProofRole,
    ) -> VcxResult<ProofExchangeRecord> {
        self.find_thread_record(ctx, role).await?.ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::RecordNotFound,
                format!(
                    "No proof exchange with thread {} and role {}",
                    ctx.message.thread_id(),
                    role.as_ref()
                ),
            )
        })
    }

    async fn record_for_inbound(
        &self,
        ctx: &InboundMessageContext,
        role: ProofRole,
        expected: ProofState,
        new_state: ProofState,
    ) -> VcxResult<(ProofExchangeRecord, bool)> {
        match self.find_thread_record(ctx, role).await? {
            Some(record) => {
                record.assert_state(&[expected])?;
                Ok((record, true))
            }
            None => {
                let record = self
                    .new_record(ctx.message.thread_id(), role, new_state, ctx.connection_id(), None)
                    .with_parent_thread_id(ctx.message.parent_thread_id().map(ToOwned::to_owned));
                Ok((record, false))
            }
        }
    }

    async fn store_inbound(
        &self,
        record: &mut ProofExchangeRecord,
        stored: bool,
        expected: ProofState,
        next: ProofState,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<()> {
        if stored {
            self.transition(record, &[expected], next).await?;
        } else {
            self.records.save_and_emit(&self.events, record).await?;
        }
        self.save_message(record, AgentMessageRole::Receiver, message)
            .await
    }

    async fn proposal_attachments(
        &self,
        record: &ProofExchangeRecord,
        inputs: &ProofFormatInputs,
    ) -> VcxResult<Vec<FormatAttachment>> {
        let mut attachments = Vec::new();
        for (service, input) in self.services_for_inputs(inputs)? {
            attachments.push(service.create_proposal(record, input).await?);
        }
        Ok(attachments)
    }

    async fn request_attachments(
        &self,
        record: &ProofExchangeRecord,
        inputs: &ProofFormatInputs,
    ) -> VcxResult<Vec<FormatAttachment>> {
        let mut attachments = Vec::new();
        for (service, input) in self.services_for_inputs(inputs)? {
            attachments.push(service.create_request(record, input).await?);
        }
        Ok(attachments)
    }

    fn build_proposal(
        &self,
        record: &ProofExchangeRecord,
        attachments: Vec<FormatAttachment>,
        comment: Option<String>,
        goal_code: Option<String>,
        threaded: bool,
    ) -> VcxResult<ProposePresentationV2> {
        let (formats, proposals_attach) = split_format_attachments(attachments)?;
        let id = if threaded {
            new_message_id()
        } else {
            record.thread_id().to_owned()
        };
        Ok(ProposePresentationV2::with_decorators(
            id,
            ProposePresentationV2Content {
                comment,
                goal_code,
                formats,
                proposals_attach,
            },
            ProposePresentationV2Decorators {
                thread: threaded.then(|| record_thread(record)),
                timing: Some(Timing::out_now()),
                service: None,
            },
        ))
    }

    fn build_request(
        &self,
        record: &ProofExchangeRecord,
        attachments: Vec<FormatAttachment>,
        comment: Option<String>,
        goal_code: Option<String>,
        will_confirm: Option<bool>,
        threaded: bool,
    ) -> VcxResult<RequestPresentationV2> {
        let (formats, request_presentations_attach) = split_format_attachments(attachments)?;
        let id = if threaded {
            new_message_id()
        } else {
            record.thread_id().to_owned()
        };
        Ok(RequestPresentationV2::with_decorators(
            id,
            RequestPresentationV2Content {
                comment,
                goal_code,
                will_confirm: Some(will_confirm.unwrap_or(true)),
                formats,
                request_presentations_attach,
            },
            RequestPresentationV2Decorators {
                thread: threaded.then(|| record_thread(record)),
                timing: Some(Timing::out_now()),
                service: None,
            },
        ))
    }

    /// Runs `compare` for every format of the message this agent sent last.
    async fn proposal_matches_request(
        &self,
        record: &ProofExchangeRecord,
        proposal: &ProposePresentationV2,
        request: &RequestPresentationV2,
        request_is_ours: bool,
    ) -> VcxResult<bool> {
        let formats = if request_is_ours {
            &request.content.formats
        } else {
            &proposal.content.formats
        };
        for service in self.supporting(formats) {
            let Some(proposal_attachment) = find_format_attachment(
                &proposal.content.formats,
                &proposal.content.proposals_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            let Some(request_attachment) = find_format_attachment(
                &request.content.formats,
                &request.content.request_presentations_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            let matches = if request_is_ours {
                service
                    .should_auto_respond_to_proposal(record, proposal_attachment, request_attachment)
                    .await?
            } else {
                service
                    .should_auto_respond_to_request(record, proposal_attachment, request_attachment)
                    .await?
            };
            if !matches {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn request_matches_presentation(
        &self,
        record: &ProofExchangeRecord,
        request: &RequestPresentationV2,
        presentation: &PresentationV2,
    ) -> VcxResult<bool> {
        if request.content.will_confirm != Some(true) {
            return Ok(false);
        }
        let proposal = self.find_proposal_message(record).await?;
        for service in self.supporting(&request.content.formats) {
            let proposal_attachment = proposal.as_ref().and_then(|proposal| {
                find_format_attachment(
                    &proposal.content.formats,
                    &proposal.content.proposals_attach,
                    |format| service.supports_format(format),
                )
            });
            let request_attachment = format_attachment(
                service,
                &request.content.formats,
                &request.content.request_presentations_attach,
            )?;
            let Some(presentation_attachment) = find_format_attachment(
                &presentation.content.formats,
                &presentation.content.presentations_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            if !service
                .should_auto_respond_to_presentation(
                    record,
                    proposal_attachment,
                    request_attachment,
                    presentation_attachment,
                )
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn verify_presentation(
        &self,
        record: &ProofExchangeRecord,
        request: &RequestPresentationV2,
        presentation: &PresentationV2,
    ) -> VcxResult<PresentationVerification> {
        for service in self.require_supporting(&presentation.content.formats)? {
            let request_attachment = format_attachment(
                service,
                &request.content.formats,
                &request.content.request_presentations_attach,
            )?;
            let presentation_attachment = format_attachment(
                service,
                &presentation.content.formats,
                &presentation.content.presentations_attach,
            )?;
            let verification = service
                .process_presentation(record, request_attachment, presentation_attachment)
                .await?;
            if !verification.is_valid {
                return Ok(verification);
            }
        }
        Ok(PresentationVerification::valid())
    }
}

#[async_trait]
impl ProofProtocol for ProofV2Protocol {
    fn version(&self) -> &'static str {
        PROOF_PROTOCOL_V2
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        PresentProofKind::iter().map(|kind| kind.msg_type()).collect()
    }

    async fn create_proposal(
        &self,
        connection: &ConnectionRecord,
        options: ProofOptions,
    ) -> VcxResult<(ProofExchangeRecord, AriesMessage)> {
        connection.assert_ready()?;
        let record = self.new_record(
            &new_message_id(),
            ProofRole::Prover,
            ProofState::ProposalSent,
            Some(connection.id()),
            options.auto_accept,
        );
        let attachments = self.proposal_attachments(&record, &options.formats).await?;
        let proposal =
            self.build_proposal(&record, attachments, options.comment, options.goal_code, false)?;

        self.records.save_and_emit(&self.events, &record).await?;
        self.save_message(&record, AgentMessageRole::Sender, proposal.clone())
            .await?;
        Ok((record, proposal.into()))
    }

    async fn process_proposal(&self, ctx: &InboundMessageContext) -> VcxResult<ProofExchangeRecord> {
        let proposal = proposal_message(&ctx.message)?;
        debug!("ProofV2Protocol::process_proposal >> {}", proposal.id);
        let (mut record, stored) = self
            .record_for_inbound(
                ctx,
                ProofRole::Verifier,
                ProofState::RequestSent,
                ProofState::ProposalReceived,
            )
            .await?;

        let processed: VcxResult<()> = async {
            for service in self.require_supporting(&proposal.content.formats)? {
                let attachment = format_attachment(
                    service,
                    &proposal.content.formats,
                    &proposal.content.proposals_attach,
                )?;
                service.process_proposal(&record, attachment).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = processed {
            return Err(self
                .peer_failure(&mut record, stored, err, "Unable to process presentation proposal")
                .await);
        }

        self.store_inbound(
            &mut record,
            stored,
            ProofState::RequestSent,
            ProofState::ProposalReceived,
            proposal.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_proposal(
        &self,
        record: &mut ProofExchangeRecord,
        options: AcceptProofOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::ProposalReceived])?;
        let proposal = self
            .get_message(record, PresentProofKind::ProposePresentation, proposal_message)
            .await?;

        let mut attachments = Vec::new();
        for service in self.require_supporting(&proposal.content.formats)? {
            let attachment = format_attachment(
                service,
                &proposal.content.formats,
                &proposal.content.proposals_attach,
            )?;
            attachments.push(
                service
                    .accept_proposal(record, attachment, options.formats.get(service.key()))
                    .await?,
            );
        }
        let request = self.build_request(
            record,
            attachments,
            options.comment,
            proposal.content.goal_code,
            None,
            true,
        )?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, request.clone())
            .await?;
        self.transition(record, &[ProofState::ProposalReceived], ProofState::RequestSent)
            .await?;
        Ok(request.into())
    }

    async fn negotiate_proposal(
        &self,
        record: &mut ProofExchangeRecord,
        options: ProofOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::ProposalReceived])?;
        if record.connection_id().is_none() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Negotiating a proposal needs a connection",
            ));
        }

        let attachments = self.request_attachments(record, &options.formats).await?;
        let request = self.build_request(
            record,
            attachments,
            options.comment,
            options.goal_code,
            options.will_confirm,
            true,
        )?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, request.clone())
            .await?;
        self.transition(record, &[ProofState::ProposalReceived], ProofState::RequestSent)
            .await?;
        Ok(request.into())
    }

    async fn create_request(
        &self,
        connection: Option<&ConnectionRecord>,
        options: ProofOptions,
    ) -> VcxResult<(ProofExchangeRecord, AriesMessage)> {
        if let Some(connection) = connection {
            connection.assert_ready()?;
        }
        let record = self.new_record(
            &new_message_id(),
            ProofRole::Verifier,
            ProofState::RequestSent,
            connection.map(|c| c.id()),
            options.auto_accept,
        );
        let attachments = self.request_attachments(&record, &options.formats).await?;
        let request = self.build_request(
            &record,
            attachments,
            options.comment,
            options.goal_code,
            options.will_confirm,
            false,
        )?;

        self.records.save_and_emit(&self.events, &record).await?;
        self.save_message(&record, AgentMessageRole::Sender, request.clone())
            .await?;
        Ok((record, request.into()))
    }

    async fn process_request(&self, ctx: &InboundMessageContext) -> VcxResult<ProofExchangeRecord> {
        let request = request_message(&ctx.message)?;
        debug!("ProofV2Protocol::process_request >> {}", request.id);
        let (mut record, stored) = self
            .record_for_inbound(
                ctx,
                ProofRole::Prover,
                ProofState::ProposalSent,
                ProofState::RequestReceived,
            )
            .await?;

        let processed: VcxResult<()> = async {
            for service in self.require_supporting(&request.content.formats)? {
                let attachment = format_attachment(
                    service,
                    &request.content.formats,
                    &request.content.request_presentations_attach,
                )?;
                service.process_request(&record, attachment).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = processed {
            return Err(self
                .peer_failure(&mut record, stored, err, "Unable to process presentation request")
                .await);
        }

        self.store_inbound(
            &mut record,
            stored,
            ProofState::ProposalSent,
            ProofState::RequestReceived,
            request.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_request(
        &self,
        record: &mut ProofExchangeRecord,
        options: AcceptProofOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::RequestReceived])?;
        let request = self
            .get_message(record, PresentProofKind::RequestPresentation, request_message)
            .await?;

        let mut attachments = Vec::new();
        for service in self.require_supporting(&request.content.formats)? {
            let attachment = format_attachment(
                service,
                &request.content.formats,
                &request.content.request_presentations_attach,
            )?;
            attachments.push(
                service
                    .accept_request(record, attachment, options.formats.get(service.key()))
                    .await?,
            );
        }
        let (formats, presentations_attach) = split_format_attachments(attachments)?;
        let presentation = PresentationV2::with_decorators(
            new_message_id(),
            PresentationV2Content {
                comment: options.comment,
                goal_code: None,
                last_presentation: Some(true),
                formats,
                presentations_attach,
            },
            PresentationV2Decorators {
                thread: record_thread(record),
                please_ack: None,
                timing: Some(Timing::out_now()),
                service: None,
            },
        );

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, presentation.clone())
            .await?;
        self.transition(
            record,
            &[ProofState::RequestReceived],
            ProofState::PresentationSent,
        )
        .await?;
        Ok(presentation.into())
    }

    async fn negotiate_request(
        &self,
        record: &mut ProofExchangeRecord,
        options: ProofOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Prover)?;
        record.assert_state(&[ProofState::RequestReceived])?;
        if record.connection_id().is_none() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Negotiating a request needs a connection",
            ));
        }

        let attachments = self.proposal_attachments(record, &options.formats).await?;
        let proposal =
            self.build_proposal(record, attachments, options.comment, options.goal_code, true)?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, proposal.clone())
            .await?;
        self.transition(record, &[ProofState::RequestReceived], ProofState::ProposalSent)
            .await?;
        Ok(proposal.into())
    }

    async fn decline_request(
        &self,
        record: &mut ProofExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Prover)?;
        self.transition(record, &[ProofState::RequestReceived], ProofState::Declined)
            .await?;
        Ok(self.problem_report(record, reason).into())
    }

    async fn process_presentation(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<ProofExchangeRecord> {
        let presentation = presentation_message(&ctx.message)?;
        debug!("ProofV2Protocol::process_presentation >> {}", presentation.id);
        let mut record = self.get_thread_record(ctx, ProofRole::Verifier).await?;
        record.assert_state(&[ProofState::RequestSent])?;
        let request = self
            .get_message(&record, PresentProofKind::RequestPresentation, request_message)
            .await?;

        let verification = match self
            .verify_presentation(&record, &request, presentation)
            .await
        {
            Ok(verification) => verification,
            Err(err) => {
                return Err(self
                    .peer_failure(&mut record, true, err, "Unable to process presentation")
                    .await)
            }
        };

        record.data.is_verified = Some(verification.is_valid);
        self.save_message(&record, AgentMessageRole::Receiver, presentation.clone())
            .await?;
        if verification.is_valid {
            self.transition(
                &mut record,
                &[ProofState::RequestSent],
                ProofState::PresentationReceived,
            )
            .await?;
            return Ok(record);
        }

        let reason = verification
            .message
            .unwrap_or_else(|| "Presentation is not valid".to_owned());
        info!(
            "ProofV2Protocol::process_presentation >> rejecting presentation on thread {}: {reason}",
            record.thread_id()
        );
        self.abandon(&mut record, reason.clone()).await?;
        Err(self.report_error(&record, "Presentation could not be verified", &reason))
    }

    async fn accept_presentation(
        &self,
        record: &mut ProofExchangeRecord,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(ProofRole::Verifier)?;
        record.assert_state(&[ProofState::PresentationReceived])?;
        let presentation = self
            .get_message(record, PresentProofKind::Presentation, presentation_message)
            .await?;
        if presentation.content.last_presentation == Some(false) {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!(
                    "Presentation {} announces more presentations, not acking it",
                    presentation.id
                ),
            ));
        }

        let (content, decorators) = ack_parts(record_thread(record));
        let ack = AckPresentationV2::with_decorators(new_message_id(), content.into(), decorators);
        self.transition(record, &[ProofState::PresentationReceived], ProofState::Done)
            .await?;
        Ok(ack.into())
    }

    async fn process_ack(&self, ctx: &InboundMessageContext) -> VcxResult<ProofExchangeRecord> {
        let ack = ack_message(&ctx.message)?;
        debug!("ProofV2Protocol::process_ack >> {}", ack.id);
        let mut record = self.get_thread_record(ctx, ProofRole::Prover).await?;
        self.transition(&mut record, &[ProofState::PresentationSent], ProofState::Done)
            .await?;
        Ok(record)
    }

    fn create_problem_report(
        &self,
        record: &ProofExchangeRecord,
        description: Option<String>,
    ) -> AriesMessage {
        self.problem_report(record, description).into()
    }

    async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<ProofExchangeRecord> {
        let report = problem_report_message(&ctx.message)?;
        let mut record = self
            .records
            .get_by_thread_any_role(ctx.message.thread_id(), ctx.connection_id())
            .await?;
        let reason = problem_report_reason(&report.content.inner);
        if record.is_terminal() {
            warn!(
                "ProofV2Protocol::process_problem_report >> record {} already {}, ignoring {reason}",
                record.id(),
                record.state()
            );
            return Ok(record);
        }
        self.abandon(&mut record, reason).await?;
        Ok(record)
    }

    async fn should_auto_respond_to_proposal(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<bool> {
        let proposal = self
            .get_message(record, PresentProofKind::ProposePresentation, proposal_message)
            .await?;
        let request = self.find_request_message(record).await?;
        should_auto_respond(self.policy(record), request, |request| async move {
            self.proposal_matches_request(record, &proposal, &request, true)
                .await
        })
        .await
    }

    async fn should_auto_respond_to_request(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<bool> {
        let request = self
            .get_message(record, PresentProofKind::RequestPresentation, request_message)
            .await?;
        let proposal = self.find_proposal_message(record).await?;
        should_auto_respond(self.policy(record), proposal, |proposal| async move {
            self.proposal_matches_request(record, &proposal, &request, false)
                .await
        })
        .await
    }

    async fn should_auto_respond_to_presentation(
        &self,
        record: &ProofExchangeRecord,
    ) -> VcxResult<bool> {
        let presentation = self
            .get_message(record, PresentProofKind::Presentation, presentation_message)
            .await?;
        if presentation.content.last_presentation == Some(false) {
            return Ok(false);
        }
        let request = self.find_request_message(record).await?;
        should_auto_respond(self.policy(record), request, |request| async move {
            self.request_matches_presentation(record, &request, &presentation)
                .await
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> VcxResult<ProofExchangeRecord> {
        self.records.get_by_id(id).await
    }

    async fn delete_by_id(&self, id: &str) -> VcxResult<()> {
        self.records.delete(id).await?;
        self.messages.delete_for_record(id).await
    }
}
