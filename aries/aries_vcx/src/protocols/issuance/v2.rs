use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use async_trait::async_trait;
use messages::{
    decorators::{attachment::Attachment, timing::Timing},
    msg_fields::protocols::{
        common::attachment_format_specifier::AttachmentFormatSpecifier,
        cred_issuance::{
            v2::{
                ack::AckCredentialV2,
                issue_credential::{
                    IssueCredentialV2, IssueCredentialV2Content, IssueCredentialV2Decorators,
                },
                offer_credential::{
                    OfferCredentialV2, OfferCredentialV2Content, OfferCredentialV2Decorators,
                },
                problem_report::CredIssuanceProblemReportV2,
                propose_credential::{
                    ProposeCredentialV2, ProposeCredentialV2Content, ProposeCredentialV2Decorators,
                },
                request_credential::{
                    RequestCredentialV2, RequestCredentialV2Content, RequestCredentialV2Decorators,
                },
                CredentialIssuanceV2, CredentialPreviewV2,
            },
            CredentialIssuance,
        },
    },
    msg_types::{CredentialIssuanceKind, MessageKind, MessageType},
    AriesMessage,
};
use strum::IntoEnumIterator;

use super::{
    format::{CredentialFormatInputs, CredentialFormatService},
    protocol::{AcceptCredentialOptions, CredentialOptions, CredentialProtocol},
    CredentialBinding, CredentialExchangeData, CredentialExchangeRecord, CredentialRole,
    CredentialState, CREDENTIAL_PROTOCOL_V2, ISSUANCE_ABANDONED_PROBLEM_CODE,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::EventBus,
    protocols::{
        auto_accept::{compose_auto_accept, should_auto_respond, AutoAcceptPolicy},
        common::{
            ack_parts, create_problem_report, find_format_attachment, new_message_id,
            problem_report_reason, record_thread, split_format_attachments, FormatAttachment,
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
                AriesMessage::CredentialIssuance(CredentialIssuance::V2(
                    CredentialIssuanceV2::$variant(msg),
                )) => Ok(msg),
                other => Err(AriesVcxError::from_msg(
                    AriesVcxErrorKind::InvalidInput,
                    format!(
                        "Expected issue-credential {}, got {}",
                        stringify!($variant),
                        other.msg_type()
                    ),
                )),
            }
        }
    };
}

message_extractor!(proposal_message, ProposeCredential, ProposeCredentialV2);
message_extractor!(offer_message, OfferCredential, OfferCredentialV2);
message_extractor!(request_message, RequestCredential, RequestCredentialV2);
message_extractor!(credential_message, IssueCredential, IssueCredentialV2);
message_extractor!(ack_message, Ack, AckCredentialV2);
message_extractor!(problem_report_message, ProblemReport, CredIssuanceProblemReportV2);

type FormatService = Arc<dyn CredentialFormatService>;

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

fn previews_match(ours: Option<&CredentialPreviewV2>, theirs: Option<&CredentialPreviewV2>) -> bool {
    match (ours, theirs) {
        (None, None) => true,
        (Some(ours), Some(theirs)) => ours.same_attributes(theirs),
        _ => false,
    }
}

fn required_preview(preview: Option<CredentialPreviewV2>) -> VcxResult<CredentialPreviewV2> {
    preview.ok_or_else(|| {
        AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            "A credential offer needs a credential preview",
        )
    })
}

/// Issue credential 2.0, for both the issuer and the holder.
#[derive(Clone, Debug)]
pub struct CredentialV2Protocol {
    records: Repository<CredentialExchangeRecord>,
    messages: AgentMessageStore,
    events: EventBus,
    formats: Vec<FormatService>,
    auto_accept: AutoAcceptPolicy,
}

impl CredentialV2Protocol {
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

    pub fn records(&self) -> &Repository<CredentialExchangeRecord> {
        &self.records
    }

    fn policy(&self, record: &CredentialExchangeRecord) -> AutoAcceptPolicy {
        compose_auto_accept(record.auto_accept(), self.auto_accept)
    }

    /// Services for the formats the caller passed input for.
    fn services_for_inputs<'a>(
        &'a self,
        inputs: &'a CredentialFormatInputs,
    ) -> VcxResult<Vec<(&'a FormatService, &'a serde_json::Value)>> {
        if inputs.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "No credential format input given",
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
                            format!("No credential format service for {key}"),
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
                    "None of the credential formats {:?} is supported",
                    formats.iter().map(|f| f.format.as_str()).collect::<Vec<_>>()
                ),
            ));
        }
        Ok(services)
    }

    async fn save_message(
        &self,
        record: &CredentialExchangeRecord,
        role: AgentMessageRole,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<()> {
        self.messages
            .save_or_update_agent_message(record.id(), role, &message.into())
            .await
    }

    async fn find_message<T: Clone>(
        &self,
        record: &CredentialExchangeRecord,
        kind: CredentialIssuanceKind,
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
        record: &CredentialExchangeRecord,
        kind: CredentialIssuanceKind,
        extract: fn(&AriesMessage) -> VcxResult<&T>,
    ) -> VcxResult<T> {
        self.find_message(record, kind, extract)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No {kind} stored for credential exchange {}", record.id()),
                )
            })
    }

    pub async fn find_proposal_message(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<Option<ProposeCredentialV2>> {
        self.find_message(record, CredentialIssuanceKind::ProposeCredential, proposal_message)
            .await
    }

    pub async fn find_offer_message(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<Option<OfferCredentialV2>> {
        self.find_message(record, CredentialIssuanceKind::OfferCredential, offer_message)
            .await
    }

    pub async fn find_request_message(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<Option<RequestCredentialV2>> {
        self.find_message(record, CredentialIssuanceKind::RequestCredential, request_message)
            .await
    }

    pub async fn find_credential_message(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<Option<IssueCredentialV2>> {
        self.find_message(record, CredentialIssuanceKind::IssueCredential, credential_message)
            .await
    }

    fn problem_report(
        &self,
        record: &CredentialExchangeRecord,
        description: Option<String>,
    ) -> CredIssuanceProblemReportV2 {
        let (content, decorators) =
            create_problem_report(record, ISSUANCE_ABANDONED_PROBLEM_CODE, description);
        CredIssuanceProblemReportV2::with_decorators(new_message_id(), content.into(), decorators)
    }

    /// Turns a failure to process the peer's message into a problem report
    /// for the peer. A stored record is abandoned first. The report only
    /// carries `description`; the cause stays in the local error.
    async fn peer_failure(
        &self,
        record: &mut CredentialExchangeRecord,
        stored: bool,
        err: AriesVcxError,
        description: &str,
    ) -> AriesVcxError {
        warn!(
            "CredentialV2Protocol >> {description} on thread {}: {err}",
            record.thread_id()
        );
        if stored && !record.is_terminal() {
            if let Err(abandon_err) = self.abandon(record, err.msg().to_owned()).await {
                return abandon_err;
            }
        }
        let report = self.problem_report(record, Some(description.to_owned()));
        AriesVcxError::problem_report(
            format!("{description}: {}", err.msg()),
            ISSUANCE_ABANDONED_PROBLEM_CODE,
            report,
        )
    }

    async fn abandon(&self, record: &mut CredentialExchangeRecord, reason: String) -> VcxResult<()> {
        let previous = record.abandon(reason)?;
        self.records
            .update_and_emit(&self.events, record, previous)
            .await
    }

    async fn transition(
        &self,
        record: &mut CredentialExchangeRecord,
        expected: &[CredentialState],
        next: CredentialState,
    ) -> VcxResult<()> {
        let previous = record.transition(expected, next)?;
        self.records
            .update_and_emit(&self.events, record, previous)
            .await
    }

    fn new_record(
        &self,
        thread_id: &str,
        role: CredentialRole,
        state: CredentialState,
        connection_id: Option<&str>,
        auto_accept: Option<AutoAcceptPolicy>,
    ) -> CredentialExchangeRecord {
        CredentialExchangeRecord::new(
            thread_id,
            role,
            state,
            CREDENTIAL_PROTOCOL_V2,
            CredentialExchangeData::default(),
        )
        .with_connection_id(connection_id.map(ToOwned::to_owned))
        .with_auto_accept(auto_accept)
    }

    /// Record for an inbound message opening a thread, or the existing one
    /// after checking it may accept the message.
    async fn record_for_inbound(
        &self,
        ctx: &InboundMessageContext,
        role: CredentialRole,
        expected: CredentialState,
        new_state: CredentialState,
    ) -> VcxResult<(CredentialExchangeRecord, bool)> {
        let thread_id = ctx.message.thread_id();
        let connection_id = ctx.connection_id();
        let mut existing = self
            .records
            .find_by_thread(thread_id, role, connection_id)
            .await?;
        // Connectionless messages are answered over a fresh connection.
        if existing.is_none() && connection_id.is_some() {
            existing = self.records.find_by_thread(thread_id, role, None).await?;
        }
        match existing {
            Some(record) => {
                record.assert_state(&[expected])?;
                Ok((record, true))
            }
            None => {
                let record = self
                    .new_record(thread_id, role, new_state, connection_id, None)
                    .with_parent_thread_id(ctx.message.parent_thread_id().map(ToOwned::to_owned));
                Ok((record, false))
            }
        }
    }

    /// Persists a record reached through an inbound message, together with
    /// the message.
    async fn store_inbound(
        &self,
        record: &mut CredentialExchangeRecord,
        stored: bool,
        expected: CredentialState,
        next: CredentialState,
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

    async fn create_offer_attachments(
        &self,
        record: &CredentialExchangeRecord,
        inputs: &CredentialFormatInputs,
    ) -> VcxResult<Vec<FormatAttachment>> {
        let mut attachments = Vec::new();
        for (service, input) in self.services_for_inputs(inputs)? {
            attachments.push(service.create_offer(record, input).await?);
        }
        Ok(attachments)
    }

    async fn create_proposal_attachments(
        &self,
        record: &CredentialExchangeRecord,
        inputs: &CredentialFormatInputs,
    ) -> VcxResult<Vec<FormatAttachment>> {
        let mut attachments = Vec::new();
        for (service, input) in self.services_for_inputs(inputs)? {
            attachments.push(service.create_proposal(record, input).await?);
        }
        Ok(attachments)
    }

    fn build_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        attachments: Vec<FormatAttachment>,
        preview: CredentialPreviewV2,
        comment: Option<String>,
        goal_code: Option<String>,
        threaded: bool,
    ) -> VcxResult<OfferCredentialV2> {
        let (formats, offers_attach) = split_format_attachments(attachments)?;
        record.data.credential_attributes = Some(preview.attributes.clone());
        let content = OfferCredentialV2Content {
            goal_code,
            replacement_id: None,
            comment,
            credential_preview: preview,
            formats,
            offers_attach,
        };
        let decorators = OfferCredentialV2Decorators {
            thread: threaded.then(|| record_thread(record)),
            timing: Some(Timing::out_now()),
            service: None,
        };
        let id = if threaded {
            new_message_id()
        } else {
            record.thread_id().to_owned()
        };
        Ok(OfferCredentialV2::with_decorators(id, content, decorators))
    }

    fn build_proposal(
        &self,
        record: &mut CredentialExchangeRecord,
        attachments: Vec<FormatAttachment>,
        options: &CredentialOptions,
        threaded: bool,
    ) -> VcxResult<ProposeCredentialV2> {
        let (formats, filters_attach) = split_format_attachments(attachments)?;
        if let Some(preview) = &options.credential_preview {
            record.data.credential_attributes = Some(preview.attributes.clone());
        }
        let content = ProposeCredentialV2Content {
            goal_code: options.goal_code.clone(),
            comment: options.comment.clone(),
            credential_preview: options.credential_preview.clone(),
            formats,
            filters_attach,
        };
        let decorators = ProposeCredentialV2Decorators {
            thread: threaded.then(|| record_thread(record)),
            timing: Some(Timing::out_now()),
            service: None,
        };
        let id = if threaded {
            new_message_id()
        } else {
            record.thread_id().to_owned()
        };
        Ok(ProposeCredentialV2::with_decorators(id, content, decorators))
    }

    async fn proposal_matches_offer(
        &self,
        record: &CredentialExchangeRecord,
        proposal: &ProposeCredentialV2,
        offer: &OfferCredentialV2,
        offer_is_ours: bool,
    ) -> VcxResult<bool> {
        let formats = if offer_is_ours {
            &offer.content.formats
        } else {
            &proposal.content.formats
        };
        for service in self.supporting(formats) {
            let Some(proposal_attachment) = find_format_attachment(
                &proposal.content.formats,
                &proposal.content.filters_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            let offer_attachment =
                format_attachment(service, &offer.content.formats, &offer.content.offers_attach)?;
            let matches = if offer_is_ours {
                service
                    .should_auto_respond_to_proposal(record, proposal_attachment, offer_attachment)
                    .await?
            } else {
                service
                    .should_auto_respond_to_offer(record, proposal_attachment, offer_attachment)
                    .await?
            };
            if !matches {
                return Ok(false);
            }
        }
        Ok(previews_match(
            proposal.content.credential_preview.as_ref(),
            Some(&offer.content.credential_preview),
        ))
    }

    async fn offer_matches_request(
        &self,
        record: &CredentialExchangeRecord,
        offer: &OfferCredentialV2,
        request: &RequestCredentialV2,
    ) -> VcxResult<bool> {
        let proposal = self.find_proposal_message(record).await?;
        for service in self.supporting(&offer.content.formats) {
            let proposal_attachment = proposal.as_ref().and_then(|proposal| {
                find_format_attachment(
                    &proposal.content.formats,
                    &proposal.content.filters_attach,
                    |format| service.supports_format(format),
                )
            });
            let offer_attachment =
                format_attachment(service, &offer.content.formats, &offer.content.offers_attach)?;
            let Some(request_attachment) = find_format_attachment(
                &request.content.formats,
                &request.content.requests_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            if !service
                .should_auto_respond_to_request(
                    record,
                    proposal_attachment,
                    offer_attachment,
                    request_attachment,
                )
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn request_matches_credential(
        &self,
        record: &CredentialExchangeRecord,
        request: &RequestCredentialV2,
        credential: &IssueCredentialV2,
    ) -> VcxResult<bool> {
        for service in self.supporting(&request.content.formats) {
            let request_attachment = format_attachment(
                service,
                &request.content.formats,
                &request.content.requests_attach,
            )?;
            let Some(credential_attachment) = find_format_attachment(
                &credential.content.formats,
                &credential.content.credentials_attach,
                |format| service.supports_format(format),
            ) else {
                return Ok(false);
            };
            if !service
                .should_auto_respond_to_credential(record, request_attachment, credential_attachment)
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CredentialProtocol for CredentialV2Protocol {
    fn version(&self) -> &'static str {
        CREDENTIAL_PROTOCOL_V2
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        CredentialIssuanceKind::iter()
            .filter(|kind| *kind != CredentialIssuanceKind::CredentialPreview)
            .map(|kind| kind.msg_type())
            .collect()
    }

    async fn create_proposal(
        &self,
        connection: &ConnectionRecord,
        options: CredentialOptions,
    ) -> VcxResult<(CredentialExchangeRecord, AriesMessage)> {
        debug!(
            "CredentialV2Protocol::create_proposal >> connection: {}",
            connection.id()
        );
        connection.assert_ready()?;
        let mut record = self.new_record(
            &new_message_id(),
            CredentialRole::Holder,
            CredentialState::ProposalSent,
            Some(connection.id()),
            options.auto_accept,
        );
        let attachments = self
            .create_proposal_attachments(&record, &options.formats)
            .await?;
        let proposal = self.build_proposal(&mut record, attachments, &options, false)?;

        self.records.save_and_emit(&self.events, &record).await?;
        self.save_message(&record, AgentMessageRole::Sender, proposal.clone())
            .await?;
        Ok((record, proposal.into()))
    }

    async fn process_proposal(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord> {
        let proposal = proposal_message(&ctx.message)?;
        debug!("CredentialV2Protocol::process_proposal >> {}", proposal.id);
        let (mut record, stored) = self
            .record_for_inbound(
                ctx,
                CredentialRole::Issuer,
                CredentialState::OfferSent,
                CredentialState::ProposalReceived,
            )
            .await?;

        let processed: VcxResult<()> = async {
            for service in self.require_supporting(&proposal.content.formats)? {
                let attachment = format_attachment(
                    service,
                    &proposal.content.formats,
                    &proposal.content.filters_attach,
                )?;
                service.process_proposal(&record, attachment).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = processed {
            return Err(self
                .peer_failure(&mut record, stored, err, "Unable to process credential proposal")
                .await);
        }

        if let Some(preview) = &proposal.content.credential_preview {
            record.data.credential_attributes = Some(preview.attributes.clone());
        }
        self.store_inbound(
            &mut record,
            stored,
            CredentialState::OfferSent,
            CredentialState::ProposalReceived,
            proposal.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_proposal(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::ProposalReceived])?;
        let proposal = self
            .get_message(record, CredentialIssuanceKind::ProposeCredential, proposal_message)
            .await?;

        let mut attachments = Vec::new();
        for service in self.require_supporting(&proposal.content.formats)? {
            let attachment = format_attachment(
                service,
                &proposal.content.formats,
                &proposal.content.filters_attach,
            )?;
            attachments.push(
                service
                    .accept_proposal(record, attachment, options.formats.get(service.key()))
                    .await?,
            );
        }
        let preview = required_preview(
            options
                .credential_preview
                .or(proposal.content.credential_preview),
        )?;
        let offer = self.build_offer(record, attachments, preview, options.comment, None, true)?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, offer.clone())
            .await?;
        self.transition(
            record,
            &[CredentialState::ProposalReceived],
            CredentialState::OfferSent,
        )
        .await?;
        Ok(offer.into())
    }

    async fn negotiate_proposal(
        &self,
        record: &mut CredentialExchangeRecord,
        options: CredentialOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::ProposalReceived])?;
        if record.connection_id().is_none() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Negotiating a proposal needs a connection",
            ));
        }

        let attachments = self.create_offer_attachments(record, &options.formats).await?;
        let preview = required_preview(options.credential_preview)?;
        let offer = self.build_offer(
            record,
            attachments,
            preview,
            options.comment,
            options.goal_code,
            true,
        )?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, offer.clone())
            .await?;
        self.transition(
            record,
            &[CredentialState::ProposalReceived],
            CredentialState::OfferSent,
        )
        .await?;
        Ok(offer.into())
    }

    async fn create_offer(
        &self,
        connection: Option<&ConnectionRecord>,
        options: CredentialOptions,
    ) -> VcxResult<(CredentialExchangeRecord, AriesMessage)> {
        debug!(
            "CredentialV2Protocol::create_offer >> connection: {:?}",
            connection.map(|c| c.id())
        );
        if let Some(connection) = connection {
            connection.assert_ready()?;
        }
        let mut record = self.new_record(
            &new_message_id(),
            CredentialRole::Issuer,
            CredentialState::OfferSent,
            connection.map(|c| c.id()),
            options.auto_accept,
        );
        let attachments = self.create_offer_attachments(&record, &options.formats).await?;
        let preview = required_preview(options.credential_preview)?;
        let offer = self.build_offer(
            &mut record,
            attachments,
            preview,
            options.comment,
            options.goal_code,
            false,
        )?;

        self.records.save_and_emit(&self.events, &record).await?;
        self.save_message(&record, AgentMessageRole::Sender, offer.clone())
            .await?;
        Ok((record, offer.into()))
    }

    async fn process_offer(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord> {
        let offer = offer_message(&ctx.message)?;
        debug!("CredentialV2Protocol::process_offer >> {}", offer.id);
        let (mut record, stored) = self
            .record_for_inbound(
                ctx,
                CredentialRole::Holder,
                CredentialState::ProposalSent,
                CredentialState::OfferReceived,
            )
            .await?;

        let processed: VcxResult<()> = async {
            for service in self.require_supporting(&offer.content.formats)? {
                let attachment =
                    format_attachment(service, &offer.content.formats, &offer.content.offers_attach)?;
                service.process_offer(&record, attachment).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = processed {
            return Err(self
                .peer_failure(&mut record, stored, err, "Unable to process credential offer")
                .await);
        }

        record.data.credential_attributes = Some(offer.content.credential_preview.attributes.clone());
        self.store_inbound(
            &mut record,
            stored,
            CredentialState::ProposalSent,
            CredentialState::OfferReceived,
            offer.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::OfferReceived])?;
        let offer = self
            .get_message(record, CredentialIssuanceKind::OfferCredential, offer_message)
            .await?;

        let mut attachments = Vec::new();
        for service in self.require_supporting(&offer.content.formats)? {
            let attachment =
                format_attachment(service, &offer.content.formats, &offer.content.offers_attach)?;
            attachments.push(
                service
                    .accept_offer(record, attachment, options.formats.get(service.key()))
                    .await?,
            );
        }
        let (formats, requests_attach) = split_format_attachments(attachments)?;
        let request = RequestCredentialV2::with_decorators(
            new_message_id(),
            RequestCredentialV2Content {
                goal_code: None,
                comment: options.comment,
                formats,
                requests_attach,
            },
            RequestCredentialV2Decorators {
                thread: Some(record_thread(record)),
                timing: Some(Timing::out_now()),
                service: None,
            },
        );

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, request.clone())
            .await?;
        self.transition(
            record,
            &[CredentialState::OfferReceived],
            CredentialState::RequestSent,
        )
        .await?;
        Ok(request.into())
    }

    async fn negotiate_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        options: CredentialOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Holder)?;
        record.assert_state(&[CredentialState::OfferReceived])?;
        if record.connection_id().is_none() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Negotiating an offer needs a connection",
            ));
        }

        let attachments = self
            .create_proposal_attachments(record, &options.formats)
            .await?;
        let proposal = self.build_proposal(record, attachments, &options, true)?;

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, proposal.clone())
            .await?;
        self.transition(
            record,
            &[CredentialState::OfferReceived],
            CredentialState::ProposalSent,
        )
        .await?;
        Ok(proposal.into())
    }

    async fn decline_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Holder)?;
        self.transition(
            record,
            &[CredentialState::OfferReceived],
            CredentialState::Declined,
        )
        .await?;
        Ok(self.problem_report(record, reason).into())
    }

    async fn process_request(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord> {
        let request = request_message(&ctx.message)?;
        debug!("CredentialV2Protocol::process_request >> {}", request.id);
        let (mut record, stored) = self
            .record_for_inbound(
                ctx,
                CredentialRole::Issuer,
                CredentialState::OfferSent,
                CredentialState::RequestReceived,
            )
            .await?;

        let processed: VcxResult<()> = async {
            for service in self.require_supporting(&request.content.formats)? {
                let attachment = format_attachment(
                    service,
                    &request.content.formats,
                    &request.content.requests_attach,
                )?;
                service.process_request(&record, attachment).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = processed {
            return Err(self
                .peer_failure(&mut record, stored, err, "Unable to process credential request")
                .await);
        }

        if stored && record.connection_id().is_none() && ctx.connection_id().is_some() {
            record = record.with_connection_id(ctx.connection_id().map(ToOwned::to_owned));
        }
        self.store_inbound(
            &mut record,
            stored,
            CredentialState::OfferSent,
            CredentialState::RequestReceived,
            request.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_request(
        &self,
        record: &mut CredentialExchangeRecord,
        options: AcceptCredentialOptions,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Issuer)?;
        record.assert_state(&[CredentialState::RequestReceived])?;
        let request = self
            .get_message(record, CredentialIssuanceKind::RequestCredential, request_message)
            .await?;
        let offer = self.find_offer_message(record).await?;

        let mut attachments = Vec::new();
        for service in self.require_supporting(&request.content.formats)? {
            let request_attachment = format_attachment(
                service,
                &request.content.formats,
                &request.content.requests_attach,
            )?;
            let offer_attachment = offer.as_ref().and_then(|offer| {
                find_format_attachment(&offer.content.formats, &offer.content.offers_attach, |f| {
                    service.supports_format(f)
                })
            });
            attachments.push(
                service
                    .accept_request(
                        record,
                        offer_attachment,
                        request_attachment,
                        options.formats.get(service.key()),
                    )
                    .await?,
            );
        }
        let (formats, credentials_attach) = split_format_attachments(attachments)?;
        let credential = IssueCredentialV2::with_decorators(
            new_message_id(),
            IssueCredentialV2Content {
                goal_code: None,
                replacement_id: None,
                comment: options.comment,
                formats,
                credentials_attach,
            },
            IssueCredentialV2Decorators {
                thread: record_thread(record),
                please_ack: None,
                timing: Some(Timing::out_now()),
                service: None,
            },
        );

        record.override_auto_accept(options.auto_accept);
        self.save_message(record, AgentMessageRole::Sender, credential.clone())
            .await?;
        self.transition(
            record,
            &[CredentialState::RequestReceived],
            CredentialState::CredentialIssued,
        )
        .await?;
        Ok(credential.into())
    }

    async fn decline_request(
        &self,
        record: &mut CredentialExchangeRecord,
        reason: Option<String>,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Issuer)?;
        self.transition(
            record,
            &[CredentialState::RequestReceived],
            CredentialState::Declined,
        )
        .await?;
        Ok(self.problem_report(record, reason).into())
    }

    async fn process_credential(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord> {
        let credential = credential_message(&ctx.message)?;
        debug!("CredentialV2Protocol::process_credential >> {}", credential.id);
        let mut record = self
            .records
            .get_by_thread(
                ctx.message.thread_id(),
                CredentialRole::Holder,
                ctx.connection_id(),
            )
            .await?;
        record.assert_state(&[CredentialState::RequestSent])?;
        let request = self
            .get_message(&record, CredentialIssuanceKind::RequestCredential, request_message)
            .await?;

        let processed: VcxResult<Vec<CredentialBinding>> = async {
            let mut bindings = Vec::new();
            for service in self.require_supporting(&credential.content.formats)? {
                let request_attachment = format_attachment(
                    service,
                    &request.content.formats,
                    &request.content.requests_attach,
                )?;
                let credential_attachment = format_attachment(
                    service,
                    &credential.content.formats,
                    &credential.content.credentials_attach,
                )?;
                let credential_record_id = service
                    .process_credential(&record, request_attachment, credential_attachment)
                    .await?;
                bindings.push(CredentialBinding {
                    format: service.format().to_owned(),
                    credential_record_id,
                });
            }
            Ok(bindings)
        }
        .await;
        let bindings = match processed {
            Ok(bindings) => bindings,
            Err(err) => {
                return Err(self
                    .peer_failure(&mut record, true, err, "Unable to process credential")
                    .await)
            }
        };

        record.data.credentials = bindings;
        self.store_inbound(
            &mut record,
            true,
            CredentialState::RequestSent,
            CredentialState::CredentialReceived,
            credential.clone(),
        )
        .await?;
        Ok(record)
    }

    async fn accept_credential(
        &self,
        record: &mut CredentialExchangeRecord,
    ) -> VcxResult<AriesMessage> {
        record.assert_role(CredentialRole::Holder)?;
        let (content, decorators) = ack_parts(record_thread(record));
        let ack = AckCredentialV2::with_decorators(new_message_id(), content.into(), decorators);
        self.transition(
            record,
            &[CredentialState::CredentialReceived],
            CredentialState::Done,
        )
        .await?;
        Ok(ack.into())
    }

    async fn process_ack(&self, ctx: &InboundMessageContext) -> VcxResult<CredentialExchangeRecord> {
        let ack = ack_message(&ctx.message)?;
        debug!("CredentialV2Protocol::process_ack >> {}", ack.id);
        let mut record = self
            .records
            .get_by_thread(
                ctx.message.thread_id(),
                CredentialRole::Issuer,
                ctx.connection_id(),
            )
            .await?;
        self.transition(
            &mut record,
            &[CredentialState::CredentialIssued],
            CredentialState::Done,
        )
        .await?;
        Ok(record)
    }

    fn create_problem_report(
        &self,
        record: &CredentialExchangeRecord,
        description: Option<String>,
    ) -> AriesMessage {
        self.problem_report(record, description).into()
    }

    async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
    ) -> VcxResult<CredentialExchangeRecord> {
        let report = problem_report_message(&ctx.message)?;
        let mut record = self
            .records
            .get_by_thread_any_role(ctx.message.thread_id(), ctx.connection_id())
            .await?;
        let reason = problem_report_reason(&report.content.inner);
        if record.is_terminal() {
            warn!(
                "CredentialV2Protocol::process_problem_report >> record {} already {}, ignoring \
                 {reason}",
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
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool> {
        let proposal = self
            .get_message(record, CredentialIssuanceKind::ProposeCredential, proposal_message)
            .await?;
        let offer = self.find_offer_message(record).await?;
        should_auto_respond(self.policy(record), offer, |offer| async move {
            self.proposal_matches_offer(record, &proposal, &offer, true)
                .await
        })
        .await
    }

    async fn should_auto_respond_to_offer(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool> {
        let offer = self
            .get_message(record, CredentialIssuanceKind::OfferCredential, offer_message)
            .await?;
        let proposal = self.find_proposal_message(record).await?;
        should_auto_respond(self.policy(record), proposal, |proposal| async move {
            self.proposal_matches_offer(record, &proposal, &offer, false)
                .await
        })
        .await
    }

    async fn should_auto_respond_to_request(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool> {
        let request = self
            .get_message(record, CredentialIssuanceKind::RequestCredential, request_message)
            .await?;
        let offer = self.find_offer_message(record).await?;
        should_auto_respond(self.policy(record), offer, |offer| async move {
            self.offer_matches_request(record, &offer, &request).await
        })
        .await
    }

    async fn should_auto_respond_to_credential(
        &self,
        record: &CredentialExchangeRecord,
    ) -> VcxResult<bool> {
        let credential = self
            .get_message(record, CredentialIssuanceKind::IssueCredential, credential_message)
            .await?;
        let request = self.find_request_message(record).await?;
        should_auto_respond(self.policy(record), request, |request| async move {
            self.request_matches_credential(record, &request, &credential)
                .await
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> VcxResult<CredentialExchangeRecord> {
        self.records.get_by_id(id).await
    }

    async fn delete_by_id(&self, id: &str) -> VcxResult<()> {
        self.records.delete(id).await?;
        self.messages.delete_for_record(id).await
    }
}

#[cfg(test)]
mod tests {
    use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
    use messages::msg_fields::protocols::cred_issuance::CredentialAttr;
    use pretty_assertions::assert_eq;
    use test_utils::devsetup::dev_build_in_memory_wallet;

    use super::*;
    use crate::protocols::{
        connection::{
            ConnectionData, DidExchangeRole, DidExchangeState, DID_EXCHANGE_PROTOCOL_VERSION,
        },
        issuance::json_format::{json_credential_input, JsonCredentialFormat, JSON_CREDENTIAL_KEY},
    };

    struct Party {
        protocol: CredentialV2Protocol,
        format: Arc<JsonCredentialFormat>,
        connection: ConnectionRecord,
    }

    impl Party {
        fn new(role: DidExchangeRole, auto_accept: AutoAcceptPolicy) -> Self {
            let wallet: Arc<dyn BaseWallet> = dev_build_in_memory_wallet();
            let format = Arc::new(JsonCredentialFormat::new(wallet.clone()));
            let protocol = CredentialV2Protocol::new(
                wallet,
                EventBus::default(),
                vec![format.clone()],
                auto_accept,
            );
            let connection = ConnectionRecord::new(
                new_message_id(),
                role,
                DidExchangeState::Completed,
                DID_EXCHANGE_PROTOCOL_VERSION,
                ConnectionData::default(),
            );
            Self {
                protocol,
                format,
                connection,
            }
        }

        fn inbound(&self, message: AriesMessage) -> InboundMessageContext {
            InboundMessageContext::new(message).with_connection(self.connection.clone())
        }
    }

    fn parties() -> (Party, Party) {
        (
            Party::new(DidExchangeRole::Responder, AutoAcceptPolicy::Never),
            Party::new(DidExchangeRole::Requester, AutoAcceptPolicy::ContentApproved),
        )
    }

    fn preview(name: &str) -> CredentialPreviewV2 {
        CredentialPreviewV2::new(vec![CredentialAttr::builder()
            .name("name".to_owned())
            .value(name.to_owned())
            .build()])
    }

    fn options(name: &str) -> CredentialOptions {
        CredentialOptions::builder()
            .formats(CredentialFormatInputs::from([(
                JSON_CREDENTIAL_KEY.to_owned(),
                json_credential_input([("name", name)]),
            )]))
            .credential_preview(preview(name))
            .build()
    }

    #[tokio::test]
    async fn test_offer_first_issuance_reaches_done_on_both_sides() {
        let (issuer, holder) = parties();

        let (mut issuer_record, offer) = issuer
            .protocol
            .create_offer(Some(&issuer.connection), options("Alice"))
            .await
            .unwrap();
        assert_eq!(offer.id(), issuer_record.thread_id());
        assert!(offer.thread().is_none());

        let mut holder_record = holder.protocol.process_offer(&holder.inbound(offer)).await.unwrap();
        assert_eq!(holder_record.state(), CredentialState::OfferReceived);
        assert_eq!(holder_record.thread_id(), issuer_record.thread_id());

        let request = holder
            .protocol
            .accept_offer(&mut holder_record, AcceptCredentialOptions::default())
            .await
            .unwrap();
        assert_eq!(request.thread_id(), issuer_record.thread_id());

        issuer_record = issuer.protocol.process_request(&issuer.inbound(request)).await.unwrap();
        assert_eq!(issuer_record.state(), CredentialState::RequestReceived);
        assert!(!issuer
            .protocol
            .should_auto_respond_to_request(&issuer_record)
            .await
            .unwrap());

        let credential = issuer
            .protocol
            .accept_request(&mut issuer_record, AcceptCredentialOptions::default())
            .await
            .unwrap();
        assert_eq!(issuer_record.state(), CredentialState::CredentialIssued);

        holder_record = holder
            .protocol
            .process_credential(&holder.inbound(credential))
            .await
            .unwrap();
        assert_eq!(holder_record.state(), CredentialState::CredentialReceived);
        assert!(holder
            .protocol
            .should_auto_respond_to_credential(&holder_record)
            .await
            .unwrap());

        let binding = &holder_record.data.credentials[0];
        let stored = holder
            .format
            .get_credential(&binding.credential_record_id)
            .await
            .unwrap();
        assert_eq!(stored.attributes.get("name").map(String::as_str), Some("Alice"));

        let ack = holder.protocol.accept_credential(&mut holder_record).await.unwrap();
        assert_eq!(holder_record.state(), CredentialState::Done);

        issuer_record = issuer.protocol.process_ack(&issuer.inbound(ack)).await.unwrap();
        assert_eq!(issuer_record.state(), CredentialState::Done);
    }

    #[tokio::test]
    async fn test_offer_matching_proposal_is_content_approved() {
        let (issuer, holder) = parties();

        let (mut holder_record, proposal) = holder
            .protocol
            .create_proposal(&holder.connection, options("Alice"))
            .await
            .unwrap();
        assert_eq!(holder_record.state(), CredentialState::ProposalSent);

        let mut issuer_record = issuer
            .protocol
            .process_proposal(&issuer.inbound(proposal))
            .await
            .unwrap();
        assert_eq!(issuer_record.state(), CredentialState::ProposalReceived);

        let offer = issuer
            .protocol
            .accept_proposal(&mut issuer_record, AcceptCredentialOptions::default())
            .await
            .unwrap();
        assert_eq!(issuer_record.state(), CredentialState::OfferSent);

        holder_record = holder.protocol.process_offer(&holder.inbound(offer)).await.unwrap();
        assert_eq!(holder_record.state(), CredentialState::OfferReceived);
        assert!(holder
            .protocol
            .should_auto_respond_to_offer(&holder_record)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_negotiated_offer_is_not_content_approved() {
        let (issuer, holder) = parties();

        let (_, proposal) = holder
            .protocol
            .create_proposal(&holder.connection, options("Alice"))
            .await
            .unwrap();
        let mut issuer_record = issuer
            .protocol
            .process_proposal(&issuer.inbound(proposal))
            .await
            .unwrap();
        let offer = issuer
            .protocol
            .negotiate_proposal(&mut issuer_record, options("Bob"))
            .await
            .unwrap();

        let holder_record = holder.protocol.process_offer(&holder.inbound(offer)).await.unwrap();
        assert!(!holder
            .protocol
            .should_auto_respond_to_offer(&holder_record)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unsupported_offer_format_is_reported_without_record() {
        let (issuer, holder) = parties();

        let (_, mut offer) = issuer
            .protocol
            .create_offer(Some(&issuer.connection), options("Alice"))
            .await
            .unwrap();
        if let AriesMessage::CredentialIssuance(CredentialIssuance::V2(
            CredentialIssuanceV2::OfferCredential(offer),
        )) = &mut offer
        {
            offer.content.formats[0].format = "hlindy/cred-abstract@v2.0".to_owned();
        }
        let thread_id = offer.thread_id().to_owned();

        let err = holder
            .protocol
            .process_offer(&holder.inbound(offer))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::ProblemReport);
        let problem = err.into_problem().unwrap();
        assert_eq!(problem.code, ISSUANCE_ABANDONED_PROBLEM_CODE);
        assert_eq!(problem.report.thread_id(), thread_id);

        assert!(holder
            .protocol
            .records()
            .find_by_thread(&thread_id, CredentialRole::Holder, Some(holder.connection.id()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_message_on_finished_exchange_is_rejected() {
        let (issuer, holder) = parties();

        let (_, offer) = issuer
            .protocol
            .create_offer(Some(&issuer.connection), options("Alice"))
            .await
            .unwrap();
        let mut holder_record = holder
            .protocol
            .process_offer(&holder.inbound(offer.clone()))
            .await
            .unwrap();
        holder
            .protocol
            .decline_offer(&mut holder_record, Some("not interested".to_owned()))
            .await
            .unwrap();
        assert_eq!(holder_record.state(), CredentialState::Declined);

        let err = holder
            .protocol
            .process_offer(&holder.inbound(offer))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::IllegalStateTransition);
    }

    #[tokio::test]
    async fn test_decline_abandons_issuer_record() {
        let (issuer, holder) = parties();

        let (issuer_record, offer) = issuer
            .protocol
            .create_offer(Some(&issuer.connection), options("Alice"))
            .await
            .unwrap();
        let mut holder_record = holder.protocol.process_offer(&holder.inbound(offer)).await.unwrap();
        let report = holder
            .protocol
            .decline_offer(&mut holder_record, Some("not interested".to_owned()))
            .await
            .unwrap();

        let abandoned = issuer
            .protocol
            .process_problem_report(&issuer.inbound(report))
            .await
            .unwrap();
        assert_eq!(abandoned.id(), issuer_record.id());
        assert_eq!(abandoned.state(), CredentialState::Abandoned);
        assert_eq!(
            abandoned.error_message(),
            Some("issuance-abandoned: not interested")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_transcript() {
        let (issuer, _) = parties();

        let (record, _) = issuer
            .protocol
            .create_offer(None, options("Alice"))
            .await
            .unwrap();
        assert!(issuer.protocol.find_offer_message(&record).await.unwrap().is_some());

        issuer.protocol.delete_by_id(record.id()).await.unwrap();
        assert!(issuer.protocol.find_offer_message(&record).await.unwrap().is_none());
        assert_eq!(
            issuer.protocol.get_by_id(record.id()).await.unwrap_err().kind(),
            AriesVcxErrorKind::RecordNotFound
        );
    }

    #[test]
    fn test_supported_types_exclude_preview() {
        let (issuer, _) = parties();
        let types = issuer.protocol.supported_message_types();
        assert_eq!(types.len(), 6);
        assert!(!types.contains(&CredentialIssuanceKind::CredentialPreview.msg_type()));
    }
}
