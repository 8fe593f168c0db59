use did_doc::schema::did_doc::DidDocument;
use did_peer::{num_algo_from_peer_did, peer_did::numalgos::numalgo1, PeerDidNumAlgo};
use did_resolver::{
    did::{is_did, strip_did_url},
    registry::ResolverRegistry,
    traits::DidResolvable,
};
use messages::{
    decorators::{attachment::Attachment, thread::Thread, timing::Timing},
    misc::NoDecorators as NoContent,
    msg_fields::protocols::{
        did_exchange::{
            complete::{Complete, CompleteDecorators},
            problem_report::{
                ProblemCode, ProblemReport, ProblemReportContent, ProblemReportDecorators,
            },
            request::{Request, RequestContent, RequestDecorators},
            response::{Response, ResponseContent, ResponseDecorators},
        },
        out_of_band::invitation::OobService,
    },
    AriesMessage,
};
use public_key::Key;

use super::{
    jws::{
        attachment_content, did_doc_attachment, did_rotate_attachment, sign_attachment,
        verify_attachment,
    },
    CreateRequestConfig, DidExchangeConfig,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        common::{new_message_id, record_thread},
        connection::{
            service::outbound_to_document, ConnectionData, ConnectionRecord, ConnectionService,
            DidExchangeRole, DidExchangeState, DID_EXCHANGE_PROTOCOL_VERSION,
        },
        out_of_band::{OutOfBandRecord, OutOfBandRole, OutOfBandService, OutOfBandState},
    },
    transport::{InboundMessageContext, OutboundMessage},
};

/// Drives both roles of the did-exchange handshake over connection and
/// out-of-band records.
#[derive(Clone, Debug)]
pub struct DidExchangeService {
    connections: ConnectionService,
    out_of_band: OutOfBandService,
    resolver: ResolverRegistry,
    config: DidExchangeConfig,
}

impl DidExchangeService {
    pub fn new(
        connections: ConnectionService,
        out_of_band: OutOfBandService,
        resolver: ResolverRegistry,
        config: DidExchangeConfig,
    ) -> Self {
        Self {
            connections,
            out_of_band,
            resolver,
            config,
        }
    }

    pub fn connections(&self) -> &ConnectionService {
        &self.connections
    }

    pub fn out_of_band(&self) -> &OutOfBandService {
        &self.out_of_band
    }

    pub fn config(&self) -> &DidExchangeConfig {
        &self.config
    }

    /// The connection's own setting, else the agent default.
    pub fn should_auto_accept(&self, connection: &ConnectionRecord) -> bool {
        connection
            .data
            .auto_accept_connection
            .unwrap_or(self.config.auto_accept_connections)
    }

    pub async fn create_request(
        &self,
        out_of_band: &mut OutOfBandRecord,
        config: CreateRequestConfig,
    ) -> VcxResult<(ConnectionRecord, Request)> {
        debug!(
            "DidExchangeService::create_request >> out of band record: {}",
            out_of_band.id()
        );
        out_of_band.assert_role(OutOfBandRole::Receiver)?;
        out_of_band.assert_state(&[OutOfBandState::PrepareResponse])?;
        if out_of_band.data.invitation.content.handshake_protocols.is_none() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!(
                    "Invitation {} does not offer a handshake protocol",
                    out_of_band.data.invitation_id()
                ),
            ));
        }

        let did_record = match &config.our_did {
            Some(did) => self.connections.did_repository().get_created_did(did).await?,
            None => {
                self.connections
                    .create_peer_did(self.config.peer_num_algo, &self.config.endpoint, &[])
                    .await?
            }
        };
        let did = did_record.did().to_owned();
        let did_doc = match num_algo_from_peer_did(&did) {
            Ok(PeerDidNumAlgo::GenesisDoc) => Some(
                sign_attachment(
                    self.connections.wallet().as_ref(),
                    did_doc_attachment(did_record.did_document())?,
                    &did_record.recipient_keys()?,
                )
                .await?,
            ),
            _ => None,
        };

        let invitation_id = out_of_band.data.invitation_id().to_owned();
        let id = new_message_id();
        let content = RequestContent {
            label: config.label.unwrap_or_else(|| self.config.label.clone()),
            goal_code: config.goal_code,
            goal: config.goal,
            did: did.clone(),
            did_doc,
        };
        let decorators = RequestDecorators {
            thread: Some(Thread::with_parent(id.clone(), invitation_id.clone())),
            timing: Some(Timing::out_now()),
        };
        let request = Request::with_decorators(id.clone(), content, decorators);

        let mut connection = ConnectionRecord::new(
            id,
            DidExchangeRole::Requester,
            DidExchangeState::InvitationReceived,
            DID_EXCHANGE_PROTOCOL_VERSION,
            ConnectionData {
                did: Some(did),
                their_label: out_of_band.data.invitation.content.label.clone(),
                alias: config.alias.or_else(|| out_of_band.data.alias.clone()),
                invitation_did: out_of_band.data.invitation_did()?,
                out_of_band_id: Some(out_of_band.id().to_owned()),
                auto_accept_connection: config
                    .auto_accept_connection
                    .or(out_of_band.data.auto_accept_connection),
                ..Default::default()
            },
        )
        .with_parent_thread_id(Some(invitation_id));
        self.connections.save(&connection).await?;
        let previous = connection.transition(
            &[DidExchangeState::InvitationReceived],
            DidExchangeState::RequestSent,
        )?;
        self.connections.update_state(&connection, previous).await?;
        Ok((connection, request))
    }

    /// Addresses a request to the first service of the invitation it
    /// answers. No connection is ready yet, so the connection record only
    /// supplies our DID.
    pub async fn request_outbound(
        &self,
        out_of_band: &OutOfBandRecord,
        connection: &ConnectionRecord,
        request: Request,
    ) -> VcxResult<OutboundMessage> {
        let mut outbound = match out_of_band.data.invitation.content.services.first() {
            Some(OobService::Inline(service)) => OutboundMessage {
                message: AriesMessage::from(request),
                connection_id: None,
                endpoint: service.service_endpoint().clone(),
                recipient_keys: did_keys(service.recipient_keys())?,
                routing_keys: did_keys(service.routing_keys())?,
                sender_key: None,
            },
            Some(OobService::Did(did)) => {
                let document = self.resolver.resolve(strip_did_url(did)).await?;
                outbound_to_document(&document, request)?
            }
            None => {
                return Err(AriesVcxError::from_msg(
                    AriesVcxErrorKind::InvalidInput,
                    format!(
                        "Invitation {} has no service to send the request to",
                        out_of_band.data.invitation_id()
                    ),
                ))
            }
        };
        outbound.connection_id = Some(connection.id().to_owned());
        outbound.sender_key = self.our_key(connection).await?;
        Ok(outbound)
    }

    pub async fn process_request(
        &self,
        _ctx: &InboundMessageContext,
        request: &Request,
    ) -> VcxResult<ConnectionRecord> {
        debug!("DidExchangeService::process_request >> id: {}", request.id);
        let thread = request
            .decorators
            .thread
            .clone()
            .unwrap_or_else(|| Thread::new(request.id.clone()));
        let thread_id = thread.thid_or(&request.id).to_owned();
        let reply_thread = match &thread.pthid {
            Some(pthid) => Thread::with_parent(thread_id.clone(), pthid.clone()),
            None => Thread::new(thread_id.clone()),
        };
        let Some(invitation_id) = thread.pthid.as_deref() else {
            return Err(problem(
                "Missing reference to invitation.",
                ProblemCode::RequestNotAccepted,
                reply_thread,
            ));
        };
        if self.connections.find_by_thread(&thread_id).await?.is_some() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::DuplicateRecord,
                format!("A connection for thread {thread_id} already exists"),
            ));
        }

        let out_of_band = if is_did(invitation_id) {
            self.out_of_band
                .create_from_implicit_invitation(invitation_id, &thread_id)
                .await
                .map_err(|err| {
                    problem(
                        format!("No public DID {invitation_id} to connect to: {err}"),
                        ProblemCode::RequestNotAccepted,
                        reply_thread.clone(),
                    )
                })?
        } else {
            self.out_of_band
                .find_by_created_invitation_id(invitation_id, None)
                .await?
                .ok_or_else(|| {
                    problem(
                        format!("No out-of-band record for invitation {invitation_id}"),
                        ProblemCode::RequestNotAccepted,
                        reply_thread.clone(),
                    )
                })?
        };
        out_of_band.assert_role(OutOfBandRole::Sender)?;
        out_of_band.assert_state(&[OutOfBandState::AwaitResponse])?;

        let their_did = &request.content.did;
        let invitation_keys = self.out_of_band.invitation_keys(&out_of_band).await?;
        let verified = match num_algo_from_peer_did(their_did) {
            Ok(PeerDidNumAlgo::GenesisDoc) => {
                self.genesis_document(their_did, request.content.did_doc.as_ref(), &invitation_keys)
                    .await
            }
            _ => self.resolve_their_did(their_did).await,
        };
        let their_document =
            verified.map_err(|explain| problem(explain, ProblemCode::RequestNotAccepted, reply_thread))?;
        self.connections
            .did_repository()
            .store_received_did(their_did, their_document)
            .await?;

        let connection = ConnectionRecord::new(
            thread_id,
            DidExchangeRole::Responder,
            DidExchangeState::RequestReceived,
            DID_EXCHANGE_PROTOCOL_VERSION,
            ConnectionData {
                their_did: Some(their_did.clone()),
                their_label: Some(request.content.label.clone()),
                alias: out_of_band.data.alias.clone(),
                out_of_band_id: Some(out_of_band.id().to_owned()),
                auto_accept_connection: out_of_band.data.auto_accept_connection,
                ..Default::default()
            },
        )
        .with_parent_thread_id(Some(invitation_id.to_owned()));
        self.connections.save(&connection).await?;
        Ok(connection)
    }

    pub async fn create_response(&self, connection: &mut ConnectionRecord) -> VcxResult<Response> {
        debug!("DidExchangeService::create_response >> connection: {}", connection.id());
        connection.assert_role(DidExchangeRole::Responder)?;
        connection.assert_state(&[DidExchangeState::RequestReceived])?;
        let mut out_of_band = self.connection_out_of_band(connection).await?;
        let invitation_keys = self.out_of_band.invitation_keys(&out_of_band).await?;

        let num_algo = match connection.their_did().map(num_algo_from_peer_did) {
            Some(Ok(PeerDidNumAlgo::InceptionKeyWithoutDoc)) | Some(Err(_)) | None => {
                self.config.peer_num_algo
            }
            Some(Ok(num_algo)) => num_algo,
        };
        let did_record = self
            .connections
            .create_peer_did(num_algo, &self.config.endpoint, &[])
            .await?;
        let did = did_record.did().to_owned();
        let wallet = self.connections.wallet().as_ref();
        let mut content = ResponseContent::builder().did(did.clone()).build();
        if num_algo == PeerDidNumAlgo::GenesisDoc {
            let attachment = did_doc_attachment(did_record.did_document())?;
            content.did_doc = Some(sign_attachment(wallet, attachment, &invitation_keys).await?);
        } else {
            let attachment = did_rotate_attachment(&did);
            content.did_rotate = Some(sign_attachment(wallet, attachment, &invitation_keys).await?);
        }
        let decorators = ResponseDecorators {
            thread: record_thread(connection),
            timing: Some(Timing::out_now()),
        };

        connection.data.did = Some(did);
        let previous = connection.transition(
            &[DidExchangeState::RequestReceived],
            DidExchangeState::ResponseSent,
        )?;
        self.connections.update_state(connection, previous).await?;
        self.close_sender_out_of_band(&mut out_of_band).await?;
        Ok(Response::with_decorators(new_message_id(), content, decorators))
    }

    pub async fn process_response(
        &self,
        _ctx: &InboundMessageContext,
        response: &Response,
    ) -> VcxResult<ConnectionRecord> {
        debug!("DidExchangeService::process_response >> id: {}", response.id);
        let thread_id = response.decorators.thread.thid_or(&response.id);
        let mut connection = self.connections.get_by_thread(thread_id).await?;
        connection.assert_role(DidExchangeRole::Requester)?;
        connection.assert_state(&[DidExchangeState::RequestSent])?;
        let out_of_band = self.connection_out_of_band(&connection).await?;
        let invitation_keys = self.received_invitation_keys(&out_of_band).await?;

        let their_did = &response.content.did;
        let verified = match num_algo_from_peer_did(their_did) {
            Ok(PeerDidNumAlgo::GenesisDoc) => {
                self.genesis_document(their_did, response.content.did_doc.as_ref(), &invitation_keys)
                    .await
            }
            _ => match self
                .signed_content(response.content.did_rotate.as_ref(), &invitation_keys, "DID rotate")
                .await
            {
                Ok(signed_did) if signed_did == their_did.as_bytes() => {
                    self.resolve_their_did(their_did).await
                }
                Ok(_) => Err(format!("DID rotate attachment does not match DID {their_did}")),
                Err(explain) => Err(explain),
            },
        };
        let their_document = match verified {
            Ok(document) => document,
            Err(explain) => {
                return Err(self
                    .reject(&mut connection, ProblemCode::ResponseNotAccepted, explain)
                    .await)
            }
        };
        self.connections
            .did_repository()
            .store_received_did(their_did, their_document)
            .await?;

        connection.data.their_did = Some(their_did.clone());
        let previous = connection.transition(
            &[DidExchangeState::RequestSent],
            DidExchangeState::ResponseReceived,
        )?;
        self.connections.update_state(&connection, previous).await?;
        Ok(connection)
    }

    pub async fn create_complete(&self, connection: &mut ConnectionRecord) -> VcxResult<Complete> {
        connection.assert_role(DidExchangeRole::Requester)?;
        connection.assert_state(&[DidExchangeState::ResponseReceived])?;
        let decorators = CompleteDecorators {
            thread: record_thread(connection),
            timing: Some(Timing::out_now()),
        };

        let previous = connection.transition(
            &[DidExchangeState::ResponseReceived],
            DidExchangeState::Completed,
        )?;
        self.connections.update_state(connection, previous).await?;
        let mut out_of_band = self.connection_out_of_band(connection).await?;
        if out_of_band.state() == OutOfBandState::PrepareResponse {
            self.out_of_band
                .update_state(
                    &mut out_of_band,
                    &[OutOfBandState::PrepareResponse],
                    OutOfBandState::Done,
                )
                .await?;
        }
        Ok(Complete::with_decorators(
            new_message_id(),
            NoContent,
            decorators,
        ))
    }

    pub async fn process_complete(
        &self,
        _ctx: &InboundMessageContext,
        complete: &Complete,
    ) -> VcxResult<ConnectionRecord> {
        debug!("DidExchangeService::process_complete >> id: {}", complete.id);
        let thread = &complete.decorators.thread;
        let mut connection = self
            .connections
            .get_by_thread(thread.thid_or(&complete.id))
            .await?;
        connection.assert_role(DidExchangeRole::Responder)?;
        connection.assert_state(&[DidExchangeState::ResponseSent])?;
        if thread.pthid.is_none() || thread.pthid.as_deref() != connection.parent_thread_id() {
            return Err(self
                .reject(
                    &mut connection,
                    ProblemCode::CompleteRejected,
                    "Invalid or missing parent thread id referencing the invitation.".to_owned(),
                )
                .await);
        }

        let previous = connection.transition(
            &[DidExchangeState::ResponseSent],
            DidExchangeState::Completed,
        )?;
        self.connections.update_state(&connection, previous).await?;
        Ok(connection)
    }

    /// Refuses a received request. The returned report goes to the
    /// requester's DID, which is already known.
    pub async fn decline_request(
        &self,
        connection: &mut ConnectionRecord,
        reason: Option<String>,
    ) -> VcxResult<ProblemReport> {
        connection.assert_role(DidExchangeRole::Responder)?;
        connection.assert_state(&[DidExchangeState::RequestReceived])?;
        let explain = reason.unwrap_or_else(|| "Request declined".to_owned());
        let report = problem_report(
            explain.clone(),
            ProblemCode::RequestNotAccepted,
            record_thread(connection),
        );
        self.connections.abandon(connection, explain).await?;
        let mut out_of_band = self.connection_out_of_band(connection).await?;
        self.close_sender_out_of_band(&mut out_of_band).await?;
        Ok(report)
    }

    pub async fn process_problem_report(
        &self,
        report: &ProblemReport,
    ) -> VcxResult<ConnectionRecord> {
        let thread_id = report.decorators.thread.thid_or(&report.id);
        let mut connection = self.connections.get_by_thread(thread_id).await?;
        let reason = match (&report.content.problem_code, &report.content.explain) {
            (Some(code), Some(explain)) => format!("{code}: {explain}"),
            (Some(code), None) => code.to_string(),
            (None, Some(explain)) => explain.clone(),
            (None, None) => "Problem report without details".to_owned(),
        };
        if connection.is_terminal() {
            warn!(
                "Ignoring problem report on connection {} in terminal state {}: {reason}",
                connection.id(),
                connection.state()
            );
            return Ok(connection);
        }
        self.connections.abandon(&mut connection, reason).await?;
        Ok(connection)
    }

    async fn our_key(&self, connection: &ConnectionRecord) -> VcxResult<Option<Key>> {
        let Some(did) = connection.did() else {
            return Ok(None);
        };
        Ok(self
            .connections
            .did_repository()
            .get_created_did(did)
            .await?
            .recipient_keys()?
            .into_iter()
            .next())
    }

    async fn connection_out_of_band(
        &self,
        connection: &ConnectionRecord,
    ) -> VcxResult<OutOfBandRecord> {
        let id = connection.data.out_of_band_id.as_deref().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!("Connection {} has no out-of-band record", connection.id()),
            )
        })?;
        self.out_of_band.get_by_id(id).await
    }

    async fn close_sender_out_of_band(&self, out_of_band: &mut OutOfBandRecord) -> VcxResult<()> {
        if !out_of_band.data.reusable && out_of_band.state() == OutOfBandState::AwaitResponse {
            self.out_of_band
                .update_state(
                    out_of_band,
                    &[OutOfBandState::AwaitResponse],
                    OutOfBandState::Done,
                )
                .await?;
        }
        Ok(())
    }

    /// Keys a received invitation vouches for: inline keys and the keys of
    /// every DID service.
    async fn received_invitation_keys(&self, out_of_band: &OutOfBandRecord) -> VcxResult<Vec<Key>> {
        let mut keys = out_of_band.data.inline_recipient_keys()?;
        for did in out_of_band.data.did_services() {
            keys.extend(self.resolver.resolve(did).await?.recipient_keys()?);
        }
        Ok(keys)
    }

    async fn resolve_their_did(&self, did: &str) -> Result<DidDocument, String> {
        self.resolver
            .resolve(did)
            .await
            .map_err(|err| format!("Unable to resolve DID {did}: {err}"))
    }

    /// Document attached for a numalgo 1 DID. It must hash to the DID and be
    /// signed by its own keys or by the invitation's.
    async fn genesis_document(
        &self,
        did: &str,
        attachment: Option<&Attachment>,
        invitation_keys: &[Key],
    ) -> Result<DidDocument, String> {
        let unverified = attachment
            .map(|attachment| attachment_content(attachment).map_err(|err| err.to_string()))
            .transpose()?
            .map(|content| {
                serde_json::from_slice::<DidDocument>(&content).map_err(|err| err.to_string())
            })
            .transpose()?
            .ok_or_else(|| "DID document attachment is missing".to_owned())?;
        numalgo1::verify_genesis_document(did, &unverified).map_err(|err| err.to_string())?;

        let mut trusted = unverified
            .authentication_keys()
            .map_err(|err| err.to_string())?;
        trusted.extend(unverified.recipient_keys().map_err(|err| err.to_string())?);
        trusted.extend_from_slice(invitation_keys);
        self.signed_content(attachment, &trusted, "DID document")
            .await?;
        Ok(unverified)
    }

    /// Content of a signed attachment, provided every signer is trusted.
    async fn signed_content(
        &self,
        attachment: Option<&Attachment>,
        trusted: &[Key],
        what: &str,
    ) -> Result<Vec<u8>, String> {
        let attachment = attachment.ok_or_else(|| format!("{what} attachment is missing"))?;
        if attachment.data.jws.is_none() {
            return Err(format!("{what} signature is missing"));
        }
        let verification = verify_attachment(self.connections.wallet().as_ref(), attachment)
            .await
            .map_err(|err| err.to_string())?;
        if !verification.is_valid {
            return Err(format!("{what} signature is invalid"));
        }
        if let Some(untrusted) = verification
            .signer_keys
            .iter()
            .find(|key| !trusted.contains(*key))
        {
            return Err(format!(
                "{what} is signed by {}, which is not a key of the invitation",
                untrusted.base58()
            ));
        }
        attachment_content(attachment).map_err(|err| err.to_string())
    }

    async fn reject(
        &self,
        connection: &mut ConnectionRecord,
        code: ProblemCode,
        explain: String,
    ) -> AriesVcxError {
        warn!(
            "Rejecting did-exchange on connection {}: {explain}",
            connection.id()
        );
        if let Err(err) = self.connections.abandon(connection, explain.clone()).await {
            error!(
                "Unable to abandon connection {}: {err}",
                connection.id()
            );
        }
        problem(explain, code, record_thread(connection))
    }
}

fn did_keys(references: &[String]) -> VcxResult<Vec<Key>> {
    references
        .iter()
        .map(|reference| Ok(Key::from_did_key(reference)?))
        .collect()
}

fn problem_report(explain: String, code: ProblemCode, thread: Thread) -> ProblemReport {
    let content = ProblemReportContent::builder()
        .problem_code(code)
        .explain(explain)
        .build();
    let decorators = ProblemReportDecorators::builder()
        .thread(thread)
        .timing(Timing::out_now())
        .build();
    ProblemReport::with_decorators(new_message_id(), content, decorators)
}

fn problem(explain: impl Into<String>, code: ProblemCode, thread: Thread) -> AriesVcxError {
    let explain = explain.into();
    let report = problem_report(explain.clone(), code, thread);
    AriesVcxError::problem_report(explain, code.to_string(), report)
}
