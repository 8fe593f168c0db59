use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::{search_filter::SearchFilter, BaseWallet};
use did_doc::schema::service::Service;
use messages::{
    decorators::{attachment::Attachment, thread::Thread, timing::Timing},
    misc::NoDecorators as NoContent,
    msg_fields::protocols::out_of_band::{
        invitation::{Invitation, InvitationContent, InvitationDecorators, OobService},
        reuse::{HandshakeReuse, HandshakeReuseDecorators},
        reuse_accepted::{HandshakeReuseAccepted, HandshakeReuseAcceptedDecorators},
    },
    msg_types::Protocol,
};
use public_key::Key;
use typed_builder::TypedBuilder;
use url::Url;

use super::{
    OutOfBandData, OutOfBandRecord, OutOfBandRole, OutOfBandState, OUT_OF_BAND_PROTOCOL_VERSION,
};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::{AgentEvent, EventBus},
    protocols::{
        common::new_message_id,
        connection::{ConnectionRecord, DidRepository},
    },
    storage::Repository,
    transport::InboundMessageContext,
};

#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct CreateInvitationConfig {
    pub label: Option<String>,
    pub alias: Option<String>,
    pub goal_code: Option<String>,
    pub goal: Option<String>,
    pub image_url: Option<String>,
    /// Offer a did-exchange; defaults to true when no requests are attached.
    pub handshake: Option<bool>,
    #[builder(setter(!strip_option))]
    pub multi_use: bool,
    pub auto_accept_connection: Option<bool>,
    #[builder(setter(!strip_option))]
    pub requests_attach: Vec<Attachment>,
}

#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct ReceiveInvitationConfig {
    pub alias: Option<String>,
    pub auto_accept_connection: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct OutOfBandService {
    wallet: Arc<dyn BaseWallet>,
    repository: Repository<OutOfBandRecord>,
    did_repository: DidRepository,
    events: EventBus,
    endpoint: Url,
}

impl OutOfBandService {
    pub fn new(wallet: Arc<dyn BaseWallet>, events: EventBus, endpoint: Url) -> Self {
        Self {
            repository: Repository::new(wallet.clone()),
            did_repository: DidRepository::new(wallet.clone()),
            wallet,
            events,
            endpoint,
        }
    }

    pub async fn create_invitation(
        &self,
        config: CreateInvitationConfig,
    ) -> VcxResult<OutOfBandRecord> {
        debug!("OutOfBandService::create_invitation >> config: {config:?}");
        let handshake = config
            .handshake
            .unwrap_or(config.requests_attach.is_empty());
        if !handshake && config.requests_attach.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "An invitation needs a handshake protocol or attached requests",
            ));
        }
        if config.multi_use && !config.requests_attach.is_empty() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "A multi use invitation cannot carry attached requests",
            ));
        }

        let key = self.wallet.create_key(None).await?;
        let service = Service::new_didcomm_v1(
            "#inline-0".to_owned(),
            self.endpoint.clone(),
            vec![key.to_did_key()],
            vec![],
        );
        let content = InvitationContent {
            label: config.label,
            goal_code: config.goal_code,
            goal: config.goal,
            accept: Some(vec!["didcomm/aip1".to_owned()]),
            handshake_protocols: handshake.then(|| vec![Protocol::DidExchangeV1.pid()]),
            services: vec![OobService::Inline(Box::new(service))],
            requests_attach: (!config.requests_attach.is_empty())
                .then_some(config.requests_attach),
            image_url: config.image_url,
        };
        let decorators = InvitationDecorators {
            timing: Some(Timing::out_now()),
        };
        let invitation = Invitation::with_decorators(new_message_id(), content, decorators);

        let record = OutOfBandRecord::new(
            invitation.id.clone(),
            OutOfBandRole::Sender,
            OutOfBandState::AwaitResponse,
            OUT_OF_BAND_PROTOCOL_VERSION,
            OutOfBandData {
                invitation,
                alias: config.alias,
                reusable: config.multi_use,
                recipient_key_fingerprints: vec![key.fingerprint()],
                reuse_connection_id: None,
                auto_accept_connection: config.auto_accept_connection,
            },
        );
        self.repository.save_and_emit(&self.events, &record).await?;
        debug!(
            "OutOfBandService::create_invitation << invitation {}",
            record.data.invitation_id()
        );
        Ok(record)
    }

    pub async fn receive_invitation(
        &self,
        invitation: Invitation,
        config: ReceiveInvitationConfig,
    ) -> VcxResult<OutOfBandRecord> {
        debug!(
            "OutOfBandService::receive_invitation >> invitation: {}",
            invitation.id
        );
        if self
            .find_by_received_invitation_id(&invitation.id)
            .await?
            .is_some()
        {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::DuplicateRecord,
                format!(
                    "An invitation with id {} has already been received. Invitations should have a unique id.",
                    invitation.id
                ),
            ));
        }
        let mut data = OutOfBandData {
            invitation,
            alias: config.alias,
            reusable: false,
            recipient_key_fingerprints: Vec::new(),
            reuse_connection_id: None,
            auto_accept_connection: config.auto_accept_connection,
        };
        data.recipient_key_fingerprints = data
            .inline_recipient_keys()?
            .iter()
            .map(Key::fingerprint)
            .collect();

        let record = OutOfBandRecord::new(
            data.invitation_id().to_owned(),
            OutOfBandRole::Receiver,
            OutOfBandState::PrepareResponse,
            OUT_OF_BAND_PROTOCOL_VERSION,
            data,
        );
        self.repository.save_and_emit(&self.events, &record).await?;
        Ok(record)
    }

    /// A request whose parent thread is one of our public DIDs answers an
    /// invitation that was never sent. Stands one in, reusable, so the
    /// exchange can be processed like any other.
    pub async fn create_from_implicit_invitation(
        &self,
        did: &str,
        thread_id: &str,
    ) -> VcxResult<OutOfBandRecord> {
        let created = self.did_repository.get_created_did(did).await?;
        let content = InvitationContent::builder()
            .handshake_protocols(vec![Protocol::DidExchangeV1.pid()])
            .services(vec![OobService::Did(did.to_owned())])
            .build();
        let invitation =
            Invitation::with_decorators(did.to_owned(), content, InvitationDecorators::default());

        let record = OutOfBandRecord::new(
            thread_id,
            OutOfBandRole::Sender,
            OutOfBandState::AwaitResponse,
            OUT_OF_BAND_PROTOCOL_VERSION,
            OutOfBandData {
                invitation,
                alias: None,
                reusable: true,
                recipient_key_fingerprints: created
                    .recipient_keys()?
                    .iter()
                    .map(Key::fingerprint)
                    .collect(),
                reuse_connection_id: None,
                auto_accept_connection: None,
            },
        );
        self.repository.save_and_emit(&self.events, &record).await?;
        Ok(record)
    }

    pub async fn get_by_id(&self, id: &str) -> VcxResult<OutOfBandRecord> {
        self.repository.get_by_id(id).await
    }

    pub async fn get_all(&self) -> VcxResult<Vec<OutOfBandRecord>> {
        self.repository.get_all().await
    }

    pub async fn find_by_received_invitation_id(
        &self,
        invitation_id: &str,
    ) -> VcxResult<Option<OutOfBandRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::And(vec![
                SearchFilter::eq("invitation_id", invitation_id),
                SearchFilter::eq("role", OutOfBandRole::Receiver.as_ref()),
            ]))
            .await
    }

    /// Implicit invitations share their id across requests, so those are
    /// told apart by `thread_id`.
    pub async fn find_by_created_invitation_id(
        &self,
        invitation_id: &str,
        thread_id: Option<&str>,
    ) -> VcxResult<Option<OutOfBandRecord>> {
        let mut filters = vec![
            SearchFilter::eq("invitation_id", invitation_id),
            SearchFilter::eq("role", OutOfBandRole::Sender.as_ref()),
        ];
        if let Some(thread_id) = thread_id {
            filters.push(SearchFilter::eq("thread_id", thread_id));
        }
        self.repository
            .find_single_by_query(SearchFilter::And(filters))
            .await
    }

    pub async fn find_created_by_recipient_key(
        &self,
        key: &Key,
    ) -> VcxResult<Option<OutOfBandRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::And(vec![
                SearchFilter::eq("recipient_key_fingerprint", key.fingerprint()),
                SearchFilter::eq("role", OutOfBandRole::Sender.as_ref()),
            ]))
            .await
    }

    /// Keys the invitation was addressed with: inline service keys, and the
    /// keys of our own DIDs named as services.
    pub async fn invitation_keys(&self, record: &OutOfBandRecord) -> VcxResult<Vec<Key>> {
        let mut keys = record.data.inline_recipient_keys()?;
        if record.role() == OutOfBandRole::Sender {
            for did in record.data.did_services() {
                keys.extend(self.did_repository.get_created_did(did).await?.recipient_keys()?);
            }
        }
        Ok(keys)
    }

    pub async fn update_state(
        &self,
        record: &mut OutOfBandRecord,
        expected: &[OutOfBandState],
        next: OutOfBandState,
    ) -> VcxResult<()> {
        let previous = record.transition(expected, next)?;
        self.repository
            .update_and_emit(&self.events, record, previous)
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> VcxResult<()> {
        self.repository.delete(id).await
    }

    /// Answers a received invitation over a connection that already exists.
    pub async fn create_handshake_reuse(
        &self,
        record: &mut OutOfBandRecord,
        connection: &ConnectionRecord,
    ) -> VcxResult<HandshakeReuse> {
        record.assert_role(OutOfBandRole::Receiver)?;
        record.assert_state(&[OutOfBandState::PrepareResponse])?;
        connection.assert_ready()?;

        let id = new_message_id();
        let decorators = HandshakeReuseDecorators::builder()
            .thread(Thread::with_parent(
                id.clone(),
                record.data.invitation_id().to_owned(),
            ))
            .timing(Timing::out_now())
            .build();
        record.data.reuse_connection_id = Some(connection.id().to_owned());
        self.repository.update(record).await?;
        Ok(HandshakeReuse::with_decorators(id, NoContent, decorators))
    }

    pub async fn process_handshake_reuse(
        &self,
        ctx: &InboundMessageContext,
        reuse: &HandshakeReuse,
    ) -> VcxResult<HandshakeReuseAccepted> {
        debug!("OutOfBandService::process_handshake_reuse >> id: {}", reuse.id);
        let thread = &reuse.decorators.thread;
        let invitation_id = thread.pthid.as_deref().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "Handshake reuse is missing the invitation id in ~thread.pthid",
            )
        })?;
        let mut record = self
            .find_by_created_invitation_id(invitation_id, None)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No invitation {invitation_id} was created by this agent"),
                )
            })?;
        record.assert_role(OutOfBandRole::Sender)?;
        record.assert_state(&[OutOfBandState::AwaitResponse])?;
        if record.data.has_requests() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Handshake reuse should only be received for invitations without attached requests",
            ));
        }
        let connection = ctx.assert_ready_connection()?;
        let reuse_thread_id = thread.thid_or(&reuse.id).to_owned();

        self.events.emit(AgentEvent::HandshakeReused {
            connection_id: connection.id().to_owned(),
            out_of_band_id: record.id().to_owned(),
            reuse_thread_id: reuse_thread_id.clone(),
        });
        if !record.data.reusable {
            self.update_state(
                &mut record,
                &[OutOfBandState::AwaitResponse],
                OutOfBandState::Done,
            )
            .await?;
        }

        let decorators = HandshakeReuseAcceptedDecorators::builder()
            .thread(Thread::with_parent(
                reuse_thread_id,
                invitation_id.to_owned(),
            ))
            .timing(Timing::out_now())
            .build();
        Ok(HandshakeReuseAccepted::with_decorators(
            new_message_id(),
            NoContent,
            decorators,
        ))
    }

    pub async fn process_handshake_reuse_accepted(
        &self,
        ctx: &InboundMessageContext,
        accepted: &HandshakeReuseAccepted,
    ) -> VcxResult<OutOfBandRecord> {
        let thread = &accepted.decorators.thread;
        let invitation_id = thread.pthid.as_deref().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                "Handshake reuse accepted is missing the invitation id in ~thread.pthid",
            )
        })?;
        let mut record = self
            .find_by_received_invitation_id(invitation_id)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No invitation {invitation_id} was received by this agent"),
                )
            })?;
        record.assert_role(OutOfBandRole::Receiver)?;
        record.assert_state(&[OutOfBandState::PrepareResponse])?;
        let connection = ctx.assert_ready_connection()?;
        if record.data.reuse_connection_id.as_deref() != Some(connection.id()) {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                "Handshake reuse accepted does not answer a handshake reuse sent over this connection",
            ));
        }

        self.events.emit(AgentEvent::HandshakeReused {
            connection_id: connection.id().to_owned(),
            out_of_band_id: record.id().to_owned(),
            reuse_thread_id: thread.thid_or(&accepted.id).to_owned(),
        });
        self.update_state(
            &mut record,
            &[OutOfBandState::PrepareResponse],
            OutOfBandState::Done,
        )
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_utils::{constants::ALICE_ENDPOINT, devsetup::dev_build_in_memory_wallet};

    use super::*;
    use crate::protocols::connection::{
        ConnectionData, DidExchangeRole, DidExchangeState, DID_EXCHANGE_PROTOCOL_VERSION,
    };

    fn service() -> OutOfBandService {
        OutOfBandService::new(
            dev_build_in_memory_wallet(),
            EventBus::default(),
            Url::parse(ALICE_ENDPOINT).unwrap(),
        )
    }

    fn ready_connection() -> ConnectionRecord {
        ConnectionRecord::new(
            "conn-thread",
            DidExchangeRole::Requester,
            DidExchangeState::Completed,
            DID_EXCHANGE_PROTOCOL_VERSION,
            ConnectionData::default(),
        )
    }

    #[tokio::test]
    async fn test_invitation_is_found_by_its_key() {
        let sender = service();
        let record = sender
            .create_invitation(CreateInvitationConfig::builder().label("Faber".to_owned()).build())
            .await
            .unwrap();

        assert_eq!(record.state(), OutOfBandState::AwaitResponse);
        let keys = sender.invitation_keys(&record).await.unwrap();
        assert_eq!(keys.len(), 1);
        let found = sender
            .find_created_by_recipient_key(&keys[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), record.id());
        assert_eq!(
            record.data.invitation.content.handshake_protocols,
            Some(vec![Protocol::DidExchangeV1.pid()])
        );
    }

    #[tokio::test]
    async fn test_invitation_cannot_be_received_twice() {
        let sender = service();
        let receiver = service();
        let invitation = sender
            .create_invitation(CreateInvitationConfig::default())
            .await
            .unwrap()
            .data
            .invitation;

        receiver
            .receive_invitation(invitation.clone(), ReceiveInvitationConfig::default())
            .await
            .unwrap();
        let err = receiver
            .receive_invitation(invitation, ReceiveInvitationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::DuplicateRecord);
    }

    #[tokio::test]
    async fn test_handshake_reuse_closes_single_use_invitation() {
        let sender = service();
        let receiver = service();
        let mut events = sender.events.subscribe();
        let created = sender
            .create_invitation(CreateInvitationConfig::default())
            .await
            .unwrap();
        let mut received = receiver
            .receive_invitation(created.data.invitation.clone(), ReceiveInvitationConfig::default())
            .await
            .unwrap();

        let connection = ready_connection();
        let reuse = receiver
            .create_handshake_reuse(&mut received, &connection)
            .await
            .unwrap();

        let ctx = InboundMessageContext::new(reuse.clone().into())
            .with_connection(ready_connection());
        let accepted = sender.process_handshake_reuse(&ctx, &reuse).await.unwrap();
        assert_eq!(accepted.decorators.thread.thid.as_deref(), Some(reuse.id.as_str()));
        assert_eq!(
            accepted.decorators.thread.pthid.as_deref(),
            Some(created.data.invitation_id())
        );
        let created = sender.get_by_id(created.id()).await.unwrap();
        assert_eq!(created.state(), OutOfBandState::Done);
        let event = events
            .wait_for(
                |event| matches!(event, AgentEvent::HandshakeReused { .. }),
                Duration::from_millis(100),
            )
            .await
            .unwrap();
        assert!(matches!(event, AgentEvent::HandshakeReused { out_of_band_id, .. } if out_of_band_id == created.id()));

        let ctx = InboundMessageContext::new(accepted.clone().into()).with_connection(connection);
        let done = receiver
            .process_handshake_reuse_accepted(&ctx, &accepted)
            .await
            .unwrap();
        assert_eq!(done.state(), OutOfBandState::Done);
    }

    #[tokio::test]
    async fn test_handshake_reuse_keeps_multi_use_invitation_open() {
        let sender = service();
        let created = sender
            .create_invitation(CreateInvitationConfig::builder().multi_use(true).build())
            .await
            .unwrap();
        let decorators = HandshakeReuseDecorators::builder()
            .thread(Thread::with_parent(
                "reuse".to_owned(),
                created.data.invitation_id().to_owned(),
            ))
            .build();
        let reuse = HandshakeReuse::with_decorators("reuse".to_owned(), NoContent, decorators);

        let without_connection = InboundMessageContext::new(reuse.clone().into());
        let err = sender
            .process_handshake_reuse(&without_connection, &reuse)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::NotReady);

        let ctx = without_connection.with_connection(ready_connection());
        sender.process_handshake_reuse(&ctx, &reuse).await.unwrap();
        sender.process_handshake_reuse(&ctx, &reuse).await.unwrap();
        let created = sender.get_by_id(created.id()).await.unwrap();
        assert_eq!(created.state(), OutOfBandState::AwaitResponse);
    }
}
