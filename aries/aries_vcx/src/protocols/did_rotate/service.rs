use did_peer::{is_valid_peer_did, num_algo_from_peer_did, PeerDidNumAlgo};
use did_resolver::{registry::ResolverRegistry, traits::DidResolvable};
use messages::{
    decorators::{thread::Thread, timing::Timing},
    misc::NoDecorators as NoContent,
    msg_fields::protocols::did_rotate::{
        problem_codes, Hangup, HangupDecorators, Rotate, RotateAck, RotateContent,
        RotateDecorators, RotateProblemReport,
    },
};
use url::Url;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::AgentEvent,
    protocols::{
        common::{ack_parts, new_message_id, problem_report_content, problem_report_decorators},
        connection::{ConnectionRecord, ConnectionService, DidRotateMetadata},
    },
    transport::InboundMessageContext,
};

#[derive(Clone, Debug)]
pub struct DidRotateService {
    connections: ConnectionService,
    resolver: ResolverRegistry,
    endpoint: Url,
    peer_num_algo: PeerDidNumAlgo,
}

impl DidRotateService {
    pub fn new(
        connections: ConnectionService,
        resolver: ResolverRegistry,
        endpoint: Url,
        peer_num_algo: PeerDidNumAlgo,
    ) -> Self {
        Self {
            connections,
            resolver,
            endpoint,
            peer_num_algo,
        }
    }

    /// Announces `to_did`, a DID this agent created, or a fresh peer DID.
    /// Only one rotation may be in flight per connection.
    pub async fn create_rotate(
        &self,
        connection: &mut ConnectionRecord,
        to_did: Option<String>,
    ) -> VcxResult<Rotate> {
        connection.assert_ready()?;
        if connection.data.metadata.did_rotate.is_some() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!(
                    "There is already an existing opened did rotation flow for connection id {}",
                    connection.id()
                ),
            ));
        }
        let did_record = match to_did {
            Some(did) => self.connections.did_repository().get_created_did(&did).await?,
            None => {
                self.connections
                    .create_peer_did(self.peer_num_algo, &self.endpoint, &[])
                    .await?
            }
        };

        let id = new_message_id();
        let content = RotateContent {
            to_did: did_record.did().to_owned(),
        };
        let decorators = RotateDecorators {
            thread: None,
            timing: Some(Timing::out_now()),
        };
        connection.data.metadata.did_rotate = Some(DidRotateMetadata {
            did: did_record.did().to_owned(),
            thread_id: id.clone(),
        });
        self.connections.update(connection).await?;
        info!(
            "Connection {} rotating to {}",
            connection.id(),
            did_record.did()
        );
        Ok(Rotate::with_decorators(id, content, decorators))
    }

    /// Adopts the peer's new DID. The returned ack must go to the peer's
    /// previous DID, i.e. over the connection as it was before this call.
    pub async fn process_rotate(
        &self,
        ctx: &InboundMessageContext,
        rotate: &Rotate,
    ) -> VcxResult<RotateAck> {
        let mut connection = self.current(ctx).await?;
        let thread_id = rotate
            .decorators
            .thread
            .as_ref()
            .map_or(rotate.id.as_str(), |thread| thread.thid_or(&rotate.id))
            .to_owned();
        let new_did = &rotate.content.to_did;
        debug!(
            "DidRotateService::process_rotate >> connection: {}, to_did: {new_did}",
            connection.id()
        );

        if is_valid_peer_did(new_did)
            && matches!(
                num_algo_from_peer_did(new_did),
                Ok(PeerDidNumAlgo::GenesisDoc)
            )
        {
            error!("Unable to resolve DID Document for {new_did}");
            return Err(rotate_problem(
                problem_codes::METHOD_UNSUPPORTED,
                "DID Method Unsupported",
                &thread_id,
            ));
        }
        let did_document = match self.resolver.resolve(new_did).await {
            Ok(did_document) => did_document,
            Err(err) => {
                error!("Unable to resolve DID Document for {new_did}: {err}");
                return Err(rotate_problem(
                    problem_codes::UNRESOLVABLE,
                    "DID Unresolvable",
                    &thread_id,
                ));
            }
        };
        if did_document.didcomm_services().is_empty() {
            return Err(rotate_problem(
                problem_codes::DOC_UNSUPPORTED,
                "DID Document Unsupported",
                &thread_id,
            ));
        }

        self.connections
            .did_repository()
            .store_received_did(new_did, did_document)
            .await?;
        let previous_their_did = connection.data.their_did.replace(new_did.clone());
        if let Some(previous) = &previous_their_did {
            connection.data.previous_their_dids.push(previous.clone());
        }
        self.connections.update(&connection).await?;
        self.emit_did_rotated(&connection, None, previous_their_did);

        let (content, decorators) = ack_parts(Thread::new(thread_id));
        Ok(RotateAck::with_decorators(
            new_message_id(),
            content.into(),
            decorators,
        ))
    }

    /// Seals the rotation the peer acknowledged.
    pub async fn process_rotate_ack(
        &self,
        ctx: &InboundMessageContext,
        ack: &RotateAck,
    ) -> VcxResult<ConnectionRecord> {
        let mut connection = self.current(ctx).await?;
        let metadata = pending_rotation(&connection)?;
        let thread_id = ack.decorators.thread.thid_or(&ack.id);
        if metadata.thread_id != thread_id {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!(
                    "Existing did rotation flow thread id {} does not match incoming message thread id {thread_id}",
                    metadata.thread_id
                ),
            ));
        }

        let previous_did = connection.data.did.replace(metadata.did);
        if let Some(previous) = &previous_did {
            connection.data.previous_dids.push(previous.clone());
        }
        connection.data.metadata.did_rotate = None;
        self.connections.update(&connection).await?;
        self.emit_did_rotated(&connection, previous_did, None);
        Ok(connection)
    }

    /// The peer refused our rotation: forget it and keep the current DID.
    pub async fn process_problem_report(
        &self,
        ctx: &InboundMessageContext,
        report: &RotateProblemReport,
    ) -> VcxResult<ConnectionRecord> {
        debug!(
            "DidRotateService::process_problem_report >> id: {}, code: {}",
            report.id,
            report.content.inner.code()
        );
        let mut connection = self.current(ctx).await?;
        self.clear_did_rotation_data(&mut connection).await?;
        Ok(connection)
    }

    pub async fn clear_did_rotation_data(&self, connection: &mut ConnectionRecord) -> VcxResult<()> {
        pending_rotation(connection)?;
        connection.data.metadata.did_rotate = None;
        self.connections.update(connection).await
    }

    /// Ends the connection on our side. The DID is kept among the previous
    /// ones so late messages can still be recognised.
    pub async fn create_hangup(&self, connection: &mut ConnectionRecord) -> VcxResult<Hangup> {
        connection.assert_ready()?;
        if let Some(did) = connection.data.did.take() {
            connection.data.previous_dids.push(did);
        }
        self.connections.update(connection).await?;
        let decorators = HangupDecorators {
            timing: Some(Timing::out_now()),
        };
        Ok(Hangup::with_decorators(new_message_id(), NoContent, decorators))
    }

    pub async fn process_hangup(
        &self,
        ctx: &InboundMessageContext,
        _hangup: &Hangup,
    ) -> VcxResult<ConnectionRecord> {
        let mut connection = self.current(ctx).await?;
        let previous_their_did = connection.data.their_did.take();
        if let Some(previous) = &previous_their_did {
            connection.data.previous_their_dids.push(previous.clone());
        }
        self.connections.update(&connection).await?;
        self.emit_did_rotated(&connection, None, previous_their_did);
        Ok(connection)
    }

    /// The inbound connection as currently stored, so metadata written after
    /// the message was routed is seen.
    async fn current(&self, ctx: &InboundMessageContext) -> VcxResult<ConnectionRecord> {
        let connection = ctx.assert_ready_connection()?;
        self.connections.get_by_id(connection.id()).await
    }

    fn emit_did_rotated(
        &self,
        connection: &ConnectionRecord,
        previous_our_did: Option<String>,
        previous_their_did: Option<String>,
    ) {
        let our_did = previous_our_did.zip(connection.data.did.clone());
        let their_did = previous_their_did.zip(connection.data.their_did.clone());
        self.connections.events().emit(AgentEvent::DidRotated {
            connection_id: connection.id().to_owned(),
            our_did,
            their_did,
        });
    }
}

fn pending_rotation(connection: &ConnectionRecord) -> VcxResult<DidRotateMetadata> {
    connection.data.metadata.did_rotate.clone().ok_or_else(|| {
        AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidState,
            format!(
                "No did rotation data found for connection with id {}",
                connection.id()
            ),
        )
    })
}

fn rotate_problem(code: &str, description: &str, thread_id: &str) -> AriesVcxError {
    let report = RotateProblemReport::with_decorators(
        new_message_id(),
        problem_report_content(code, Some(description.to_owned())).into(),
        problem_report_decorators(Thread::new(thread_id.to_owned())),
    );
    AriesVcxError::problem_report(description.to_owned(), code, report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use did_key::resolver::DidKeyResolver;
    use did_peer::resolver::PeerDidResolver;
    use pretty_assertions::assert_eq;
    use test_utils::{
        constants::{ALICE_ENDPOINT, BOB_ENDPOINT},
        devsetup::dev_build_in_memory_wallet,
    };

    use super::*;
    use crate::{
        events::EventBus,
        protocols::connection::{
            ConnectionData, DidExchangeRole, DidExchangeState, DID_EXCHANGE_PROTOCOL_VERSION,
        },
    };

    fn service(endpoint: &str) -> DidRotateService {
        let wallet = dev_build_in_memory_wallet();
        DidRotateService::new(
            ConnectionService::new(wallet, EventBus::default()),
            ResolverRegistry::new()
                .register_resolver("peer", PeerDidResolver::new())
                .register_resolver("key", DidKeyResolver),
            Url::parse(endpoint).unwrap(),
            PeerDidNumAlgo::ShortFormAndLongForm,
        )
    }

    struct Side {
        service: DidRotateService,
        connection: ConnectionRecord,
    }

    impl Side {
        fn ctx(&self, message: impl Into<messages::AriesMessage>) -> InboundMessageContext {
            InboundMessageContext::new(message.into()).with_connection(self.connection.clone())
        }

        async fn reload(&mut self) {
            self.connection = self
                .service
                .connections
                .get_by_id(self.connection.id())
                .await
                .unwrap();
        }
    }

    async fn connected_pair() -> (Side, Side) {
        let alice = service(ALICE_ENDPOINT);
        let bob = service(BOB_ENDPOINT);
        let alice_did = alice
            .connections
            .create_peer_did(PeerDidNumAlgo::ShortFormAndLongForm, &alice.endpoint, &[])
            .await
            .unwrap();
        let bob_did = bob
            .connections
            .create_peer_did(PeerDidNumAlgo::ShortFormAndLongForm, &bob.endpoint, &[])
            .await
            .unwrap();
        alice
            .connections
            .did_repository()
            .store_received_did(bob_did.did(), bob_did.did_document().clone())
            .await
            .unwrap();
        bob.connections
            .did_repository()
            .store_received_did(alice_did.did(), alice_did.did_document().clone())
            .await
            .unwrap();

        let connection = |role, did: &str, their_did: &str| {
            ConnectionRecord::new(
                "exchange-thread",
                role,
                DidExchangeState::Completed,
                DID_EXCHANGE_PROTOCOL_VERSION,
                ConnectionData {
                    did: Some(did.to_owned()),
                    their_did: Some(their_did.to_owned()),
                    ..Default::default()
                },
            )
        };
        let alice_connection =
            connection(DidExchangeRole::Requester, alice_did.did(), bob_did.did());
        let bob_connection = connection(DidExchangeRole::Responder, bob_did.did(), alice_did.did());
        alice.connections.save(&alice_connection).await.unwrap();
        bob.connections.save(&bob_connection).await.unwrap();
        (
            Side {
                service: alice,
                connection: alice_connection,
            },
            Side {
                service: bob,
                connection: bob_connection,
            },
        )
    }

    #[tokio::test]
    async fn test_rotation_takes_effect_once_acknowledged() {
        let (mut alice, mut bob) = connected_pair().await;
        let old_did = alice.connection.did().unwrap().to_owned();
        let mut alice_events = alice.service.connections.events().subscribe();
        let mut bob_events = bob.service.connections.events().subscribe();

        let rotate = alice
            .service
            .create_rotate(&mut alice.connection, None)
            .await
            .unwrap();
        assert_eq!(alice.connection.did(), Some(old_did.as_str()));

        let ack = bob
            .service
            .process_rotate(&bob.ctx(rotate.clone()), &rotate)
            .await
            .unwrap();
        assert_eq!(ack.decorators.thread.thid.as_deref(), Some(rotate.id.as_str()));
        bob.reload().await;
        assert_eq!(bob.connection.their_did(), Some(rotate.content.to_did.as_str()));
        assert_eq!(bob.connection.data.previous_their_dids, vec![old_did.clone()]);
        let event = bob_events
            .wait_for(
                |event| matches!(event, AgentEvent::DidRotated { .. }),
                Duration::from_millis(100),
            )
            .await
            .unwrap();
        assert_eq!(
            event,
            AgentEvent::DidRotated {
                connection_id: bob.connection.id().to_owned(),
                our_did: None,
                their_did: Some((old_did.clone(), rotate.content.to_did.clone())),
            }
        );

        let rotated = alice
            .service
            .process_rotate_ack(&alice.ctx(ack.clone()), &ack)
            .await
            .unwrap();
        assert_eq!(rotated.did(), Some(rotate.content.to_did.as_str()));
        assert_eq!(rotated.data.previous_dids, vec![old_did.clone()]);
        assert!(rotated.data.metadata.did_rotate.is_none());
        let event = alice_events
            .wait_for(
                |event| matches!(event, AgentEvent::DidRotated { .. }),
                Duration::from_millis(100),
            )
            .await
            .unwrap();
        assert!(matches!(
            event,
            AgentEvent::DidRotated { our_did: Some((from, _)), their_did: None, .. } if from == old_did
        ));

        let found = bob
            .service
            .connections
            .find_by_dids(bob.connection.did().unwrap(), &old_did)
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id().to_owned()), Some(bob.connection.id().to_owned()));
    }

    #[tokio::test]
    async fn test_concurrent_rotation_is_refused() {
        let (mut alice, _) = connected_pair().await;
        alice
            .service
            .create_rotate(&mut alice.connection, None)
            .await
            .unwrap();
        let err = alice
            .service
            .create_rotate(&mut alice.connection, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_rotation_to_genesis_doc_did_is_unsupported() {
        let (mut alice, bob) = connected_pair().await;
        let genesis = alice
            .service
            .connections
            .create_peer_did(PeerDidNumAlgo::GenesisDoc, &alice.service.endpoint, &[])
            .await
            .unwrap();
        let rotate = alice
            .service
            .create_rotate(&mut alice.connection, Some(genesis.did().to_owned()))
            .await
            .unwrap();

        let err = bob
            .service
            .process_rotate(&bob.ctx(rotate.clone()), &rotate)
            .await
            .unwrap_err();
        let problem = err.problem().unwrap();
        assert_eq!(problem.code, problem_codes::METHOD_UNSUPPORTED);
        assert_eq!(problem.report.thread_id(), rotate.id);
    }

    #[tokio::test]
    async fn test_rotation_to_unresolvable_did_is_refused() {
        let (_, bob) = connected_pair().await;
        let rotate = Rotate::with_decorators(
            "rotate".to_owned(),
            RotateContent {
                to_did: "did:example:123".to_owned(),
            },
            RotateDecorators::default(),
        );

        let err = bob
            .service
            .process_rotate(&bob.ctx(rotate.clone()), &rotate)
            .await
            .unwrap_err();
        assert_eq!(err.problem().unwrap().code, problem_codes::UNRESOLVABLE);
        let connection = bob.service.connections.get_by_id(bob.connection.id()).await.unwrap();
        assert_eq!(connection.their_did(), bob.connection.their_did());
    }

    #[tokio::test]
    async fn test_ack_on_other_thread_is_refused() {
        let (mut alice, _) = connected_pair().await;
        alice
            .service
            .create_rotate(&mut alice.connection, None)
            .await
            .unwrap();
        let (content, decorators) = ack_parts(Thread::new("other".to_owned()));
        let ack = RotateAck::with_decorators("ack".to_owned(), content.into(), decorators);

        let err = alice
            .service
            .process_rotate_ack(&alice.ctx(ack.clone()), &ack)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_problem_report_clears_pending_rotation() {
        let (mut alice, _) = connected_pair().await;
        let old_did = alice.connection.did().unwrap().to_owned();
        let rotate = alice
            .service
            .create_rotate(&mut alice.connection, None)
            .await
            .unwrap();
        let report = RotateProblemReport::with_decorators(
            "report".to_owned(),
            problem_report_content(problem_codes::UNRESOLVABLE, None).into(),
            problem_report_decorators(Thread::new(rotate.id.clone())),
        );

        let connection = alice
            .service
            .process_problem_report(&alice.ctx(report.clone()), &report)
            .await
            .unwrap();
        assert!(connection.data.metadata.did_rotate.is_none());
        assert_eq!(connection.did(), Some(old_did.as_str()));

        alice.reload().await;
        let err = alice
            .service
            .clear_did_rotation_data(&mut alice.connection)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_hangup_forgets_dids_on_both_sides() {
        let (mut alice, bob) = connected_pair().await;
        let alice_did = alice.connection.did().unwrap().to_owned();
        let bob_their_did = bob.connection.their_did().unwrap().to_owned();

        let hangup = alice
            .service
            .create_hangup(&mut alice.connection)
            .await
            .unwrap();
        assert!(alice.connection.did().is_none());
        assert_eq!(alice.connection.data.previous_dids, vec![alice_did]);

        let connection = bob
            .service
            .process_hangup(&bob.ctx(hangup.clone()), &hangup)
            .await
            .unwrap();
        assert!(connection.their_did().is_none());
        assert_eq!(connection.data.previous_their_dids, vec![bob_their_did]);
    }
}
