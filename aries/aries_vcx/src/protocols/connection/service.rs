use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::{search_filter::SearchFilter, BaseWallet};
use did_doc::schema::{
    did_doc::DidDocument, service::Service, verification_method::VerificationMethod,
};
use did_peer::{
    peer_did::numalgos::{numalgo1, numalgo2, numalgo4},
    PeerDidNumAlgo,
};
use messages::AriesMessage;
use public_key::Key;
use url::Url;

use super::{ConnectionRecord, DidExchangeState, DidRecord, DidRepository};
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::EventBus,
    storage::Repository,
    transport::OutboundMessage,
};

/// Owns connection records and the DIDs they reference.
#[derive(Clone, Debug)]
pub struct ConnectionService {
    wallet: Arc<dyn BaseWallet>,
    repository: Repository<ConnectionRecord>,
    did_repository: DidRepository,
    events: EventBus,
}

impl ConnectionService {
    pub fn new(wallet: Arc<dyn BaseWallet>, events: EventBus) -> Self {
        Self {
            repository: Repository::new(wallet.clone()),
            did_repository: DidRepository::new(wallet.clone()),
            wallet,
            events,
        }
    }

    pub fn wallet(&self) -> &Arc<dyn BaseWallet> {
        &self.wallet
    }

    pub fn did_repository(&self) -> &DidRepository {
        &self.did_repository
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn save(&self, connection: &ConnectionRecord) -> VcxResult<()> {
        self.repository.save_and_emit(&self.events, connection).await
    }

    /// Persists a transition of `connection` away from `previous_state`.
    pub async fn update_state(
        &self,
        connection: &ConnectionRecord,
        previous_state: DidExchangeState,
    ) -> VcxResult<()> {
        self.repository
            .update_and_emit(&self.events, connection, previous_state)
            .await
    }

    /// Persists changes that leave the state alone.
    pub async fn update(&self, connection: &ConnectionRecord) -> VcxResult<()> {
        self.repository.update(connection).await
    }

    pub async fn abandon(
        &self,
        connection: &mut ConnectionRecord,
        reason: impl Into<String>,
    ) -> VcxResult<()> {
        let previous = connection.abandon(reason)?;
        connection.data.metadata = Default::default();
        self.update_state(connection, previous).await
    }

    pub async fn get_by_id(&self, id: &str) -> VcxResult<ConnectionRecord> {
        self.repository.get_by_id(id).await
    }

    pub async fn find_by_id(&self, id: &str) -> VcxResult<Option<ConnectionRecord>> {
        self.repository.find_by_id(id).await
    }

    pub async fn get_all(&self) -> VcxResult<Vec<ConnectionRecord>> {
        self.repository.get_all().await
    }

    pub async fn delete_by_id(&self, id: &str) -> VcxResult<()> {
        self.repository.delete(id).await
    }

    /// Connections are unique per thread regardless of role: the request
    /// message id names exactly one handshake.
    pub async fn find_by_thread(&self, thread_id: &str) -> VcxResult<Option<ConnectionRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::eq("thread_id", thread_id))
            .await
    }

    pub async fn get_by_thread(&self, thread_id: &str) -> VcxResult<ConnectionRecord> {
        self.find_by_thread(thread_id).await?.ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::RecordNotFound,
                format!("No connection record with thread {thread_id}"),
            )
        })
    }

    pub async fn find_all_by_out_of_band_id(
        &self,
        out_of_band_id: &str,
    ) -> VcxResult<Vec<ConnectionRecord>> {
        self.repository
            .find_by_query(SearchFilter::eq("out_of_band_id", out_of_band_id))
            .await
    }

    /// Also matches connections where either DID has since been rotated.
    pub async fn find_by_dids(
        &self,
        our_did: &str,
        their_did: &str,
    ) -> VcxResult<Option<ConnectionRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::Or(vec![
                SearchFilter::And(vec![
                    SearchFilter::eq("did", our_did),
                    SearchFilter::eq("their_did", their_did),
                ]),
                SearchFilter::And(vec![
                    SearchFilter::eq("did", our_did),
                    SearchFilter::eq("previous_their_did", their_did),
                ]),
                SearchFilter::And(vec![
                    SearchFilter::eq("previous_did", our_did),
                    SearchFilter::eq("their_did", their_did),
                ]),
            ]))
            .await
    }

    /// Maps the envelope keys of an inbound message to a ready connection.
    pub async fn find_by_keys(
        &self,
        sender_key: &Key,
        recipient_key: &Key,
    ) -> VcxResult<Option<ConnectionRecord>> {
        let Some(their_did) = self
            .did_repository
            .find_received_did_by_recipient_key(sender_key)
            .await?
        else {
            debug!(
                "ConnectionService::find_by_keys << no received DID for sender key {}",
                sender_key.base58()
            );
            return Ok(None);
        };
        let Some(our_did) = self
            .did_repository
            .find_created_did_by_recipient_key(recipient_key)
            .await?
        else {
            debug!(
                "ConnectionService::find_by_keys << no created DID for recipient key {}",
                recipient_key.base58()
            );
            return Ok(None);
        };
        Ok(self
            .find_by_dids(our_did.did(), their_did.did())
            .await?
            .filter(ConnectionRecord::is_ready))
    }

    /// Mints a peer DID for `endpoint`, backed by a fresh wallet key, and
    /// stores it as a created DID.
    pub async fn create_peer_did(
        &self,
        num_algo: PeerDidNumAlgo,
        endpoint: &Url,
        routing_keys: &[Key],
    ) -> VcxResult<DidRecord> {
        let key = self.wallet.create_key(None).await?;
        let routing_keys = routing_keys.iter().map(Key::to_did_key).collect::<Vec<_>>();
        let service = Service::new_didcomm_v1(
            "#didcomm-0".to_owned(),
            endpoint.clone(),
            vec![key.to_did_key()],
            routing_keys,
        );
        let (did, did_document) = match num_algo {
            PeerDidNumAlgo::MultipleInceptionKeyWithoutDoc => {
                let did = numalgo2::create(&[key], &[], &[service])?;
                let did_document = numalgo2::resolve(&did)?;
                (did, did_document)
            }
            PeerDidNumAlgo::GenesisDoc => numalgo1::create(genesis_document(&key, service))?,
            PeerDidNumAlgo::ShortFormAndLongForm => {
                let (long, _short) = numalgo4::create(&genesis_document(&key, service))?;
                let did_document = numalgo4::resolve(&long)?;
                (long, did_document)
            }
            PeerDidNumAlgo::InceptionKeyWithoutDoc => {
                return Err(AriesVcxError::from_msg(
                    AriesVcxErrorKind::ActionNotSupported,
                    "did:peer:0 carries no service and cannot be used for a connection",
                ))
            }
        };
        info!("ConnectionService::create_peer_did << created {did}");
        self.did_repository
            .store_created_did(&did, did_document)
            .await
    }

    /// Addresses `message` to the peer of `connection`, authcrypted with our
    /// current DID's key.
    pub async fn outbound_message(
        &self,
        connection: &ConnectionRecord,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<OutboundMessage> {
        let their_did = connection.their_did().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!("Connection {} has no counterparty DID", connection.id()),
            )
        })?;
        let their_document = self.did_repository.get_received_did(their_did).await?;
        let sender_key = match connection.did() {
            Some(did) => self
                .did_repository
                .get_created_did(did)
                .await?
                .recipient_keys()?
                .into_iter()
                .next(),
            None => None,
        };
        let mut outbound = outbound_to_document(their_document.did_document(), message)?;
        outbound.connection_id = Some(connection.id().to_owned());
        outbound.sender_key = sender_key;
        Ok(outbound)
    }
}

fn genesis_document(key: &Key, service: Service) -> DidDocument {
    let vm_id = "#key-1".to_owned();
    DidDocument::builder(String::new())
        .add_verification_method(VerificationMethod::ed25519_2018(
            vm_id.clone(),
            String::new(),
            key,
        ))
        .add_authentication_reference(vm_id)
        .add_service(service)
        .build()
}

/// Anonymous outbound message to the first DIDComm service of `document`.
pub fn outbound_to_document(
    document: &DidDocument,
    message: impl Into<AriesMessage>,
) -> VcxResult<OutboundMessage> {
    let service = document.didcomm_services().into_iter().next().ok_or_else(|| {
        AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidDid,
            format!("DID document {} has no DIDComm service", document.id()),
        )
    })?;
    Ok(OutboundMessage {
        message: message.into(),
        connection_id: None,
        endpoint: service.service_endpoint().clone(),
        recipient_keys: document.recipient_keys()?,
        routing_keys: document.routing_keys()?,
        sender_key: None,
    })
}
