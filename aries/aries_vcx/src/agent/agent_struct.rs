use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use messages::AriesMessage;

use super::config::AgentConfig;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::{EventBus, EventSubscription},
    handlers::Dispatcher,
    protocols::{
        connection::{ConnectionRecord, ConnectionService, ConnectionlessService},
        did_exchange::DidExchangeService,
        did_rotate::DidRotateService,
        discover_features::{DiscoverFeaturesProtocol, FeatureRegistry},
        issuance::CredentialProtocol,
        out_of_band::OutOfBandService,
        proof_presentation::ProofProtocol,
    },
    transport::{InboundMessageContext, MessageSender},
};

/// One agent: its wallet, the protocol services working on it and the
/// dispatcher feeding them inbound messages.
#[derive(Clone, Debug)]
pub struct Agent {
    pub(super) config: AgentConfig,
    pub(super) wallet: Arc<dyn BaseWallet>,
    pub(super) events: EventBus,
    pub(super) sender: Arc<dyn MessageSender>,
    pub(super) connections: ConnectionService,
    pub(super) connectionless: ConnectionlessService,
    pub(super) out_of_band: OutOfBandService,
    pub(super) did_exchange: DidExchangeService,
    pub(super) did_rotate: DidRotateService,
    pub(super) credential_protocols: Vec<Arc<dyn CredentialProtocol>>,
    pub(super) proof_protocols: Vec<Arc<dyn ProofProtocol>>,
    pub(super) discover_features_protocols: Vec<Arc<dyn DiscoverFeaturesProtocol>>,
    pub(super) features: Arc<FeatureRegistry>,
    pub(super) dispatcher: Dispatcher,
}

fn select<'a, P: ?Sized>(
    protocols: &'a [Arc<P>],
    version: &str,
    family: &str,
    version_of: impl Fn(&P) -> &'static str,
) -> VcxResult<&'a Arc<P>> {
    protocols
        .iter()
        .find(|protocol| version_of(&***protocol) == version)
        .ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::UnsupportedProtocolVersion,
                format!("No {family} protocol of version {version}"),
            )
        })
}

impl Agent {
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Arc<dyn BaseWallet> {
        &self.wallet
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    pub fn connections(&self) -> &ConnectionService {
        &self.connections
    }

    pub fn connectionless(&self) -> &ConnectionlessService {
        &self.connectionless
    }

    pub fn out_of_band(&self) -> &OutOfBandService {
        &self.out_of_band
    }

    pub fn did_exchange(&self) -> &DidExchangeService {
        &self.did_exchange
    }

    pub fn did_rotate(&self) -> &DidRotateService {
        &self.did_rotate
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The issue-credential implementation owning records of `version`.
    pub fn credential_protocol(&self, version: &str) -> VcxResult<&Arc<dyn CredentialProtocol>> {
        select(&self.credential_protocols, version, "issue-credential", |p| {
            p.version()
        })
    }

    pub fn proof_protocol(&self, version: &str) -> VcxResult<&Arc<dyn ProofProtocol>> {
        select(&self.proof_protocols, version, "present-proof", |p| p.version())
    }

    pub fn discover_features_protocol(
        &self,
        version: &str,
    ) -> VcxResult<&Arc<dyn DiscoverFeaturesProtocol>> {
        select(
            &self.discover_features_protocols,
            version,
            "discover-features",
            |p| p.version(),
        )
    }

    /// Entry point for messages the transport unpacked.
    pub async fn receive_message(&self, ctx: InboundMessageContext) -> VcxResult<()> {
        self.dispatcher.dispatch(ctx).await
    }

    /// Sends `message` over a connection that completed its handshake.
    pub async fn send_message(
        &self,
        connection_id: &str,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<()> {
        let connection = self.connections.get_by_id(connection_id).await?;
        self.send_to(&connection, message).await
    }

    pub(super) async fn send_to(
        &self,
        connection: &ConnectionRecord,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<()> {
        connection.assert_ready()?;
        let outbound = self
            .connections
            .outbound_message(connection, message)
            .await?;
        self.sender.send_message(outbound).await
    }

    /// Fails unless a reply on the exchange `record_id` can go out: over its
    /// connection once that is ready, or else to the peer's `~service`.
    pub(super) async fn assert_exchange_route(
        &self,
        record_id: &str,
        connection_id: Option<&str>,
    ) -> VcxResult<()> {
        match connection_id {
            Some(connection_id) => self.connections.get_by_id(connection_id).await?.assert_ready(),
            None => self.connectionless.assert_route(record_id).await,
        }
    }

    /// Sends on the connection the exchange belongs to, or to the peer's
    /// `~service` when it runs without one.
    pub(super) async fn send_on_exchange(
        &self,
        record_id: &str,
        connection_id: Option<&str>,
        message: AriesMessage,
    ) -> VcxResult<()> {
        match connection_id {
            Some(connection_id) => self.send_message(connection_id, message).await,
            None => {
                let outbound = self
                    .connectionless
                    .outbound_message(record_id, message)
                    .await?;
                self.sender.send_message(outbound).await
            }
        }
    }
}
