use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use did_key::resolver::DidKeyResolver;
use did_peer::resolver::PeerDidResolver;
use did_resolver::registry::ResolverRegistry;
use messages::msg_types::Protocol;

use super::{agent_struct::Agent, config::AgentConfig};
use crate::{
    events::EventBus,
    handlers::{
        connection::{DidExchangeHandler, DidRotateHandler, OutOfBandHandler},
        discover_features::DiscoverFeaturesHandler,
        issuance::CredentialHandler,
        problem_report::ProblemReportHandler,
        proof_presentation::ProofHandler,
        Dispatcher,
    },
    protocols::{
        connection::{ConnectionService, ConnectionlessService},
        did_exchange::{DidExchangeConfig, DidExchangeService},
        did_rotate::DidRotateService,
        discover_features::{
            protocol::DiscoverFeaturesRecords, DiscoverFeaturesProtocol,
            DiscoverFeaturesV1Protocol, DiscoverFeaturesV2Protocol, FeatureRegistry,
        },
        issuance::{json_format::JsonCredentialFormat, CredentialProtocol, CredentialV2Protocol},
        out_of_band::OutOfBandService,
        proof_presentation::{json_format::JsonProofFormat, ProofProtocol, ProofV2Protocol},
    },
    transport::MessageSender,
};

/// Resolvers for the DID methods peers use with this agent.
pub fn default_resolver_registry() -> ResolverRegistry {
    ResolverRegistry::new()
        .register_resolver("peer", PeerDidResolver::new())
        .register_resolver("key", DidKeyResolver)
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        wallet: Arc<dyn BaseWallet>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self::with_resolver(config, wallet, sender, default_resolver_registry())
    }

    pub fn with_resolver(
        config: AgentConfig,
        wallet: Arc<dyn BaseWallet>,
        sender: Arc<dyn MessageSender>,
        resolver: ResolverRegistry,
    ) -> Self {
        info!("Agent::with_resolver >> label: {}, endpoint: {}", config.label, config.endpoint);
        let events = EventBus::new(config.event_channel_capacity);
        let connections = ConnectionService::new(wallet.clone(), events.clone());
        let connectionless = ConnectionlessService::new(wallet.clone(), config.endpoint.clone());
        let out_of_band =
            OutOfBandService::new(wallet.clone(), events.clone(), config.endpoint.clone());
        let did_exchange = DidExchangeService::new(
            connections.clone(),
            out_of_band.clone(),
            resolver.clone(),
            DidExchangeConfig::builder()
                .label(config.label.clone())
                .endpoint(config.endpoint.clone())
                .peer_num_algo(config.peer_num_algo_for_did_exchange)
                .auto_accept_connections(config.auto_accept_connections)
                .build(),
        );
        let did_rotate = DidRotateService::new(
            connections.clone(),
            resolver,
            config.endpoint.clone(),
            config.peer_num_algo_for_did_rotation,
        );

        let credential_protocols: Vec<Arc<dyn CredentialProtocol>> =
            vec![Arc::new(CredentialV2Protocol::new(
                wallet.clone(),
                events.clone(),
                vec![Arc::new(JsonCredentialFormat::new(wallet.clone()))],
                config.auto_accept_credentials,
            ))];
        let proof_protocols: Vec<Arc<dyn ProofProtocol>> = vec![Arc::new(ProofV2Protocol::new(
            wallet.clone(),
            events.clone(),
            vec![Arc::new(JsonProofFormat::new(wallet.clone()))],
            config.auto_accept_proofs,
        ))];

        let mut dispatcher = Dispatcher::new(connections.clone(), sender.clone(), events.clone());
        dispatcher.register(Arc::new(DidExchangeHandler::new(did_exchange.clone())));
        dispatcher.register(Arc::new(OutOfBandHandler::new(
            out_of_band.clone(),
            connections.clone(),
        )));
        dispatcher.register(Arc::new(DidRotateHandler::new(
            did_rotate.clone(),
            connections.clone(),
        )));
        dispatcher.register(Arc::new(CredentialHandler::new(
            credential_protocols.clone(),
            connections.clone(),
            connectionless.clone(),
        )));
        dispatcher.register(Arc::new(ProofHandler::new(
            proof_protocols.clone(),
            connections.clone(),
            connectionless.clone(),
        )));

        // Discover features discloses what the dispatcher routes, itself
        // included.
        let features = Arc::new(FeatureRegistry::from_protocols(
            dispatcher.supported_protocols().into_iter().chain([
                Protocol::DiscoverFeaturesV1,
                Protocol::DiscoverFeaturesV2,
                Protocol::ReportProblemV1,
            ]),
        ));
        let discover_features_records =
            DiscoverFeaturesRecords::new(wallet.clone(), events.clone(), features.clone());
        let discover_features_protocols: Vec<Arc<dyn DiscoverFeaturesProtocol>> = vec![
            Arc::new(DiscoverFeaturesV1Protocol::new(
                discover_features_records.clone(),
            )),
            Arc::new(DiscoverFeaturesV2Protocol::new(
                discover_features_records.clone(),
            )),
        ];
        dispatcher.register(Arc::new(DiscoverFeaturesHandler::new(
            discover_features_protocols.clone(),
            connections.clone(),
            config.auto_respond_discover_features,
        )));
        dispatcher.register(Arc::new(ProblemReportHandler::new(
            discover_features_records,
        )));

        Self {
            config,
            wallet,
            events,
            sender,
            connections,
            connectionless,
            out_of_band,
            did_exchange,
            did_rotate,
            credential_protocols,
            proof_protocols,
            discover_features_protocols,
            features,
            dispatcher,
        }
    }
}
