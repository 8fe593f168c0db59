use std::error::Error;

use aries_vcx::protocols::discover_features::{
    DiscoverFeaturesRecord, DiscoverFeaturesState, QueryOptions, DISCOVER_FEATURES_V1,
    DISCOVER_FEATURES_V2,
};
use messages::msg_fields::protocols::discover_features::{v2::FeatureQuery, FeatureType};
use pretty_assertions::assert_eq;
use test_utils::{
    constants::{ALICE_ENDPOINT, BOB_ENDPOINT},
    logger::init_logger,
};

use crate::utils::{
    scenarios::connection::establish_connection,
    test_agent::{create_test_agent, Loopback, TIMEOUT},
};

pub mod utils;

fn present_proof_query() -> QueryOptions {
    QueryOptions::builder()
        .queries(vec![FeatureQuery::new(
            FeatureType::Protocol,
            "https://didcomm.org/present-proof/*",
        )])
        .build()
}

#[tokio::test]
async fn test_peer_discloses_matching_protocols() -> Result<(), Box<dyn Error>> {
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |config| config);
    let bob = create_test_agent(&loopback, "bob", BOB_ENDPOINT, |config| config);
    let (alice_connection, _) = establish_connection(&bob, &alice).await;

    for version in [DISCOVER_FEATURES_V1, DISCOVER_FEATURES_V2] {
        let mut alice_events = alice.agent.subscribe();
        let query = alice
            .agent
            .query_features(alice_connection.id(), version, present_proof_query())
            .await?;
        assert_eq!(query.state(), DiscoverFeaturesState::QuerySent);

        let disclosed = alice_events
            .wait_for_state(query.id(), DiscoverFeaturesState::DisclosureReceived, TIMEOUT)
            .await?;
        let record: DiscoverFeaturesRecord = serde_json::from_value(disclosed.record)?;
        let ids: Vec<&str> = record
            .data
            .disclosures
            .iter()
            .map(|disclosure| disclosure.id.as_str())
            .collect();
        assert_eq!(ids, ["https://didcomm.org/present-proof/2.0"], "version {version}");
    }
    Ok(())
}

#[tokio::test]
async fn test_silent_peer_leaves_query_open() -> Result<(), Box<dyn Error>> {
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |config| config);
    let bob = create_test_agent(&loopback, "bob", BOB_ENDPOINT, |mut config| {
        config.auto_respond_discover_features = false;
        config
    });
    let (alice_connection, _) = establish_connection(&bob, &alice).await;
    let mut alice_events = alice.agent.subscribe();

    let query = alice
        .agent
        .query_features(alice_connection.id(), DISCOVER_FEATURES_V2, present_proof_query())
        .await?;
    let outcome = alice_events
        .wait_for_state(
            query.id(),
            DiscoverFeaturesState::DisclosureReceived,
            std::time::Duration::from_millis(500),
        )
        .await;
    assert!(outcome.is_err());
    Ok(())
}
