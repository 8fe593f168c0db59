use std::error::Error;

use aries_vcx::{
    errors::error::AriesVcxErrorKind,
    protocols::{
        auto_accept::AutoAcceptPolicy,
        issuance::{
            format::CredentialFormatInputs,
            json_format::{json_credential_input, JSON_CREDENTIAL_FORMAT, JSON_CREDENTIAL_KEY},
            AcceptCredentialOptions, CredentialOptions, CredentialState, CREDENTIAL_PROTOCOL_V2,
        },
    },
    transport::InboundMessageContext,
};
use messages::msg_fields::protocols::cred_issuance::{v2::CredentialPreviewV2, CredentialAttr};
use pretty_assertions::assert_eq;
use test_utils::{
    constants::{ALICE_ENDPOINT, BOB_ENDPOINT},
    logger::init_logger,
};

use crate::utils::{
    scenarios::connection::establish_connection,
    test_agent::{create_test_agent, wait_for_new_record, Loopback, TIMEOUT},
};

pub mod utils;

const FABER_ENDPOINT: &str = BOB_ENDPOINT;

fn credential_options(degree: &str) -> CredentialOptions {
    CredentialOptions::builder()
        .formats(CredentialFormatInputs::from([(
            JSON_CREDENTIAL_KEY.to_owned(),
            json_credential_input([("name", "Alice"), ("degree", degree)]),
        )]))
        .credential_preview(CredentialPreviewV2::new(vec![
            CredentialAttr::builder()
                .name("name".to_owned())
                .value("Alice".to_owned())
                .build(),
            CredentialAttr::builder()
                .name("degree".to_owned())
                .value(degree.to_owned())
                .build(),
        ]))
        .build()
}

#[tokio::test]
async fn test_offer_issued_without_intervention() -> Result<(), Box<dyn Error>> {
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::Always;
        config
    });
    let faber = create_test_agent(&loopback, "faber", FABER_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::Always;
        config
    });
    let (_, faber_connection) = establish_connection(&faber, &alice).await;
    let mut alice_events = alice.agent.subscribe();
    let mut faber_events = faber.agent.subscribe();

    let offered = faber
        .agent
        .offer_credential(
            faber_connection.id(),
            CREDENTIAL_PROTOCOL_V2,
            credential_options("Maths"),
        )
        .await?;
    assert_eq!(offered.state(), CredentialState::OfferSent);

    faber_events
        .wait_for_state(offered.id(), CredentialState::Done, TIMEOUT)
        .await?;
    let received =
        wait_for_new_record(&mut alice_events, "credential_exchange", CredentialState::Done).await;
    assert_eq!(received.thread_id, offered.thread_id());

    let holder_record = alice
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .get_by_id(&received.record_id)
        .await?;
    assert_eq!(holder_record.data.credentials.len(), 1);
    assert_eq!(holder_record.data.credentials[0].format, JSON_CREDENTIAL_FORMAT);

    // A finished exchange accepts nothing more and stays finished.
    let err = alice
        .agent
        .accept_credential(&received.record_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AriesVcxErrorKind::IllegalStateTransition);
    let holder_record = alice
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .get_by_id(&received.record_id)
        .await?;
    assert_eq!(holder_record.state(), CredentialState::Done);
    Ok(())
}

#[tokio::test]
async fn test_proposal_needs_approval_then_content_carries_it_through() -> Result<(), Box<dyn Error>>
{
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::ContentApproved;
        config
    });
    let faber = create_test_agent(&loopback, "faber", FABER_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::ContentApproved;
        config
    });
    let (alice_connection, _) = establish_connection(&faber, &alice).await;
    let mut alice_events = alice.agent.subscribe();
    let mut faber_events = faber.agent.subscribe();

    let proposed = alice
        .agent
        .propose_credential(
            alice_connection.id(),
            CREDENTIAL_PROTOCOL_V2,
            credential_options("Physics"),
        )
        .await?;
    assert_eq!(proposed.state(), CredentialState::ProposalSent);

    // Nothing was offered on this thread yet, so there is nothing to approve
    // the proposal against.
    let proposal = wait_for_new_record(
        &mut faber_events,
        "credential_exchange",
        CredentialState::ProposalReceived,
    )
    .await;
    let faber_record = faber
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .get_by_id(&proposal.record_id)
        .await?;
    assert_eq!(faber_record.state(), CredentialState::ProposalReceived);

    let faber_record = faber
        .agent
        .accept_credential_proposal(&proposal.record_id, AcceptCredentialOptions::default())
        .await?;
    assert_eq!(faber_record.state(), CredentialState::OfferSent);

    // The offer mirrors the proposal, so every later step is approved.
    alice_events
        .wait_for_state(proposed.id(), CredentialState::Done, TIMEOUT)
        .await?;
    faber_events
        .wait_for_state(faber_record.id(), CredentialState::Done, TIMEOUT)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_declined_offer_abandons_issuer_record() -> Result<(), Box<dyn Error>> {
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |config| config);
    let faber = create_test_agent(&loopback, "faber", FABER_ENDPOINT, |config| config);
    let (_, faber_connection) = establish_connection(&faber, &alice).await;
    let mut alice_events = alice.agent.subscribe();
    let mut faber_events = faber.agent.subscribe();

    let offered = faber
        .agent
        .offer_credential(
            faber_connection.id(),
            CREDENTIAL_PROTOCOL_V2,
            credential_options("History"),
        )
        .await?;
    let received = wait_for_new_record(
        &mut alice_events,
        "credential_exchange",
        CredentialState::OfferReceived,
    )
    .await;

    let declined = alice
        .agent
        .decline_credential_offer(&received.record_id, Some("Wrong degree".to_owned()))
        .await?;
    assert_eq!(declined.state(), CredentialState::Declined);

    let abandoned = faber_events
        .wait_for_state(offered.id(), CredentialState::Abandoned, TIMEOUT)
        .await?;
    assert_eq!(abandoned.previous_state.as_deref(), Some("offer-sent"));
    let faber_record = faber
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .get_by_id(offered.id())
        .await?;
    assert!(faber_record.error_message().is_some());
    Ok(())
}

#[tokio::test]
async fn test_connectionless_offer_answered_through_service() -> Result<(), Box<dyn Error>> {
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::Always;
        config
    });
    let faber = create_test_agent(&loopback, "faber", FABER_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::Always;
        config
    });
    let mut alice_events = alice.agent.subscribe();
    let mut faber_events = faber.agent.subscribe();

    let (offered, offer) = faber
        .agent
        .create_connectionless_offer(CREDENTIAL_PROTOCOL_V2, credential_options("Maths"))
        .await?;
    assert_eq!(offered.connection_id(), None);
    let advertised = offer.service().cloned().unwrap();
    assert_eq!(advertised.service_endpoint, faber.endpoint);

    // Delivered out of band, no connection on either side.
    alice
        .agent
        .receive_message(InboundMessageContext::new(offer))
        .await?;

    faber_events
        .wait_for_state(offered.id(), CredentialState::Done, TIMEOUT)
        .await?;
    let received =
        wait_for_new_record(&mut alice_events, "credential_exchange", CredentialState::Done).await;
    assert_eq!(received.thread_id, offered.thread_id());

    let sent = loopback.sent();
    let request = &sent[0];
    assert_eq!(request.endpoint, faber.endpoint);
    assert_eq!(request.connection_id, None);
    assert_eq!(
        request.recipient_keys.iter().map(|key| key.base58()).collect::<Vec<_>>(),
        advertised.recipient_keys
    );
    let alice_service = request.message.service().unwrap();
    assert_eq!(alice_service.service_endpoint, alice.endpoint);
    assert_eq!(
        request.sender_key.as_ref().map(|key| key.base58()),
        alice_service.recipient_keys.first().cloned()
    );
    assert!(sent.iter().skip(1).all(|outbound| outbound.connection_id.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_connectionless_offer_without_service_is_not_accepted() -> Result<(), Box<dyn Error>>
{
    init_logger();
    let loopback = Loopback::default();
    let alice = create_test_agent(&loopback, "alice", ALICE_ENDPOINT, |mut config| {
        config.auto_accept_credentials = AutoAcceptPolicy::Always;
        config
    });
    let faber = create_test_agent(&loopback, "faber", FABER_ENDPOINT, |config| config);
    let mut alice_events = alice.agent.subscribe();

    let (_, offer) = faber
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .create_offer(None, credential_options("Maths"))
        .await?;
    assert!(offer.service().is_none());

    let err = alice
        .agent
        .receive_message(InboundMessageContext::new(offer))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AriesVcxErrorKind::NotReady);

    let received = wait_for_new_record(
        &mut alice_events,
        "credential_exchange",
        CredentialState::OfferReceived,
    )
    .await;
    let err = alice
        .agent
        .accept_credential_offer(&received.record_id, AcceptCredentialOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AriesVcxErrorKind::NotReady);

    let record = alice
        .agent
        .credential_protocol(CREDENTIAL_PROTOCOL_V2)?
        .get_by_id(&received.record_id)
        .await?;
    assert_eq!(record.state(), CredentialState::OfferReceived);
    assert!(loopback.sent().is_empty());
    Ok(())
}
