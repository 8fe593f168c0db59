use aries_vcx::protocols::{
    connection::{ConnectionRecord, DidExchangeState},
    out_of_band::{CreateInvitationConfig, ReceiveInvitationConfig},
};

use crate::utils::test_agent::{wait_for_new_record, TestAgent, TIMEOUT};

/// Connects `invitee` to `inviter` through an out-of-band invitation, both
/// sides accepting automatically. Returns the invitee's connection first.
pub async fn establish_connection(
    inviter: &TestAgent,
    invitee: &TestAgent,
) -> (ConnectionRecord, ConnectionRecord) {
    let mut inviter_events = inviter.agent.subscribe();
    let mut invitee_events = invitee.agent.subscribe();

    let out_of_band = inviter
        .agent
        .create_invitation(
            CreateInvitationConfig::builder()
                .auto_accept_connection(true)
                .build(),
        )
        .await
        .unwrap();
    let (_, invitee_connection) = invitee
        .agent
        .receive_invitation(
            out_of_band.data.invitation.clone(),
            ReceiveInvitationConfig::builder()
                .auto_accept_connection(true)
                .build(),
        )
        .await
        .unwrap();
    let invitee_connection = invitee_connection.unwrap();

    invitee_events
        .wait_for_state(invitee_connection.id(), DidExchangeState::Completed, TIMEOUT)
        .await
        .unwrap();
    let completed =
        wait_for_new_record(&mut inviter_events, "connection", DidExchangeState::Completed).await;

    let invitee_connection = invitee
        .agent
        .connections()
        .get_by_id(invitee_connection.id())
        .await
        .unwrap();
    let inviter_connection = inviter
        .agent
        .connections()
        .get_by_id(&completed.record_id)
        .await
        .unwrap();
    (invitee_connection, inviter_connection)
}
