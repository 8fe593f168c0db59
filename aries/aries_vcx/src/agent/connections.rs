use messages::msg_fields::protocols::out_of_band::invitation::Invitation;

use super::agent_struct::Agent;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        connection::ConnectionRecord,
        did_exchange::CreateRequestConfig,
        out_of_band::{CreateInvitationConfig, OutOfBandRecord, ReceiveInvitationConfig},
    },
};

impl Agent {
    pub async fn create_invitation(
        &self,
        config: CreateInvitationConfig,
    ) -> VcxResult<OutOfBandRecord> {
        self.out_of_band.create_invitation(config).await
    }

    /// Stores the invitation. With auto accept the did-exchange request is
    /// sent right away and the new connection returned next to the record.
    pub async fn receive_invitation(
        &self,
        invitation: Invitation,
        config: ReceiveInvitationConfig,
    ) -> VcxResult<(OutOfBandRecord, Option<ConnectionRecord>)> {
        let auto_accept = config
            .auto_accept_connection
            .unwrap_or(self.config.auto_accept_connections);
        let record = self.out_of_band.receive_invitation(invitation, config).await?;
        if !auto_accept || record.data.invitation.content.handshake_protocols.is_none() {
            return Ok((record, None));
        }
        let (record, connection) = self
            .accept_invitation(record.id(), CreateRequestConfig::default())
            .await?;
        Ok((record, Some(connection)))
    }

    /// Answers a received invitation with a did-exchange request.
    pub async fn accept_invitation(
        &self,
        out_of_band_id: &str,
        config: CreateRequestConfig,
    ) -> VcxResult<(OutOfBandRecord, ConnectionRecord)> {
        let mut out_of_band = self.out_of_band.get_by_id(out_of_band_id).await?;
        let (connection, request) = self
            .did_exchange
            .create_request(&mut out_of_band, config)
            .await?;
        let outbound = self
            .did_exchange
            .request_outbound(&out_of_band, &connection, request)
            .await?;
        self.sender.send_message(outbound).await?;
        Ok((out_of_band, connection))
    }

    /// Answers a received invitation over `connection` instead of opening a
    /// new one.
    pub async fn reuse_connection(
        &self,
        out_of_band_id: &str,
        connection_id: &str,
    ) -> VcxResult<OutOfBandRecord> {
        let mut out_of_band = self.out_of_band.get_by_id(out_of_band_id).await?;
        let connection = self.connections.get_by_id(connection_id).await?;
        let reuse = self
            .out_of_band
            .create_handshake_reuse(&mut out_of_band, &connection)
            .await?;
        self.send_to(&connection, reuse).await?;
        Ok(out_of_band)
    }

    /// Sends the did-exchange response for a connection left in
    /// `RequestReceived`.
    pub async fn accept_request(&self, connection_id: &str) -> VcxResult<ConnectionRecord> {
        let mut connection = self.connections.get_by_id(connection_id).await?;
        let response = self.did_exchange.create_response(&mut connection).await?;
        let outbound = self
            .connections
            .outbound_message(&connection, response)
            .await?;
        self.sender.send_message(outbound).await?;
        Ok(connection)
    }

    /// Sends the did-exchange complete for a connection left in
    /// `ResponseReceived`.
    pub async fn accept_response(&self, connection_id: &str) -> VcxResult<ConnectionRecord> {
        let mut connection = self.connections.get_by_id(connection_id).await?;
        let complete = self.did_exchange.create_complete(&mut connection).await?;
        self.send_to(&connection, complete).await?;
        Ok(connection)
    }

    /// Abandons a received request and tells the requester why.
    pub async fn decline_request(
        &self,
        connection_id: &str,
        reason: Option<String>,
    ) -> VcxResult<ConnectionRecord> {
        let mut connection = self.connections.get_by_id(connection_id).await?;
        let report = self
            .did_exchange
            .decline_request(&mut connection, reason)
            .await?;
        let outbound = self
            .connections
            .outbound_message(&connection, report)
            .await?;
        self.sender.send_message(outbound).await?;
        Ok(connection)
    }

    /// Starts rotating our DID on `connection_id`. The new DID is used once
    /// the peer acks.
    pub async fn rotate_did(
        &self,
        connection_id: &str,
        to_did: Option<String>,
    ) -> VcxResult<ConnectionRecord> {
        let mut connection = self.connections.get_by_id(connection_id).await?;
        let rotate = self
            .did_rotate
            .create_rotate(&mut connection, to_did)
            .await?;
        self.send_to(&connection, rotate).await?;
        Ok(connection)
    }

    /// Tells the peer we are done with the connection, then drops our DID.
    pub async fn hangup(&self, connection_id: &str) -> VcxResult<ConnectionRecord> {
        let mut connection = self.connections.get_by_id(connection_id).await?;
        // Addressed before the hangup takes our DID off the record.
        let before = connection.clone();
        let hangup = self.did_rotate.create_hangup(&mut connection).await?;
        self.send_to(&before, hangup).await?;
        Ok(connection)
    }

    /// The connection a received invitation ended up on, once there is one.
    pub async fn connection_for_invitation(
        &self,
        out_of_band_id: &str,
    ) -> VcxResult<ConnectionRecord> {
        let out_of_band = self.out_of_band.get_by_id(out_of_band_id).await?;
        if let Some(reused) = &out_of_band.data.reuse_connection_id {
            return self.connections.get_by_id(reused).await;
        }
        self.connections
            .find_all_by_out_of_band_id(out_of_band_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No connection for out of band record {out_of_band_id}"),
                )
            })
    }
}
