use std::sync::Arc;

use messages::AriesMessage;

use super::agent_struct::Agent;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::{
        discover_features::{DiscoverFeaturesRecord, QueryOptions},
        issuance::{
            AcceptCredentialOptions, CredentialExchangeRecord, CredentialOptions,
            CredentialProtocol,
        },
        proof_presentation::{
            AcceptProofOptions, ProofExchangeRecord, ProofOptions, ProofProtocol,
        },
    },
};

impl Agent {
    pub async fn propose_credential(
        &self,
        connection_id: &str,
        version: &str,
        options: CredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let connection = self.connections.get_by_id(connection_id).await?;
        let (record, message) = self
            .credential_protocol(version)?
            .create_proposal(&connection, options)
            .await?;
        self.send_to(&connection, message).await?;
        Ok(record)
    }

    pub async fn offer_credential(
        &self,
        connection_id: &str,
        version: &str,
        options: CredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let connection = self.connections.get_by_id(connection_id).await?;
        let (record, message) = self
            .credential_protocol(version)?
            .create_offer(Some(&connection), options)
            .await?;
        self.send_to(&connection, message).await?;
        Ok(record)
    }

    /// Offer for a peer without a connection. The caller delivers the
    /// returned message, whose `~service` tells the holder where to answer.
    pub async fn create_connectionless_offer(
        &self,
        version: &str,
        options: CredentialOptions,
    ) -> VcxResult<(CredentialExchangeRecord, AriesMessage)> {
        let (record, mut message) = self
            .credential_protocol(version)?
            .create_offer(None, options)
            .await?;
        self.connectionless
            .attach_our_service(record.id(), &mut message)
            .await?;
        Ok((record, message))
    }

    pub async fn accept_credential_proposal(
        &self,
        record_id: &str,
        options: AcceptCredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_proposal(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn negotiate_credential_proposal(
        &self,
        record_id: &str,
        options: CredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.negotiate_proposal(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn accept_credential_offer(
        &self,
        record_id: &str,
        options: AcceptCredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_offer(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn negotiate_credential_offer(
        &self,
        record_id: &str,
        options: CredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.negotiate_offer(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn decline_credential_offer(
        &self,
        record_id: &str,
        reason: Option<String>,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.decline_offer(&mut record, reason).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn accept_credential_request(
        &self,
        record_id: &str,
        options: AcceptCredentialOptions,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_request(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn decline_credential_request(
        &self,
        record_id: &str,
        reason: Option<String>,
    ) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.decline_request(&mut record, reason).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    /// Stores the received credential and acks it.
    pub async fn accept_credential(&self, record_id: &str) -> VcxResult<CredentialExchangeRecord> {
        let (mut record, protocol) = self.credential_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_credential(&mut record).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    async fn credential_record(
        &self,
        record_id: &str,
    ) -> VcxResult<(CredentialExchangeRecord, Arc<dyn CredentialProtocol>)> {
        // Every version reads the same records, the stored version decides
        // which one goes on.
        let probe = self.credential_protocols.first().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::UnsupportedProtocolVersion,
                "No issue-credential protocol configured",
            )
        })?;
        let record = probe.get_by_id(record_id).await?;
        let protocol = self.credential_protocol(record.protocol_version())?.clone();
        Ok((record, protocol))
    }

    pub async fn propose_proof(
        &self,
        connection_id: &str,
        version: &str,
        options: ProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let connection = self.connections.get_by_id(connection_id).await?;
        let (record, message) = self
            .proof_protocol(version)?
            .create_proposal(&connection, options)
            .await?;
        self.send_to(&connection, message).await?;
        Ok(record)
    }

    pub async fn request_proof(
        &self,
        connection_id: &str,
        version: &str,
        options: ProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let connection = self.connections.get_by_id(connection_id).await?;
        let (record, message) = self
            .proof_protocol(version)?
            .create_request(Some(&connection), options)
            .await?;
        self.send_to(&connection, message).await?;
        Ok(record)
    }

    /// Proof request for a peer without a connection, to be delivered by
    /// the caller.
    pub async fn create_connectionless_proof_request(
        &self,
        version: &str,
        options: ProofOptions,
    ) -> VcxResult<(ProofExchangeRecord, AriesMessage)> {
        let (record, mut message) = self
            .proof_protocol(version)?
            .create_request(None, options)
            .await?;
        self.connectionless
            .attach_our_service(record.id(), &mut message)
            .await?;
        Ok((record, message))
    }

    pub async fn accept_proof_proposal(
        &self,
        record_id: &str,
        options: AcceptProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_proposal(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn negotiate_proof_proposal(
        &self,
        record_id: &str,
        options: ProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.negotiate_proposal(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn accept_proof_request(
        &self,
        record_id: &str,
        options: AcceptProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_request(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn negotiate_proof_request(
        &self,
        record_id: &str,
        options: ProofOptions,
    ) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.negotiate_request(&mut record, options).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    pub async fn decline_proof_request(
        &self,
        record_id: &str,
        reason: Option<String>,
    ) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.decline_request(&mut record, reason).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    /// Acks a verified presentation.
    pub async fn accept_presentation(&self, record_id: &str) -> VcxResult<ProofExchangeRecord> {
        let (mut record, protocol) = self.proof_record(record_id).await?;
        self.assert_exchange_route(record.id(), record.connection_id())
            .await?;
        let message = protocol.accept_presentation(&mut record).await?;
        self.send_on_exchange(record.id(), record.connection_id(), message)
            .await?;
        Ok(record)
    }

    async fn proof_record(
        &self,
        record_id: &str,
    ) -> VcxResult<(ProofExchangeRecord, Arc<dyn ProofProtocol>)> {
        let probe = self.proof_protocols.first().ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::UnsupportedProtocolVersion,
                "No present-proof protocol configured",
            )
        })?;
        let record = probe.get_by_id(record_id).await?;
        let protocol = self.proof_protocol(record.protocol_version())?.clone();
        Ok((record, protocol))
    }

    /// Asks the peer on `connection_id` which features it supports.
    pub async fn query_features(
        &self,
        connection_id: &str,
        version: &str,
        options: QueryOptions,
    ) -> VcxResult<DiscoverFeaturesRecord> {
        let connection = self.connections.get_by_id(connection_id).await?;
        let (record, message) = self
            .discover_features_protocol(version)?
            .create_query(&connection, options)
            .await?;
        self.send_to(&connection, message).await?;
        Ok(record)
    }
}
