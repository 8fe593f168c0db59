//! Connection records: the outcome of a did-exchange (or of an out-of-band
//! handshake reuse) and the DIDs each side holds for the other.

pub mod connectionless;
pub mod did_record;
pub mod service;

use aries_vcx_wallet::wallet::base_wallet::record_tags::RecordTags;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use self::{
    connectionless::{ConnectionlessRoute, ConnectionlessService},
    did_record::{DidRecord, DidRepository, DidRole},
    service::ConnectionService,
};
use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};
use crate::errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult};

pub const DID_EXCHANGE_PROTOCOL_VERSION: &str = "1.1";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DidExchangeState {
    Start,
    InvitationReceived,
    RequestSent,
    RequestReceived,
    ResponseSent,
    ResponseReceived,
    Completed,
    Abandoned,
}

impl RecordState for DidExchangeState {
    const ABANDONED: Self = Self::Abandoned;

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DidExchangeRole {
    Requester,
    Responder,
}

impl RecordRole for DidExchangeRole {}

/// A rotation of our own DID that the peer has not acknowledged yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DidRotateMetadata {
    pub did: String,
    pub thread_id: String,
}

/// Transient negotiation data, cleared when the negotiation ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_rotate: Option<DidRotateMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub did: Option<String>,
    pub their_did: Option<String>,
    pub their_label: Option<String>,
    pub alias: Option<String>,
    /// DID service of the invitation the request was sent to, if any.
    pub invitation_did: Option<String>,
    pub out_of_band_id: Option<String>,
    #[serde(default)]
    pub previous_dids: Vec<String>,
    #[serde(default)]
    pub previous_their_dids: Vec<String>,
    #[serde(default)]
    pub metadata: ConnectionMetadata,
    pub auto_accept_connection: Option<bool>,
}

impl RecordData for ConnectionData {
    const CATEGORY: &'static str = "connection";

    fn tags(&self) -> RecordTags {
        let mut tags = RecordTags::default();
        tags.add_opt("did", self.did.as_deref());
        tags.add_opt("their_did", self.their_did.as_deref());
        tags.add_opt("invitation_did", self.invitation_did.as_deref());
        tags.add_opt("out_of_band_id", self.out_of_band_id.as_deref());
        for did in &self.previous_dids {
            tags.add(("previous_did".to_owned(), did.clone()));
        }
        for did in &self.previous_their_dids {
            tags.add(("previous_their_did".to_owned(), did.clone()));
        }
        tags
    }
}

pub type ConnectionRecord = ExchangeRecord<DidExchangeState, DidExchangeRole, ConnectionData>;

impl ExchangeRecord<DidExchangeState, DidExchangeRole, ConnectionData> {
    /// A responder can already talk over the connection once its response
    /// went out; the complete message only confirms it.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state(),
            DidExchangeState::Completed | DidExchangeState::ResponseSent
        )
    }

    pub fn assert_ready(&self) -> VcxResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!(
                    "Connection {} is in state {}, which is not ready",
                    self.id(),
                    self.state()
                ),
            ))
        }
    }

    pub fn did(&self) -> Option<&str> {
        self.data.did.as_deref()
    }

    pub fn their_did(&self) -> Option<&str> {
        self.data.their_did.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_states() {
        let mut record = ConnectionRecord::new(
            "thid",
            DidExchangeRole::Responder,
            DidExchangeState::RequestReceived,
            DID_EXCHANGE_PROTOCOL_VERSION,
            ConnectionData::default(),
        );
        assert!(!record.is_ready());
        assert!(record.assert_ready().is_err());

        record
            .transition(
                &[DidExchangeState::RequestReceived],
                DidExchangeState::ResponseSent,
            )
            .unwrap();
        assert!(record.is_ready());
    }

    #[test]
    fn test_previous_dids_are_multi_valued_tags() {
        let data = ConnectionData {
            did: Some("did:peer:ours".to_owned()),
            previous_their_dids: vec!["did:a".to_owned(), "did:b".to_owned()],
            ..Default::default()
        };
        let tags = data.tags();
        assert!(tags.contains("previous_their_did", "did:a"));
        assert!(tags.contains("previous_their_did", "did:b"));
        assert_eq!(tags.get("did"), Some("did:peer:ours"));
        assert!(!tags.has_name("their_did"));
    }
}
