//! Out-of-band invitations. The sender's record outlives the handshake when
//! the invitation is reusable; the receiver's record ends with the
//! connection it leads to.

pub mod service;

use aries_vcx_wallet::wallet::base_wallet::record_tags::RecordTags;
use did_resolver::did::strip_did_url;
use messages::msg_fields::protocols::out_of_band::invitation::{Invitation, OobService};
use public_key::Key;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use self::service::{CreateInvitationConfig, OutOfBandService, ReceiveInvitationConfig};
use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};
use crate::errors::error::VcxResult;

pub const OUT_OF_BAND_PROTOCOL_VERSION: &str = "1.1";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutOfBandState {
    Initial,
    AwaitResponse,
    PrepareResponse,
    Done,
}

impl RecordState for OutOfBandState {
    /// An invitation has no failure state of its own.
    const ABANDONED: Self = Self::Done;

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutOfBandRole {
    Sender,
    Receiver,
}

impl RecordRole for OutOfBandRole {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutOfBandData {
    pub invitation: Invitation,
    pub alias: Option<String>,
    pub reusable: bool,
    #[serde(default)]
    pub recipient_key_fingerprints: Vec<String>,
    /// Set on the receiver once it answered with a handshake reuse.
    pub reuse_connection_id: Option<String>,
    pub auto_accept_connection: Option<bool>,
}

impl OutOfBandData {
    pub fn invitation_id(&self) -> &str {
        &self.invitation.id
    }

    pub fn inline_recipient_keys(&self) -> VcxResult<Vec<Key>> {
        let mut keys = Vec::new();
        for service in &self.invitation.content.services {
            if let OobService::Inline(service) = service {
                for reference in service.recipient_keys() {
                    keys.push(Key::from_did_key(reference)?);
                }
            }
        }
        Ok(keys)
    }

    /// DIDs named as services, without any fragment.
    pub fn did_services(&self) -> Vec<&str> {
        self.invitation
            .content
            .services
            .iter()
            .filter_map(|service| match service {
                OobService::Did(did) => Some(strip_did_url(did)),
                OobService::Inline(_) => None,
            })
            .collect()
    }

    /// The DID a connection built from this invitation remembers it by: the
    /// first DID service, or the did:key of the first inline recipient key.
    pub fn invitation_did(&self) -> VcxResult<Option<String>> {
        if let Some(did) = self.did_services().first() {
            return Ok(Some((*did).to_owned()));
        }
        Ok(self
            .inline_recipient_keys()?
            .first()
            .map(Key::to_did_key))
    }

    pub fn has_requests(&self) -> bool {
        self.invitation
            .content
            .requests_attach
            .as_ref()
            .is_some_and(|requests| !requests.is_empty())
    }
}

impl RecordData for OutOfBandData {
    const CATEGORY: &'static str = "out_of_band";

    fn tags(&self) -> RecordTags {
        let mut tags = RecordTags::new(vec![(
            "invitation_id".to_owned(),
            self.invitation.id.clone(),
        )]);
        for fingerprint in &self.recipient_key_fingerprints {
            tags.add(("recipient_key_fingerprint".to_owned(), fingerprint.clone()));
        }
        tags
    }
}

pub type OutOfBandRecord = ExchangeRecord<OutOfBandState, OutOfBandRole, OutOfBandData>;
