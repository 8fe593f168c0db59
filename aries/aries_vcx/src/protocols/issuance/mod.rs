//! Issue credential 2.0. The protocol only moves attachments around; what
//! they contain is up to the [`format::CredentialFormatService`]s it is
//! configured with.

pub mod format;
pub mod json_format;
pub mod protocol;
pub mod v2;

use messages::msg_fields::protocols::cred_issuance::CredentialAttr;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use self::{
    protocol::{AcceptCredentialOptions, CredentialOptions, CredentialProtocol},
    v2::CredentialV2Protocol,
};
use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};

pub const CREDENTIAL_PROTOCOL_V2: &str = "v2";

/// Problem code sent when either side gives up on an issuance.
pub const ISSUANCE_ABANDONED_PROBLEM_CODE: &str = "issuance-abandoned";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CredentialState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    OfferReceived,
    Declined,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    Done,
    Abandoned,
}

impl RecordState for CredentialState {
    const ABANDONED: Self = Self::Abandoned;

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Declined | Self::Abandoned)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CredentialRole {
    Issuer,
    Holder,
}

impl RecordRole for CredentialRole {}

/// A credential stored by a format service once it was received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialBinding {
    pub format: String,
    pub credential_record_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialExchangeData {
    /// Attributes of the latest credential preview on the thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_attributes: Option<Vec<CredentialAttr>>,
    #[serde(default)]
    pub credentials: Vec<CredentialBinding>,
}

impl RecordData for CredentialExchangeData {
    const CATEGORY: &'static str = "credential_exchange";
}

pub type CredentialExchangeRecord =
    ExchangeRecord<CredentialState, CredentialRole, CredentialExchangeData>;
