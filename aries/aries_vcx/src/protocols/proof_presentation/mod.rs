//! Present proof 2.0. As with issuance, the protocol only moves attachments
//! around and leaves their meaning to [`format::ProofFormatService`]s.

pub mod format;
pub mod json_format;
pub mod protocol;
pub mod v2;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use self::{
    protocol::{AcceptProofOptions, ProofOptions, ProofProtocol},
    v2::ProofV2Protocol,
};
use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};

pub const PROOF_PROTOCOL_V2: &str = "v2";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProofState {
    ProposalSent,
    ProposalReceived,
    RequestSent,
    RequestReceived,
    PresentationSent,
    PresentationReceived,
    Declined,
    Done,
    Abandoned,
}

impl RecordState for ProofState {
    const ABANDONED: Self = Self::Abandoned;

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Declined | Self::Abandoned)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProofRole {
    Prover,
    Verifier,
}

impl RecordRole for ProofRole {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofExchangeData {
    /// Set by the verifier once a presentation was checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl RecordData for ProofExchangeData {
    const CATEGORY: &'static str = "proof_exchange";
}

pub type ProofExchangeRecord = ExchangeRecord<ProofState, ProofRole, ProofExchangeData>;
