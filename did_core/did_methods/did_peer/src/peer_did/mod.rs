pub mod numalgos;
mod validate;

use std::fmt::Display;

use crate::error::DidPeerError;

pub use validate::is_valid_peer_did;

const PEER_DID_PREFIX: &str = "did:peer:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PeerDidNumAlgo {
    InceptionKeyWithoutDoc,
    GenesisDoc,
    MultipleInceptionKeyWithoutDoc,
    ShortFormAndLongForm,
}

impl PeerDidNumAlgo {
    pub fn as_char(&self) -> char {
        match self {
            Self::InceptionKeyWithoutDoc => '0',
            Self::GenesisDoc => '1',
            Self::MultipleInceptionKeyWithoutDoc => '2',
            Self::ShortFormAndLongForm => '4',
        }
    }
}

impl TryFrom<char> for PeerDidNumAlgo {
    type Error = DidPeerError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '0' => Ok(Self::InceptionKeyWithoutDoc),
            '1' => Ok(Self::GenesisDoc),
            '2' => Ok(Self::MultipleInceptionKeyWithoutDoc),
            '4' => Ok(Self::ShortFormAndLongForm),
            c => Err(DidPeerError::UnsupportedNumalgo(c)),
        }
    }
}

impl Display for PeerDidNumAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub(crate) fn method_specific_id(did: &str) -> Result<&str, DidPeerError> {
    did.strip_prefix(PEER_DID_PREFIX)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DidPeerError::DidValidationError(format!("Not a did:peer: {did}")))
}

pub fn num_algo_from_peer_did(did: &str) -> Result<PeerDidNumAlgo, DidPeerError> {
    let id = method_specific_id(did)?;
    id.chars()
        .next()
        .ok_or_else(|| DidPeerError::DidValidationError(did.to_owned()))?
        .try_into()
}

/// Other DIDs the same document is known by. Only numalgo 4 long form DIDs
/// have one: their short form.
pub fn alternative_dids_for_peer_did(did: &str) -> Option<Vec<String>> {
    match num_algo_from_peer_did(did) {
        Ok(PeerDidNumAlgo::ShortFormAndLongForm) => numalgos::numalgo4::short_form(did)
            .ok()
            .filter(|short| short != did)
            .map(|short| vec![short]),
        _ => None,
    }
}
