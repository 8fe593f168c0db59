use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::PublicKeyError;

/// Curves used for DIDComm v1 signing (Ed25519) and key agreement (X25519).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Ed25519,
    X25519,
}

impl KeyType {
    const C_X25519: u64 = 236;
    const C_ED25519: u64 = 237;

    pub fn key_length(&self) -> usize {
        32
    }

    /// Curve name as used in the `crv` member of an OKP JWK.
    pub fn jwk_curve(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "Ed25519",
            KeyType::X25519 => "X25519",
        }
    }

    pub fn from_jwk_curve(crv: &str) -> Result<Self, PublicKeyError> {
        match crv {
            "Ed25519" => Ok(KeyType::Ed25519),
            "X25519" => Ok(KeyType::X25519),
            other => Err(PublicKeyError::UnsupportedKeyType(other.to_owned())),
        }
    }
}

// https://github.com/multiformats/multicodec/blob/master/table.csv
impl From<&KeyType> for u64 {
    fn from(key_type: &KeyType) -> Self {
        match key_type {
            KeyType::X25519 => KeyType::C_X25519,
            KeyType::Ed25519 => KeyType::C_ED25519,
        }
    }
}

impl TryFrom<u64> for KeyType {
    type Error = PublicKeyError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            KeyType::C_X25519 => Ok(KeyType::X25519),
            KeyType::C_ED25519 => Ok(KeyType::Ed25519),
            p => Err(PublicKeyError::UnsupportedMulticodecDescriptor(p)),
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.jwk_curve())
    }
}
