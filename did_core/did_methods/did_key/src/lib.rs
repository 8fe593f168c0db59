pub mod error;
pub mod resolver;

use std::fmt::Display;

use error::DidKeyError;
use public_key::Key;
use serde::{Deserialize, Serialize};

/// A `did:key` DID together with the key it encodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DidKey {
    key: Key,
    did: String,
}

impl DidKey {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// DID URL of the single verification method, `did:key:z..#z..`.
    pub fn key_id(&self) -> String {
        format!("{}#{}", self.did, self.key.fingerprint())
    }

    pub fn parse(did: &str) -> Result<Self, DidKeyError> {
        let key = Key::from_did_key(did)?;
        Ok(Self::from(key))
    }
}

impl From<Key> for DidKey {
    fn from(key: Key) -> Self {
        let did = key.to_did_key();
        Self { key, did }
    }
}

impl TryFrom<String> for DidKey {
    type Error = DidKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Display for DidKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.did)
    }
}

impl Serialize for DidKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.did)
    }
}

impl<'de> Deserialize<'de> for DidKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DidKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "did:key:z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th";

    #[test]
    fn parse_and_format() {
        let did_key = DidKey::parse(DID).unwrap();
        assert_eq!(did_key.to_string(), DID);
        assert_eq!(
            did_key.key_id(),
            format!("{DID}#z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th")
        );
        assert_eq!(
            did_key.key().base58(),
            "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K"
        );
    }

    #[test]
    fn rejects_other_methods() {
        assert!(
            DidKey::parse("did:peer:0z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th").is_err()
        );
    }
}
