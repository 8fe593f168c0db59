use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::KeyType;
use crate::error::PublicKeyError;

const DID_KEY_PREFIX: &str = "did:key:";

/// Raw public key bytes tagged with their curve.
///
/// Two keys are equal when both the curve and the bytes match, which is what
/// signer authorization checks rely on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    key_type: KeyType,
    key: Vec<u8>,
}

impl Key {
    pub fn new(key: Vec<u8>, key_type: KeyType) -> Result<Self, PublicKeyError> {
        // multibase keys taken from verification methods may still carry the multicodec prefix
        let key = Self::strip_multicodec_prefix_if_present(key, &key_type);
        if key.len() != key_type.key_length() {
            return Err(PublicKeyError::InvalidKeyLength(key.len(), key_type));
        }
        Ok(Self { key_type, key })
    }

    pub fn key_type(&self) -> &KeyType {
        &self.key_type
    }

    pub fn validate_key_type(&self, key_type: KeyType) -> Result<&Self, PublicKeyError> {
        if self.key_type() != &key_type {
            return Err(PublicKeyError::InvalidKeyType(self.key_type, key_type));
        }
        Ok(self)
    }

    pub fn key(&self) -> &[u8] {
        self.key.as_ref()
    }

    pub fn multicodec_prefixed_key(&self) -> Vec<u8> {
        let code = self.key_type().into();
        let mut buffer = [0u8; 10];
        let bytes = unsigned_varint::encode::u64(code, &mut buffer);
        let mut prefixed_key = bytes.to_vec();
        prefixed_key.extend_from_slice(&self.key);
        prefixed_key
    }

    /// Multibase (base58btc) encoding of the multicodec prefixed key, e.g. `z6Mk...`.
    pub fn fingerprint(&self) -> String {
        multibase::encode(multibase::Base::Base58Btc, self.multicodec_prefixed_key())
    }

    pub fn prefixless_fingerprint(&self) -> String {
        self.fingerprint().trim_start_matches('z').to_string()
    }

    pub fn short_prefixless_fingerprint(&self) -> String {
        self.prefixless_fingerprint().chars().take(8).collect()
    }

    pub fn base58(&self) -> String {
        bs58::encode(&self.key).into_string()
    }

    pub fn from_fingerprint(fingerprint: &str) -> Result<Self, PublicKeyError> {
        let (_base, decoded_bytes) = multibase::decode(fingerprint)?;
        let (code, remaining_bytes) = unsigned_varint::decode::u64(&decoded_bytes)?;
        Self::new(remaining_bytes.to_vec(), code.try_into()?)
    }

    pub fn from_base58(base58: &str, key_type: KeyType) -> Result<Self, PublicKeyError> {
        let decoded_bytes = bs58::decode(base58).into_vec()?;
        Self::new(decoded_bytes, key_type)
    }

    /// `did:key` DID whose method specific id is this key's fingerprint.
    pub fn to_did_key(&self) -> String {
        format!("{DID_KEY_PREFIX}{}", self.fingerprint())
    }

    /// Accepts both a bare `did:key:z...` and a DID URL `did:key:z...#z...`.
    pub fn from_did_key(did_key: &str) -> Result<Self, PublicKeyError> {
        let method_specific_id = did_key
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or_else(|| PublicKeyError::InvalidDidKey(did_key.to_owned()))?;
        let fingerprint = method_specific_id
            .split('#')
            .next()
            .unwrap_or(method_specific_id);
        Self::from_fingerprint(fingerprint)
    }

    fn strip_multicodec_prefix_if_present(key: Vec<u8>, key_type: &KeyType) -> Vec<u8> {
        match unsigned_varint::decode::u64(&key) {
            Ok((value, remaining))
                if value == u64::from(key_type) && remaining.len() == key_type.key_length() =>
            {
                remaining.to_vec()
            }
            _ => key,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_BASE58: &str = "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K";
    const ED25519_FINGERPRINT: &str = "z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th";
    const X25519_BASE58: &str = "6fUMuABnqSDsaGKojbUF3P7ZkEL3wi2njsDdUWZGNgCU";
    const X25519_FINGERPRINT: &str = "z6LShLeXRTzevtwcfehaGEzCMyL3bNsAeKCwcqwJxyCo63yE";

    #[test]
    fn ed25519_fingerprint_matches_known_vector() {
        let key = Key::from_base58(ED25519_BASE58, KeyType::Ed25519).unwrap();
        assert_eq!(key.fingerprint(), ED25519_FINGERPRINT);
        assert_eq!(key.base58(), ED25519_BASE58);
        assert_eq!(key.short_prefixless_fingerprint(), "6MkmjY8G");
    }

    #[test]
    fn x25519_fingerprint_roundtrips() {
        let key = Key::from_fingerprint(X25519_FINGERPRINT).unwrap();
        assert_eq!(key.key_type(), &KeyType::X25519);
        assert_eq!(key.base58(), X25519_BASE58);
    }

    #[test]
    fn did_key_accepts_did_url() {
        let key = Key::from_base58(ED25519_BASE58, KeyType::Ed25519).unwrap();
        let did = key.to_did_key();
        assert_eq!(did, format!("did:key:{ED25519_FINGERPRINT}"));

        let with_fragment = format!("{did}#{ED25519_FINGERPRINT}");
        assert_eq!(Key::from_did_key(&with_fragment).unwrap(), key);
        assert!(Key::from_did_key("did:peer:0z6Mk").is_err());
    }

    #[test]
    fn prefixed_key_bytes_are_stripped() {
        let key = Key::from_base58(ED25519_BASE58, KeyType::Ed25519).unwrap();
        let prefixed = Key::new(key.multicodec_prefixed_key(), KeyType::Ed25519).unwrap();
        assert_eq!(prefixed, key);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(Key::new(vec![1, 2, 3], KeyType::Ed25519).is_err());
        assert!(Key::from_fingerprint("this is not a valid fingerprint").is_err());
    }
}
