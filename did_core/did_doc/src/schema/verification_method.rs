use std::fmt::Display;

use public_key::{Key, KeyType, OkpJwk};
use serde::{Deserialize, Serialize};

use crate::error::DidDocumentError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationMethodType {
    Ed25519VerificationKey2018,
    Ed25519VerificationKey2020,
    X25519KeyAgreementKey2019,
    X25519KeyAgreementKey2020,
    Multikey,
    JsonWebKey2020,
}

impl VerificationMethodType {
    /// `None` for types that encode the curve inside the key material itself.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Self::Ed25519VerificationKey2018 | Self::Ed25519VerificationKey2020 => {
                Some(KeyType::Ed25519)
            }
            Self::X25519KeyAgreementKey2019 | Self::X25519KeyAgreementKey2020 => {
                Some(KeyType::X25519)
            }
            Self::Multikey | Self::JsonWebKey2020 => None,
        }
    }
}

impl Display for VerificationMethodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PublicKeyField {
    Multibase {
        #[serde(rename = "publicKeyMultibase")]
        public_key_multibase: String,
    },
    Base58 {
        #[serde(rename = "publicKeyBase58")]
        public_key_base58: String,
    },
    Jwk {
        #[serde(rename = "publicKeyJwk")]
        public_key_jwk: OkpJwk,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    id: String,
    controller: String,
    #[serde(rename = "type")]
    verification_method_type: VerificationMethodType,
    #[serde(flatten)]
    public_key: PublicKeyField,
}

impl VerificationMethod {
    pub fn new(
        id: String,
        controller: String,
        verification_method_type: VerificationMethodType,
        public_key: PublicKeyField,
    ) -> Self {
        Self {
            id,
            controller,
            verification_method_type,
            public_key,
        }
    }

    /// Ed25519VerificationKey2018 method carrying the key in base58, the shape
    /// DIDComm v1 agents expect.
    pub fn ed25519_2018(id: String, controller: String, key: &Key) -> Self {
        Self::new(
            id,
            controller,
            VerificationMethodType::Ed25519VerificationKey2018,
            PublicKeyField::Base58 {
                public_key_base58: key.base58(),
            },
        )
    }

    /// Multikey method carrying the key fingerprint.
    pub fn multikey(id: String, controller: String, key: &Key) -> Self {
        Self::new(
            id,
            controller,
            VerificationMethodType::Multikey,
            PublicKeyField::Multibase {
                public_key_multibase: key.fingerprint(),
            },
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn verification_method_type(&self) -> &VerificationMethodType {
        &self.verification_method_type
    }

    pub fn public_key_field(&self) -> &PublicKeyField {
        &self.public_key
    }

    pub fn fragment(&self) -> Option<&str> {
        self.id.split_once('#').map(|(_, fragment)| fragment)
    }

    pub fn public_key(&self) -> Result<Key, DidDocumentError> {
        let key_type = self.verification_method_type.key_type();
        match (&self.public_key, key_type) {
            (PublicKeyField::Jwk { public_key_jwk }, _) => Ok(Key::from_okp_jwk(public_key_jwk)?),
            (
                PublicKeyField::Multibase {
                    public_key_multibase,
                },
                None,
            ) => Ok(Key::from_fingerprint(public_key_multibase)?),
            (
                PublicKeyField::Multibase {
                    public_key_multibase,
                },
                Some(key_type),
            ) => {
                let (_, bytes) = multibase::decode(public_key_multibase)?;
                Ok(Key::new(bytes, key_type)?)
            }
            (PublicKeyField::Base58 { public_key_base58 }, Some(key_type)) => {
                Ok(Key::from_base58(public_key_base58, key_type)?)
            }
            (PublicKeyField::Base58 { .. }, None) => Err(
                DidDocumentError::UnsupportedVerificationMethodType(self.verification_method_type),
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum VerificationMethodKind {
    Resolved(VerificationMethod),
    Resolvable(String),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const KEY_BASE58: &str = "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K";

    #[test]
    fn base58_and_multikey_methods_yield_same_key() {
        let key = Key::from_base58(KEY_BASE58, KeyType::Ed25519).unwrap();
        let legacy = VerificationMethod::ed25519_2018("#key-1".into(), "did:example:1".into(), &key);
        let multikey = VerificationMethod::multikey("#key-2".into(), "did:example:1".into(), &key);
        assert_eq!(legacy.public_key().unwrap(), key);
        assert_eq!(multikey.public_key().unwrap(), key);
        assert_eq!(legacy.fragment(), Some("key-1"));
    }

    #[test]
    fn deserializes_reference_and_embedded_kinds() {
        let kinds: Vec<VerificationMethodKind> = serde_json::from_value(json!([
            "#key-1",
            {
                "id": "#key-2",
                "controller": "did:example:1",
                "type": "Ed25519VerificationKey2018",
                "publicKeyBase58": KEY_BASE58
            }
        ]))
        .unwrap();
        assert!(matches!(kinds[0], VerificationMethodKind::Resolvable(ref r) if r == "#key-1"));
        assert!(matches!(kinds[1], VerificationMethodKind::Resolved(_)));
    }
}
