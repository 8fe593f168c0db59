use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::{Key, KeyType, PublicKeyError};

/// Octet key pair JWK (RFC 8037), as carried in the protected header of a
/// DIDComm attachment signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkpJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Key {
    pub fn to_okp_jwk(&self) -> OkpJwk {
        OkpJwk {
            kty: "OKP".to_owned(),
            crv: self.key_type().jwk_curve().to_owned(),
            x: URL_SAFE_NO_PAD.encode(self.key()),
            kid: Some(self.to_did_key()),
        }
    }

    pub fn from_okp_jwk(jwk: &OkpJwk) -> Result<Self, PublicKeyError> {
        if jwk.kty != "OKP" {
            return Err(PublicKeyError::UnsupportedKeyType(jwk.kty.clone()));
        }
        let key_type = KeyType::from_jwk_curve(&jwk.crv)?;
        Key::new(URL_SAFE_NO_PAD.decode(&jwk.x)?, key_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn okp_jwk_carries_did_key_kid() {
        let key = Key::from_base58(
            "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K",
            KeyType::Ed25519,
        )
        .unwrap();
        let jwk = key.to_okp_jwk();
        assert_eq!(jwk.crv, "Ed25519");
        assert_eq!(jwk.kid.as_deref(), Some(key.to_did_key().as_str()));
        assert_eq!(Key::from_okp_jwk(&jwk).unwrap(), key);
    }
}
