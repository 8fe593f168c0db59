use super::error::VcxWalletError;

impl From<serde_json::Error> for VcxWalletError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

impl From<public_key::PublicKeyError> for VcxWalletError {
    fn from(value: public_key::PublicKeyError) -> Self {
        Self::PublicKeyError(value)
    }
}

impl From<ed25519_dalek::SignatureError> for VcxWalletError {
    fn from(value: ed25519_dalek::SignatureError) -> Self {
        Self::SignatureError(value)
    }
}
