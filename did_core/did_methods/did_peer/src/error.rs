use thiserror::Error;

#[derive(Debug, Error)]
pub enum DidPeerError {
    #[error("DID validation error: {0}")]
    DidValidationError(String),
    #[error("Unsupported numalgo: {0}")]
    UnsupportedNumalgo(char),
    #[error("Unsupported purpose character: {0}")]
    UnsupportedPurpose(char),
    #[error("Invalid key reference: {0}")]
    InvalidKeyReference(String),
    #[error("Invalid service: {0}")]
    InvalidService(String),
    #[error("Encoded document hash does not match DID: {0}")]
    HashMismatch(String),
    #[error("Base 64 decoding error")]
    Base64DecodingError(#[from] base64::DecodeError),
    #[error("Multibase decoding error: {0}")]
    MultibaseError(#[from] multibase::Error),
    #[error("Varint decoding error: {0}")]
    VarintError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Public key error: {0}")]
    PublicKeyError(#[from] public_key::PublicKeyError),
    #[error("DID document error: {0}")]
    DidDocumentError(#[from] did_doc::error::DidDocumentError),
}

impl From<unsigned_varint::decode::Error> for DidPeerError {
    fn from(error: unsigned_varint::decode::Error) -> Self {
        Self::VarintError(error.to_string())
    }
}
