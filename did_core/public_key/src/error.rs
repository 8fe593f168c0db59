use thiserror::Error;

use crate::KeyType;

#[derive(Debug, Error)]
pub enum PublicKeyError {
    #[error("Base 64 decoding error")]
    Base64DecodingError(#[from] base64::DecodeError),
    #[error("Base 58 decoding error")]
    Base58DecodingError(#[from] bs58::decode::Error),
    #[error("Multibase decoding error")]
    MultibaseDecodingError(#[from] multibase::Error),
    #[error("Varint decoding error: {0}")]
    VarintDecodingError(String),
    #[error("Unsupported multicodec descriptor: {0}")]
    UnsupportedMulticodecDescriptor(u64),
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("Invalid KeyType {0}, expected KeyType: {1}")]
    InvalidKeyType(KeyType, KeyType),
    #[error("Invalid key length {0} for key type {1}")]
    InvalidKeyLength(usize, KeyType),
    #[error("Not a did:key: {0}")]
    InvalidDidKey(String),
}

impl From<unsigned_varint::decode::Error> for PublicKeyError {
    fn from(error: unsigned_varint::decode::Error) -> Self {
        Self::VarintDecodingError(error.to_string())
    }
}
