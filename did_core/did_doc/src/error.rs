use thiserror::Error;

use crate::schema::verification_method::VerificationMethodType;

#[derive(Debug, Error)]
pub enum DidDocumentError {
    #[error("Public key error: {0}")]
    PublicKeyError(#[from] public_key::PublicKeyError),
    #[error("Multibase decoding error: {0}")]
    MultibaseError(#[from] multibase::Error),
    #[error("Verification method {0} could not be dereferenced")]
    UnresolvableReference(String),
    #[error("Verification method type {0} does not map to a key type")]
    UnsupportedVerificationMethodType(VerificationMethodType),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
