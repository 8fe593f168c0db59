use std::fmt;

use thiserror::Error as ThisError;

pub type VcxWalletResult<T> = Result<T, VcxWalletError>;

pub struct NotFoundInfo(Option<(String, String)>);

impl NotFoundInfo {
    pub fn new(category: &str, name: &str) -> Self {
        Self(Some((category.to_owned(), name.to_owned())))
    }

    pub fn new_without_details() -> Self {
        Self(None)
    }
}

impl fmt::Debug for NotFoundInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => write!(f, "no details provided"),
            Some(payload) => write!(f, "category: {}, name: {}", payload.0, payload.1),
        }
    }
}

impl fmt::Display for NotFoundInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, ThisError)]
pub enum VcxWalletError {
    #[error("Duplicate record error: {0}")]
    DuplicateRecord(String),
    #[error("Could not find record in wallet: {0}")]
    RecordNotFound(NotFoundInfo),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Public key error: {0}")]
    PublicKeyError(#[source] public_key::PublicKeyError),
    #[error("Signature error: {0}")]
    SignatureError(#[source] ed25519_dalek::SignatureError),
}

impl VcxWalletError {
    pub fn record_not_found(category: &str, name: &str) -> Self {
        Self::RecordNotFound(NotFoundInfo::new(category, name))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound(_))
    }
}
