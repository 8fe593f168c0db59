use thiserror::Error;

#[derive(Debug, Error)]
pub enum DidResolverError {
    #[error("Invalid DID: {0}")]
    InvalidDid(String),
    #[error("No resolver registered for DID method {0}")]
    UnsupportedMethod(String),
    #[error("DID {0} not found")]
    NotFound(String),
    #[error("DID {did} cannot be resolved without an attached document")]
    RequiresAttachedDocument { did: String },
    #[error("Resolution of {did} failed: {reason}")]
    ResolutionFailed { did: String, reason: String },
}
