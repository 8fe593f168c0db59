use thiserror::Error;

pub type MsgTypeResult<T> = Result<T, MsgTypeError>;

#[derive(Debug, Error, PartialEq)]
pub enum MsgTypeError {
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),
    #[error("Unsupported version {major}.{minor} of protocol {family}")]
    UnsupportedVersion { family: String, major: u8, minor: u8 },
    #[error("Unknown message kind {kind} in protocol {protocol}")]
    UnknownMsgKind { protocol: String, kind: String },
    #[error("Invalid message type: {0}")]
    InvalidMsgType(String),
    #[error("{0} is not a standalone message")]
    NotStandalone(String),
    #[error("Message is missing the @type field")]
    MissingMsgType,
    #[error("Message failed to deserialize: {0}")]
    Deserialization(String),
    #[error("Message failed validation: {0}")]
    Validation(String),
}

impl MsgTypeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<serde_json::Error> for MsgTypeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}
