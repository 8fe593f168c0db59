use std::{string::FromUtf8Error, sync::PoisonError};

use did_doc::error::DidDocumentError;
use did_key::error::DidKeyError;
use did_peer::error::DidPeerError;
use did_resolver::error::DidResolverError;
use messages::error::MsgTypeError;
use public_key::PublicKeyError;

use crate::errors::error::{AriesVcxError, AriesVcxErrorKind};

impl From<serde_json::Error> for AriesVcxError {
    fn from(err: serde_json::Error) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidJson, format!("Invalid json: {err}"))
    }
}

impl<T> From<PoisonError<T>> for AriesVcxError {
    fn from(err: PoisonError<T>) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::LockError, err.to_string())
    }
}

impl From<MsgTypeError> for AriesVcxError {
    fn from(err: MsgTypeError) -> Self {
        let kind = match err {
            MsgTypeError::UnknownProtocol(_)
            | MsgTypeError::UnknownMsgKind { .. }
            | MsgTypeError::NotStandalone(_) => AriesVcxErrorKind::UnroutableMessage,
            MsgTypeError::UnsupportedVersion { .. } => {
                AriesVcxErrorKind::UnsupportedProtocolVersion
            }
            MsgTypeError::InvalidMsgType(_)
            | MsgTypeError::MissingMsgType
            | MsgTypeError::Deserialization(_)
            | MsgTypeError::Validation(_) => AriesVcxErrorKind::InvalidJson,
        };
        AriesVcxError::from_msg(kind, err.to_string())
    }
}

impl From<DidResolverError> for AriesVcxError {
    fn from(err: DidResolverError) -> Self {
        let kind = match err {
            DidResolverError::InvalidDid(_) => AriesVcxErrorKind::InvalidDid,
            DidResolverError::UnsupportedMethod(_)
            | DidResolverError::NotFound(_)
            | DidResolverError::RequiresAttachedDocument { .. }
            | DidResolverError::ResolutionFailed { .. } => AriesVcxErrorKind::DidResolutionFailed,
        };
        AriesVcxError::from_msg(kind, err.to_string())
    }
}

impl From<DidDocumentError> for AriesVcxError {
    fn from(err: DidDocumentError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidDid, err.to_string())
    }
}

impl From<DidPeerError> for AriesVcxError {
    fn from(err: DidPeerError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidDid, err.to_string())
    }
}

impl From<DidKeyError> for AriesVcxError {
    fn from(err: DidKeyError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidDid, err.to_string())
    }
}

impl From<PublicKeyError> for AriesVcxError {
    fn from(err: PublicKeyError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidInput, err.to_string())
    }
}

impl From<base64::DecodeError> for AriesVcxError {
    fn from(err: base64::DecodeError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::SerializationError, err.to_string())
    }
}

impl From<FromUtf8Error> for AriesVcxError {
    fn from(err: FromUtf8Error) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::SerializationError, err.to_string())
    }
}

impl From<url::ParseError> for AriesVcxError {
    fn from(err: url::ParseError) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::InvalidInput, err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AriesVcxError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AriesVcxError::from_msg(AriesVcxErrorKind::Timeout, err.to_string())
    }
}
