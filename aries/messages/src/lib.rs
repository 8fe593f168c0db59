#![allow(clippy::or_fun_call)]
#![allow(clippy::module_inception)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::new_without_default)]
#![allow(clippy::large_enum_variant)]

pub mod decorators;
pub mod error;
pub mod misc;
pub mod msg_fields;
pub mod msg_parts;
pub mod msg_types;

use std::str::FromStr;

use derive_more::From;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{
    decorators::{service::Service, thread::Thread},
    error::{MsgTypeError, MsgTypeResult},
    msg_fields::{
        protocols::{
            cred_issuance::{v2::CredentialIssuanceV2, CredentialIssuance},
            did_exchange::DidExchange,
            did_rotate::DidRotate,
            discover_features::{v1::DiscoverFeaturesV1, v2::DiscoverFeaturesV2, DiscoverFeatures},
            notification::Ack,
            out_of_band::OutOfBand,
            present_proof::{v2::PresentProofV2, PresentProof},
            report_problem::ProblemReport,
        },
        traits::DelayedSerde,
    },
    msg_types::{MessageType, Protocol},
};

/// Enum that can represent any message of the implemented protocols.
///
/// It abstracts away the `@type` field and uses it to determine how
/// to deserialize the input into the correct message type.
///
/// It also automatically appends the correct `@type` field when serializing
/// a message.
#[derive(Clone, Debug, From, PartialEq)]
pub enum AriesMessage {
    DidExchange(DidExchange),
    OutOfBand(OutOfBand),
    CredentialIssuance(CredentialIssuance),
    PresentProof(PresentProof),
    DiscoverFeatures(DiscoverFeatures),
    DidRotate(DidRotate),
    Notification(Ack),
    ReportProblem(ProblemReport),
}

impl AriesMessage {
    /// Parses and validates a message from its JSON form.
    pub fn from_value(mut value: Value) -> MsgTypeResult<Self> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| MsgTypeError::Deserialization("message is not a JSON object".to_owned()))?;

        let msg_type = match obj.remove("@type") {
            Some(Value::String(msg_type)) => MessageType::from_str(&msg_type)?,
            Some(other) => return Err(MsgTypeError::InvalidMsgType(other.to_string())),
            None => return Err(MsgTypeError::MissingMsgType),
        };

        let msg = Self::delayed_deserialize(&msg_type, value)?;
        msg.validate()?;
        Ok(msg)
    }

    /// Checks the structural rules that serde alone cannot express, such as
    /// required thread ids and attachment references.
    pub fn validate(&self) -> MsgTypeResult<()> {
        match self {
            Self::DidExchange(msg) => msg.validate(),
            Self::OutOfBand(msg) => msg.validate(),
            Self::CredentialIssuance(CredentialIssuance::V2(msg)) => msg.validate(),
            Self::PresentProof(PresentProof::V2(msg)) => msg.validate(),
            Self::DidRotate(msg) => msg.validate(),
            Self::DiscoverFeatures(_) | Self::Notification(_) | Self::ReportProblem(_) => Ok(()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::DidExchange(msg) => match msg {
                DidExchange::Request(m) => &m.id,
                DidExchange::Response(m) => &m.id,
                DidExchange::Complete(m) => &m.id,
                DidExchange::ProblemReport(m) => &m.id,
            },
            Self::OutOfBand(msg) => match msg {
                OutOfBand::Invitation(m) => &m.id,
                OutOfBand::HandshakeReuse(m) => &m.id,
                OutOfBand::HandshakeReuseAccepted(m) => &m.id,
            },
            Self::CredentialIssuance(CredentialIssuance::V2(msg)) => match msg {
                CredentialIssuanceV2::ProposeCredential(m) => &m.id,
                CredentialIssuanceV2::OfferCredential(m) => &m.id,
                CredentialIssuanceV2::RequestCredential(m) => &m.id,
                CredentialIssuanceV2::IssueCredential(m) => &m.id,
                CredentialIssuanceV2::Ack(m) => &m.id,
                CredentialIssuanceV2::ProblemReport(m) => &m.id,
            },
            Self::PresentProof(PresentProof::V2(msg)) => match msg {
                PresentProofV2::ProposePresentation(m) => &m.id,
                PresentProofV2::RequestPresentation(m) => &m.id,
                PresentProofV2::Presentation(m) => &m.id,
                PresentProofV2::Ack(m) => &m.id,
                PresentProofV2::ProblemReport(m) => &m.id,
            },
            Self::DiscoverFeatures(msg) => match msg {
                DiscoverFeatures::V1(DiscoverFeaturesV1::Query(m)) => &m.id,
                DiscoverFeatures::V1(DiscoverFeaturesV1::Disclose(m)) => &m.id,
                DiscoverFeatures::V2(DiscoverFeaturesV2::Queries(m)) => &m.id,
                DiscoverFeatures::V2(DiscoverFeaturesV2::Disclosures(m)) => &m.id,
            },
            Self::DidRotate(msg) => match msg {
                DidRotate::Rotate(m) => &m.id,
                DidRotate::Ack(m) => &m.id,
                DidRotate::ProblemReport(m) => &m.id,
                DidRotate::Hangup(m) => &m.id,
            },
            Self::Notification(m) => &m.id,
            Self::ReportProblem(m) => &m.id,
        }
    }

    /// The `~thread` decorator, if the message carries one.
    pub fn thread(&self) -> Option<&Thread> {
        match self {
            Self::DidExchange(msg) => match msg {
                DidExchange::Request(m) => m.decorators.thread.as_ref(),
                DidExchange::Response(m) => Some(&m.decorators.thread),
                DidExchange::Complete(m) => Some(&m.decorators.thread),
                DidExchange::ProblemReport(m) => Some(&m.decorators.thread),
            },
            Self::OutOfBand(msg) => match msg {
                OutOfBand::Invitation(_) => None,
                OutOfBand::HandshakeReuse(m) => Some(&m.decorators.thread),
                OutOfBand::HandshakeReuseAccepted(m) => Some(&m.decorators.thread),
            },
            Self::CredentialIssuance(CredentialIssuance::V2(msg)) => match msg {
                CredentialIssuanceV2::ProposeCredential(m) => m.decorators.thread.as_ref(),
                CredentialIssuanceV2::OfferCredential(m) => m.decorators.thread.as_ref(),
                CredentialIssuanceV2::RequestCredential(m) => m.decorators.thread.as_ref(),
                CredentialIssuanceV2::IssueCredential(m) => Some(&m.decorators.thread),
                CredentialIssuanceV2::Ack(m) => Some(&m.decorators.thread),
                CredentialIssuanceV2::ProblemReport(m) => Some(&m.decorators.thread),
            },
            Self::PresentProof(PresentProof::V2(msg)) => match msg {
                PresentProofV2::ProposePresentation(m) => m.decorators.thread.as_ref(),
                PresentProofV2::RequestPresentation(m) => m.decorators.thread.as_ref(),
                PresentProofV2::Presentation(m) => Some(&m.decorators.thread),
                PresentProofV2::Ack(m) => Some(&m.decorators.thread),
                PresentProofV2::ProblemReport(m) => Some(&m.decorators.thread),
            },
            Self::DiscoverFeatures(msg) => match msg {
                DiscoverFeatures::V1(DiscoverFeaturesV1::Query(_)) => None,
                DiscoverFeatures::V1(DiscoverFeaturesV1::Disclose(m)) => Some(&m.decorators.thread),
                DiscoverFeatures::V2(DiscoverFeaturesV2::Queries(_)) => None,
                DiscoverFeatures::V2(DiscoverFeaturesV2::Disclosures(m)) => {
                    Some(&m.decorators.thread)
                }
            },
            Self::DidRotate(msg) => match msg {
                DidRotate::Rotate(m) => m.decorators.thread.as_ref(),
                DidRotate::Ack(m) => Some(&m.decorators.thread),
                DidRotate::ProblemReport(m) => Some(&m.decorators.thread),
                DidRotate::Hangup(_) => None,
            },
            Self::Notification(m) => Some(&m.decorators.thread),
            Self::ReportProblem(m) => Some(&m.decorators.thread),
        }
    }

    /// Thread id used to correlate the message with a protocol record.
    /// Messages starting a thread correlate on their own id.
    pub fn thread_id(&self) -> &str {
        self.thread()
            .and_then(|t| t.thid.as_deref())
            .unwrap_or_else(|| self.id())
    }

    /// Parent thread id, if the message carries one.
    pub fn parent_thread_id(&self) -> Option<&str> {
        self.thread().and_then(|t| t.pthid.as_deref())
    }

    /// The `~service` decorator, if the message carries one.
    pub fn service(&self) -> Option<&Service> {
        self.service_slot().and_then(|slot| slot.as_ref())
    }

    /// Attaches a `~service` decorator. Returns `false` for messages that
    /// never travel without a connection.
    pub fn set_service(&mut self, service: Service) -> bool {
        match self.service_slot_mut() {
            Some(slot) => {
                *slot = Some(service);
                true
            }
            None => false,
        }
    }

    fn service_slot(&self) -> Option<&Option<Service>> {
        match self {
            Self::CredentialIssuance(CredentialIssuance::V2(msg)) => match msg {
                CredentialIssuanceV2::ProposeCredential(m) => Some(&m.decorators.service),
                CredentialIssuanceV2::OfferCredential(m) => Some(&m.decorators.service),
                CredentialIssuanceV2::RequestCredential(m) => Some(&m.decorators.service),
                CredentialIssuanceV2::IssueCredential(m) => Some(&m.decorators.service),
                CredentialIssuanceV2::Ack(_) | CredentialIssuanceV2::ProblemReport(_) => None,
            },
            Self::PresentProof(PresentProof::V2(msg)) => match msg {
                PresentProofV2::ProposePresentation(m) => Some(&m.decorators.service),
                PresentProofV2::RequestPresentation(m) => Some(&m.decorators.service),
                PresentProofV2::Presentation(m) => Some(&m.decorators.service),
                PresentProofV2::Ack(_) | PresentProofV2::ProblemReport(_) => None,
            },
            _ => None,
        }
    }

    fn service_slot_mut(&mut self) -> Option<&mut Option<Service>> {
        match self {
            Self::CredentialIssuance(CredentialIssuance::V2(msg)) => match msg {
                CredentialIssuanceV2::ProposeCredential(m) => Some(&mut m.decorators.service),
                CredentialIssuanceV2::OfferCredential(m) => Some(&mut m.decorators.service),
                CredentialIssuanceV2::RequestCredential(m) => Some(&mut m.decorators.service),
                CredentialIssuanceV2::IssueCredential(m) => Some(&mut m.decorators.service),
                CredentialIssuanceV2::Ack(_) | CredentialIssuanceV2::ProblemReport(_) => None,
            },
            Self::PresentProof(PresentProof::V2(msg)) => match msg {
                PresentProofV2::ProposePresentation(m) => Some(&mut m.decorators.service),
                PresentProofV2::RequestPresentation(m) => Some(&mut m.decorators.service),
                PresentProofV2::Presentation(m) => Some(&mut m.decorators.service),
                PresentProofV2::Ack(_) | PresentProofV2::ProblemReport(_) => None,
            },
            _ => None,
        }
    }

    pub fn msg_type(&self) -> MessageType {
        DelayedSerde::msg_type(self)
    }
}

impl DelayedSerde for AriesMessage {
    fn delayed_deserialize(msg_type: &MessageType, value: Value) -> MsgTypeResult<Self> {
        match msg_type.protocol {
            Protocol::DidExchangeV1 => DidExchange::delayed_deserialize(msg_type, value).map(From::from),
            Protocol::OutOfBandV1 => OutOfBand::delayed_deserialize(msg_type, value).map(From::from),
            Protocol::CredentialIssuanceV2 => {
                CredentialIssuance::delayed_deserialize(msg_type, value).map(From::from)
            }
            Protocol::PresentProofV2 => {
                PresentProof::delayed_deserialize(msg_type, value).map(From::from)
            }
            Protocol::DiscoverFeaturesV1 | Protocol::DiscoverFeaturesV2 => {
                DiscoverFeatures::delayed_deserialize(msg_type, value).map(From::from)
            }
            Protocol::DidRotateV1 => DidRotate::delayed_deserialize(msg_type, value).map(From::from),
            Protocol::NotificationV1 => Ack::delayed_deserialize(msg_type, value).map(From::from),
            Protocol::ReportProblemV1 => {
                ProblemReport::delayed_deserialize(msg_type, value).map(From::from)
            }
        }
    }

    fn msg_type(&self) -> MessageType {
        match self {
            Self::DidExchange(v) => v.msg_type(),
            Self::OutOfBand(v) => v.msg_type(),
            Self::CredentialIssuance(v) => v.msg_type(),
            Self::PresentProof(v) => v.msg_type(),
            Self::DiscoverFeatures(v) => v.msg_type(),
            Self::DidRotate(v) => v.msg_type(),
            Self::Notification(v) => v.msg_type(),
            Self::ReportProblem(v) => v.msg_type(),
        }
    }

    fn delayed_serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::DidExchange(v) => v.delayed_serialize(serializer),
            Self::OutOfBand(v) => v.delayed_serialize(serializer),
            Self::CredentialIssuance(v) => v.delayed_serialize(serializer),
            Self::PresentProof(v) => v.delayed_serialize(serializer),
            Self::DiscoverFeatures(v) => v.delayed_serialize(serializer),
            Self::DidRotate(v) => v.delayed_serialize(serializer),
            Self::Notification(v) => v.delayed_serialize(serializer),
            Self::ReportProblem(v) => v.delayed_serialize(serializer),
        }
    }
}

/// Custom [`Deserialize`] impl for [`AriesMessage`] that uses the `@type` as
/// internal tag, but parses it into a [`MessageType`] first so that the minor
/// version and the legacy prefix are handled in one place.
///
/// The remaining fields are buffered into a [`Value`] and handed over to the
/// protocol enum matching the parsed type.
impl<'de> Deserialize<'de> for AriesMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for AriesMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.delayed_serialize(serializer)
    }
}
