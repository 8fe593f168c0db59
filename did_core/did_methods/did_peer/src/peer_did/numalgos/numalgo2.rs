//! Multiple inception keys without a document: keys and services are encoded
//! in the DID itself as `.`-separated, purpose-prefixed elements.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use did_doc::schema::{
    did_doc::{DidDocument, DidDocumentBuilder},
    service::{Service, SERVICE_TYPE_DIDCOMM_V2},
    verification_method::VerificationMethod,
};
use public_key::Key;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::DidPeerError, peer_did::method_specific_id};

const ABBREVIATED_DIDCOMM_V2: &str = "dm";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ElementPurpose {
    Assertion,
    Encryption,
    Verification,
    Service,
}

impl ElementPurpose {
    fn as_char(self) -> char {
        match self {
            Self::Assertion => 'A',
            Self::Encryption => 'E',
            Self::Verification => 'V',
            Self::Service => 'S',
        }
    }
}

impl TryFrom<char> for ElementPurpose {
    type Error = DidPeerError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'A' => Ok(Self::Assertion),
            'E' => Ok(Self::Encryption),
            'V' => Ok(Self::Verification),
            'S' => Ok(Self::Service),
            c => Err(DidPeerError::UnsupportedPurpose(c)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct ServiceAbbreviated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "t")]
    service_type: String,
    #[serde(rename = "s")]
    service_endpoint: Url,
    #[serde(rename = "recipientKeys", default, skip_serializing_if = "Vec::is_empty")]
    recipient_keys: Vec<String>,
    #[serde(rename = "r", default, skip_serializing_if = "Vec::is_empty")]
    routing_keys: Vec<String>,
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    accept: Vec<String>,
}

fn abbreviate_service(service: &Service) -> ServiceAbbreviated {
    let service_type = if service.service_type() == SERVICE_TYPE_DIDCOMM_V2 {
        ABBREVIATED_DIDCOMM_V2.to_owned()
    } else {
        service.service_type().to_owned()
    };
    ServiceAbbreviated {
        id: Some(service.id().to_owned()),
        service_type,
        service_endpoint: service.service_endpoint().clone(),
        recipient_keys: service.recipient_keys().to_vec(),
        routing_keys: service.routing_keys().to_vec(),
        accept: service.accept().to_vec(),
    }
}

fn expand_service(abbreviated: ServiceAbbreviated, index: usize) -> Result<Service, DidPeerError> {
    let id = abbreviated.id.unwrap_or_else(|| match index {
        0 => "#service".to_owned(),
        n => format!("#service-{n}"),
    });
    let service_type = if abbreviated.service_type == ABBREVIATED_DIDCOMM_V2 {
        SERVICE_TYPE_DIDCOMM_V2.to_owned()
    } else {
        abbreviated.service_type
    };
    let service: Service = serde_json::from_value(serde_json::json!({
        "id": id,
        "type": service_type,
        "serviceEndpoint": abbreviated.service_endpoint,
        "recipientKeys": abbreviated.recipient_keys,
        "routingKeys": abbreviated.routing_keys,
        "accept": abbreviated.accept,
    }))
    .map_err(|err| DidPeerError::InvalidService(err.to_string()))?;
    Ok(service)
}

/// Encodes authentication keys (`V`), key agreement keys (`E`) and services
/// (`S`) into a `did:peer:2`.
pub fn create(
    authentication: &[Key],
    key_agreement: &[Key],
    services: &[Service],
) -> Result<String, DidPeerError> {
    let mut did = String::from("did:peer:2");
    for key in key_agreement {
        append_key(&mut did, ElementPurpose::Encryption, key);
    }
    for key in authentication {
        append_key(&mut did, ElementPurpose::Verification, key);
    }
    for service in services {
        let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&abbreviate_service(service))?);
        did.push('.');
        did.push(ElementPurpose::Service.as_char());
        did.push_str(&encoded);
    }
    Ok(did)
}

fn append_key(did: &mut String, purpose: ElementPurpose, key: &Key) {
    did.push('.');
    did.push(purpose.as_char());
    did.push_str(&key.fingerprint());
}

fn decode_service_element(element: &str) -> Result<Vec<u8>, DidPeerError> {
    URL_SAFE_NO_PAD
        .decode(element)
        .or_else(|_| STANDARD_NO_PAD.decode(element.trim_end_matches('=')))
        .map_err(DidPeerError::from)
}

pub fn resolve(did: &str) -> Result<DidDocument, DidPeerError> {
    let id = method_specific_id(did)?;
    let mut builder = DidDocumentBuilder::new(did.to_owned());
    let mut key_index = 1;
    let mut service_index = 0;

    for element in id.split('.').skip(1) {
        let mut chars = element.chars();
        let purpose: ElementPurpose = chars
            .next()
            .ok_or_else(|| {
                DidPeerError::DidValidationError(format!("Empty element in {did}"))
            })?
            .try_into()?;
        let body = chars.as_str();

        builder = match purpose {
            ElementPurpose::Service => {
                let abbreviated: ServiceAbbreviated =
                    serde_json::from_slice(&decode_service_element(body)?)?;
                let service = expand_service(abbreviated, service_index)?;
                service_index += 1;
                builder.add_service(service)
            }
            key_purpose => {
                let key = Key::from_fingerprint(body)?;
                let key_id = format!("#key-{key_index}");
                key_index += 1;
                let builder = builder.add_verification_method(VerificationMethod::multikey(
                    key_id.clone(),
                    did.to_owned(),
                    &key,
                ));
                match key_purpose {
                    ElementPurpose::Encryption => builder.add_key_agreement_reference(key_id),
                    ElementPurpose::Assertion => builder.add_assertion_method_reference(key_id),
                    _ => builder.add_authentication_reference(key_id),
                }
            }
        };
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use did_doc::schema::service::Service;
    use public_key::KeyType;

    use super::*;

    fn key() -> Key {
        Key::from_base58(
            "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K",
            KeyType::Ed25519,
        )
        .unwrap()
    }

    #[test]
    fn service_and_keys_survive_resolution() {
        let key = key();
        let service = Service::new_didcomm_v1(
            "#inline-0".into(),
            "https://agent.example/didcomm".parse().unwrap(),
            vec![key.to_did_key()],
            vec![],
        );
        let did = create(&[key.clone()], &[], &[service]).unwrap();
        assert!(crate::is_valid_peer_did(&did));

        let doc = resolve(&did).unwrap();
        assert_eq!(doc.id(), did);
        assert_eq!(doc.authentication_keys().unwrap(), vec![key.clone()]);
        assert_eq!(doc.recipient_keys().unwrap(), vec![key]);
        assert_eq!(doc.service()[0].id(), "#inline-0");
    }

    #[test]
    fn unknown_purpose_is_rejected() {
        let did = format!("did:peer:2.X{}", key().fingerprint());
        assert!(matches!(
            resolve(&did),
            Err(DidPeerError::UnsupportedPurpose('X'))
        ));
    }
}
