use did_doc::schema::{
    did_doc::DidDocument,
    service::Service,
    verification_method::VerificationMethod,
};
use public_key::{Key, KeyType};
use serde_json::json;

const KEY_A: &str = "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K";

fn key_a() -> Key {
    Key::from_base58(KEY_A, KeyType::Ed25519).unwrap()
}

#[test]
fn recipient_keys_follow_references_and_did_keys() {
    let key = key_a();
    let did = "did:example:alice".to_string();
    let doc = DidDocument::builder(did.clone())
        .add_verification_method(VerificationMethod::ed25519_2018(
            format!("{did}#key-1"),
            did.clone(),
            &key,
        ))
        .add_authentication_reference("#key-1".into())
        .add_service(Service::new_didcomm_v1(
            "#inline-0".into(),
            "https://alice.example/didcomm".parse().unwrap(),
            vec!["#key-1".into(), key.to_did_key()],
            vec![],
        ))
        .build();

    assert_eq!(doc.recipient_keys().unwrap(), vec![key.clone()]);
    assert_eq!(doc.authentication_keys().unwrap(), vec![key]);
}

#[test]
fn unresolvable_reference_is_an_error() {
    let doc: DidDocument = serde_json::from_value(json!({
        "id": "did:example:bob",
        "service": [{
            "id": "#svc",
            "type": "did-communication",
            "serviceEndpoint": "https://bob.example/",
            "recipientKeys": ["#missing"]
        }]
    }))
    .unwrap();

    assert!(doc.recipient_keys().is_err());
}

#[test]
fn serialized_document_uses_camel_case() {
    let key = key_a();
    let doc = DidDocument::builder("did:example:carol".into())
        .add_authentication_method(VerificationMethod::ed25519_2018(
            "#key-1".into(),
            "did:example:carol".into(),
            &key,
        ))
        .build();
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["authentication"][0]["publicKeyBase58"], KEY_A);
    assert_eq!(value["@context"][0], "https://www.w3.org/ns/did/v1");
}
