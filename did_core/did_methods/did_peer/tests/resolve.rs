use did_doc::schema::{did_doc::DidDocument, service::Service};
use did_peer::{
    peer_did::numalgos::{numalgo0, numalgo1, numalgo2, numalgo4},
    resolver::PeerDidResolver,
};
use did_resolver::{error::DidResolverError, traits::DidResolvable};
use pretty_assertions::assert_eq;
use public_key::{Key, KeyType};

fn key() -> Key {
    Key::from_base58(
        "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K",
        KeyType::Ed25519,
    )
    .unwrap()
}

fn service() -> Service {
    Service::new_didcomm_v1(
        "#inline-0".into(),
        "https://agent.example/didcomm".parse().unwrap(),
        vec![key().to_did_key()],
        vec![],
    )
}

#[tokio::test]
async fn resolves_numalgo0() {
    let did = numalgo0::did_from_key(&key());
    let doc = PeerDidResolver::new().resolve(&did).await.unwrap();
    assert_eq!(doc.id(), did);
    assert_eq!(doc.authentication_keys().unwrap(), vec![key()]);
}

#[tokio::test]
async fn resolves_numalgo2() {
    let did = numalgo2::create(&[key()], &[], &[service()]).unwrap();
    let doc = PeerDidResolver::new().resolve(&did).await.unwrap();
    assert_eq!(doc.recipient_keys().unwrap(), vec![key()]);
}

#[tokio::test]
async fn resolves_numalgo4_long_form_only() {
    let doc = DidDocument::builder(String::new())
        .add_service(service())
        .build();
    let (long, short) = numalgo4::create(&doc).unwrap();

    let resolved = PeerDidResolver::new().resolve(&long).await.unwrap();
    assert_eq!(resolved.id(), long);
    assert_eq!(resolved.also_known_as(), [short.clone()]);

    assert!(matches!(
        PeerDidResolver::new().resolve(&short).await,
        Err(DidResolverError::RequiresAttachedDocument { .. })
    ));
}

#[tokio::test]
async fn numalgo1_requires_attached_document() {
    let doc = DidDocument::builder(String::new())
        .add_service(service())
        .build();
    let (did, _) = numalgo1::create(doc).unwrap();
    assert!(matches!(
        PeerDidResolver::new().resolve(&did).await,
        Err(DidResolverError::RequiresAttachedDocument { .. })
    ));
}

#[tokio::test]
async fn rejects_unsupported_numalgo() {
    let did = format!("did:peer:3{}", key().fingerprint());
    assert!(matches!(
        PeerDidResolver::new().resolve(&did).await,
        Err(DidResolverError::ResolutionFailed { .. })
    ));
}
