//! Genesis document peer DIDs. The DID is derived from the document itself,
//! so a numalgo 1 DID can only be resolved from a document that was handed
//! over together with it.

use did_doc::schema::did_doc::DidDocument;
use serde_json::Value;

use super::multihash_sha256_base58;
use crate::{
    error::DidPeerError,
    peer_did::{num_algo_from_peer_did, PeerDidNumAlgo},
};

/// Computes the DID over the document serialized without its `id`, then
/// returns it together with the document carrying that id.
pub fn create(mut did_document: DidDocument) -> Result<(String, DidDocument), DidPeerError> {
    let did = did_for_document(&did_document)?;
    did_document.set_id(did.clone());
    Ok((did, did_document))
}

pub fn did_for_document(did_document: &DidDocument) -> Result<String, DidPeerError> {
    let mut value = serde_json::to_value(did_document)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    let stored_variant = serde_json::to_vec(&value)?;
    Ok(format!(
        "did:peer:1{}",
        multihash_sha256_base58(&stored_variant)
    ))
}

/// Checks that an attached document really is the genesis document of `did`.
pub fn verify_genesis_document(did: &str, did_document: &DidDocument) -> Result<(), DidPeerError> {
    if num_algo_from_peer_did(did)? != PeerDidNumAlgo::GenesisDoc {
        return Err(DidPeerError::DidValidationError(format!(
            "{did} is not a genesis document DID"
        )));
    }
    if did_document.id() != did {
        return Err(DidPeerError::DidValidationError(format!(
            "Document id {} does not match {did}",
            did_document.id()
        )));
    }
    let expected = did_for_document(did_document)?;
    if expected != did {
        return Err(DidPeerError::HashMismatch(did.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use did_doc::schema::verification_method::VerificationMethod;
    use public_key::{Key, KeyType};

    use super::*;
    use crate::is_valid_peer_did;

    fn doc() -> DidDocument {
        let key = Key::from_base58(
            "8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K",
            KeyType::Ed25519,
        )
        .unwrap();
        DidDocument::builder(String::new())
            .add_authentication_method(VerificationMethod::ed25519_2018(
                "#key-1".into(),
                "#id".into(),
                &key,
            ))
            .build()
    }

    #[test]
    fn genesis_did_is_stable_and_verifiable() {
        let (did, document) = create(doc()).unwrap();
        assert!(did.starts_with("did:peer:1zQm"));
        assert!(is_valid_peer_did(&did));
        assert_eq!(document.id(), did);
        verify_genesis_document(&did, &document).unwrap();

        let (again, _) = create(doc()).unwrap();
        assert_eq!(did, again);
    }

    #[test]
    fn tampered_document_fails_verification() {
        let (did, document) = create(doc()).unwrap();
        let tampered = DidDocument::builder(did.clone())
            .add_also_known_as("did:example:mallory".into())
            .build();
        assert!(verify_genesis_document(&did, &tampered).is_err());
        assert!(verify_genesis_document(&did, &document).is_ok());
    }
}
