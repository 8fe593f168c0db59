use did_doc::schema::{did_doc::DidDocument, verification_method::VerificationMethod};
use public_key::{Key, KeyType};

use crate::{error::DidPeerError, peer_did::method_specific_id};

/// `did:peer:0` wrapping a single inception key.
pub fn did_from_key(key: &Key) -> String {
    format!("did:peer:0{}", key.fingerprint())
}

pub fn resolve(did: &str) -> Result<DidDocument, DidPeerError> {
    let fingerprint = &method_specific_id(did)?[1..];
    let key = Key::from_fingerprint(fingerprint)?;
    let key_id = format!("{did}#{}", key.fingerprint());
    let builder = DidDocument::builder(did.to_owned()).add_verification_method(
        VerificationMethod::multikey(key_id.clone(), did.to_owned(), &key),
    );
    Ok(match key.key_type() {
        KeyType::Ed25519 => builder
            .add_authentication_reference(key_id.clone())
            .add_assertion_method_reference(key_id),
        KeyType::X25519 => builder.add_key_agreement_reference(key_id),
    }
    .build())
}
