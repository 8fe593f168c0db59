//! Short form and long form peer DIDs: `did:peer:4{hash}:{encoded document}`
//! and `did:peer:4{hash}`. Only the long form carries enough to resolve.

use did_doc::schema::did_doc::DidDocument;
use serde_json::Value;

use super::multihash_sha256_base58;
use crate::{error::DidPeerError, peer_did::method_specific_id};

const MULTICODEC_JSON: u64 = 0x0200;

/// Encodes `did_document` (its `id` is ignored) and returns the long and the
/// short form DIDs.
pub fn create(did_document: &DidDocument) -> Result<(String, String), DidPeerError> {
    let mut value = serde_json::to_value(did_document)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    let mut buffer = [0u8; 10];
    let mut prefixed = unsigned_varint::encode::u64(MULTICODEC_JSON, &mut buffer).to_vec();
    prefixed.extend_from_slice(&serde_json::to_vec(&value)?);

    let encoded_document = multibase::encode(multibase::Base::Base58Btc, prefixed);
    let hash = multihash_sha256_base58(encoded_document.as_bytes());
    Ok((
        format!("did:peer:4{hash}:{encoded_document}"),
        format!("did:peer:4{hash}"),
    ))
}

pub fn is_long_form(did: &str) -> bool {
    method_specific_id(did).is_ok_and(|id| id.contains(':'))
}

pub fn short_form(did: &str) -> Result<String, DidPeerError> {
    let id = method_specific_id(did)?;
    let hash = id.split(':').next().unwrap_or(id);
    Ok(format!("did:peer:{hash}"))
}

pub fn resolve(did: &str) -> Result<DidDocument, DidPeerError> {
    let id = method_specific_id(did)?;
    let (hash, encoded_document) = id[1..].split_once(':').ok_or_else(|| {
        DidPeerError::DidValidationError(format!(
            "{did} is a short form DID, the long form is required to resolve it"
        ))
    })?;
    if multihash_sha256_base58(encoded_document.as_bytes()) != hash {
        return Err(DidPeerError::HashMismatch(did.to_owned()));
    }

    let (_, prefixed) = multibase::decode(encoded_document)?;
    let (codec, document_bytes) = unsigned_varint::decode::u64(&prefixed)?;
    if codec != MULTICODEC_JSON {
        return Err(DidPeerError::DidValidationError(format!(
            "Unexpected multicodec {codec:#x} in {did}"
        )));
    }
    let mut document: DidDocument = serde_json::from_slice(document_bytes)?;
    document.set_id(did.to_owned());
    document.add_also_known_as(short_form(did)?);
    Ok(document)
}
