use std::sync::Arc;

use aries_vcx_wallet::wallet::{base_wallet::DidWallet, memory::InMemoryWallet};
use did_doc::schema::{
    did_doc::DidDocument, service::Service, verification_method::VerificationMethod,
};
use public_key::Key;
use url::Url;

use crate::{
    errors::error::{TestUtilsError, TestUtilsResult},
    logger::init_logger,
};

/// Fresh wallet with logging initialised.
pub fn dev_build_in_memory_wallet() -> Arc<InMemoryWallet> {
    init_logger();
    Arc::new(InMemoryWallet::new())
}

/// Wallet pre-loaded with the key derived from `seed`.
pub async fn dev_build_seeded_wallet(seed: &str) -> TestUtilsResult<(Arc<InMemoryWallet>, Key)> {
    let wallet = dev_build_in_memory_wallet();
    let key = wallet
        .create_key(Some(seed))
        .await
        .map_err(|err| TestUtilsError::SetupError(err.to_string()))?;
    Ok((wallet, key))
}

/// DID document with one Ed25519 authentication key and one DIDComm service
/// using that key as recipient key.
pub fn dev_did_document(did: &str, key: &Key, endpoint: &str) -> TestUtilsResult<DidDocument> {
    let endpoint =
        Url::parse(endpoint).map_err(|err| TestUtilsError::SetupError(err.to_string()))?;
    let vm_id = format!("{did}#key-1");
    let method = VerificationMethod::ed25519_2018(vm_id.clone(), did.to_owned(), key);
    let service = Service::new_didcomm_v1(
        format!("{did}#didcomm-1"),
        endpoint,
        vec![key.to_did_key()],
        vec![],
    );
    Ok(DidDocument::builder(did.to_owned())
        .add_verification_method(method)
        .add_authentication_reference(vm_id)
        .add_service(service)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ALICE_ENDPOINT, ALICE_SEED};

    #[tokio::test]
    async fn test_seeded_document_exposes_recipient_key() {
        let (_wallet, key) = dev_build_seeded_wallet(ALICE_SEED).await.unwrap();
        let doc = dev_did_document("did:example:alice", &key, ALICE_ENDPOINT).unwrap();

        assert_eq!(doc.recipient_keys().unwrap(), vec![key.clone()]);
        assert_eq!(doc.authentication_keys().unwrap(), vec![key]);
    }
}
