use async_trait::async_trait;
use did_doc::schema::{did_doc::DidDocument, verification_method::VerificationMethod};
use did_resolver::{error::DidResolverError, traits::DidResolvable};
use public_key::KeyType;

use crate::DidKey;

#[derive(Debug, Default, Clone, Copy)]
pub struct DidKeyResolver;

impl DidKey {
    pub fn to_did_document(&self) -> DidDocument {
        let vm = VerificationMethod::multikey(self.key_id(), self.did.clone(), self.key());
        let builder = DidDocument::builder(self.did.clone()).add_verification_method(vm);
        match self.key().key_type() {
            KeyType::Ed25519 => builder
                .add_authentication_reference(self.key_id())
                .add_assertion_method_reference(self.key_id()),
            KeyType::X25519 => builder.add_key_agreement_reference(self.key_id()),
        }
        .build()
    }
}

#[async_trait]
impl DidResolvable for DidKeyResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolverError> {
        let did_key = DidKey::parse(did).map_err(|err| DidResolverError::ResolutionFailed {
            did: did.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(did_key.to_did_document())
    }
}
