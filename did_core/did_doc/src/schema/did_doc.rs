use public_key::Key;
use serde::{Deserialize, Serialize};

use super::{
    service::Service,
    verification_method::{VerificationMethod, VerificationMethodKind},
};
use crate::error::DidDocumentError;

pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", skip_serializing_if = "Vec::is_empty")]
    context: Vec<String>,
    id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    also_known_as: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    verification_method: Vec<VerificationMethod>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authentication: Vec<VerificationMethodKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assertion_method: Vec<VerificationMethodKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    key_agreement: Vec<VerificationMethodKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    service: Vec<Service>,
}

impl DidDocument {
    pub fn builder(id: String) -> DidDocumentBuilder {
        DidDocumentBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn also_known_as(&self) -> &[String] {
        &self.also_known_as
    }

    pub fn add_also_known_as(&mut self, also_known_as: String) {
        if !self.also_known_as.contains(&also_known_as) {
            self.also_known_as.push(also_known_as);
        }
    }

    pub fn verification_method(&self) -> &[VerificationMethod] {
        &self.verification_method
    }

    pub fn authentication(&self) -> &[VerificationMethodKind] {
        &self.authentication
    }

    pub fn assertion_method(&self) -> &[VerificationMethodKind] {
        &self.assertion_method
    }

    pub fn key_agreement(&self) -> &[VerificationMethodKind] {
        &self.key_agreement
    }

    pub fn service(&self) -> &[Service] {
        &self.service
    }

    pub fn didcomm_services(&self) -> Vec<&Service> {
        let mut services: Vec<&Service> = self.service.iter().filter(|s| s.is_didcomm()).collect();
        services.sort_by_key(|s| s.priority().unwrap_or(u32::MAX));
        services
    }

    /// Looks a verification method up by full id or by fragment, so `#key-1`
    /// and `did:peer:...#key-1` both resolve.
    pub fn dereference_key(&self, reference: &str) -> Option<&VerificationMethod> {
        let fragment = reference.split_once('#').map(|(_, f)| f);
        self.all_verification_methods().find(|vm| {
            vm.id() == reference || (fragment.is_some() && vm.fragment() == fragment)
        })
    }

    pub fn resolve_verification_method<'a>(
        &'a self,
        kind: &'a VerificationMethodKind,
    ) -> Result<&'a VerificationMethod, DidDocumentError> {
        match kind {
            VerificationMethodKind::Resolved(vm) => Ok(vm),
            VerificationMethodKind::Resolvable(reference) => self
                .dereference_key(reference)
                .ok_or_else(|| DidDocumentError::UnresolvableReference(reference.clone())),
        }
    }

    pub fn authentication_keys(&self) -> Result<Vec<Key>, DidDocumentError> {
        self.authentication
            .iter()
            .map(|kind| self.resolve_verification_method(kind)?.public_key())
            .collect()
    }

    /// Keys messages to this DID are encrypted for, taken from its DIDComm
    /// services in priority order, without duplicates.
    pub fn recipient_keys(&self) -> Result<Vec<Key>, DidDocumentError> {
        let mut keys: Vec<Key> = Vec::new();
        for service in self.didcomm_services() {
            for reference in service.recipient_keys() {
                let key = self.resolve_key_reference(reference)?;
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    pub fn routing_keys(&self) -> Result<Vec<Key>, DidDocumentError> {
        self.didcomm_services()
            .into_iter()
            .flat_map(|service| service.routing_keys().iter())
            .map(|reference| self.resolve_key_reference(reference))
            .collect()
    }

    fn resolve_key_reference(&self, reference: &str) -> Result<Key, DidDocumentError> {
        if reference.starts_with("did:key:") {
            return Ok(Key::from_did_key(reference)?);
        }
        self.dereference_key(reference)
            .ok_or_else(|| DidDocumentError::UnresolvableReference(reference.to_owned()))?
            .public_key()
    }

    fn all_verification_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        let embedded = self
            .authentication
            .iter()
            .chain(self.assertion_method.iter())
            .chain(self.key_agreement.iter())
            .filter_map(|kind| match kind {
                VerificationMethodKind::Resolved(vm) => Some(vm),
                VerificationMethodKind::Resolvable(_) => None,
            });
        self.verification_method.iter().chain(embedded)
    }
}

#[derive(Default, Debug)]
pub struct DidDocumentBuilder {
    id: String,
    also_known_as: Vec<String>,
    verification_method: Vec<VerificationMethod>,
    authentication: Vec<VerificationMethodKind>,
    assertion_method: Vec<VerificationMethodKind>,
    key_agreement: Vec<VerificationMethodKind>,
    service: Vec<Service>,
}

impl DidDocumentBuilder {
    pub fn new(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn add_also_known_as(mut self, also_known_as: String) -> Self {
        self.also_known_as.push(also_known_as);
        self
    }

    pub fn add_verification_method(mut self, verification_method: VerificationMethod) -> Self {
        self.verification_method.push(verification_method);
        self
    }

    pub fn add_authentication_method(mut self, method: VerificationMethod) -> Self {
        self.authentication
            .push(VerificationMethodKind::Resolved(method));
        self
    }

    pub fn add_authentication_reference(mut self, reference: String) -> Self {
        self.authentication
            .push(VerificationMethodKind::Resolvable(reference));
        self
    }

    pub fn add_assertion_method_reference(mut self, reference: String) -> Self {
        self.assertion_method
            .push(VerificationMethodKind::Resolvable(reference));
        self
    }

    pub fn add_key_agreement(mut self, method: VerificationMethod) -> Self {
        self.key_agreement
            .push(VerificationMethodKind::Resolved(method));
        self
    }

    pub fn add_key_agreement_reference(mut self, reference: String) -> Self {
        self.key_agreement
            .push(VerificationMethodKind::Resolvable(reference));
        self
    }

    pub fn add_service(mut self, service: Service) -> Self {
        self.service.push(service);
        self
    }

    pub fn build(self) -> DidDocument {
        DidDocument {
            context: vec![DID_V1_CONTEXT.to_owned()],
            id: self.id,
            also_known_as: self.also_known_as,
            verification_method: self.verification_method,
            authentication: self.authentication,
            assertion_method: self.assertion_method,
            key_agreement: self.key_agreement,
            service: self.service,
        }
    }
}
