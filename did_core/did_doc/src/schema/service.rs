use serde::{Deserialize, Serialize};
use url::Url;

pub const SERVICE_TYPE_DIDCOMM_V1: &str = "did-communication";
pub const SERVICE_TYPE_INDY_AGENT: &str = "IndyAgent";
pub const SERVICE_TYPE_DIDCOMM_V2: &str = "DIDCommMessaging";

/// DIDComm service entry. Recipient and routing keys are either `did:key`
/// URIs or references to verification methods of the owning document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    id: String,
    #[serde(rename = "type")]
    service_type: String,
    service_endpoint: Url,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    recipient_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    routing_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    accept: Vec<String>,
}

impl Service {
    pub fn new_didcomm_v1(
        id: String,
        service_endpoint: Url,
        recipient_keys: Vec<String>,
        routing_keys: Vec<String>,
    ) -> Self {
        Self {
            id,
            service_type: SERVICE_TYPE_DIDCOMM_V1.to_owned(),
            service_endpoint,
            recipient_keys,
            routing_keys,
            priority: Some(0),
            accept: vec!["didcomm/aip1".to_owned(), "didcomm/aip2;env=rfc19".to_owned()],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn service_endpoint(&self) -> &Url {
        &self.service_endpoint
    }

    pub fn recipient_keys(&self) -> &[String] {
        &self.recipient_keys
    }

    pub fn routing_keys(&self) -> &[String] {
        &self.routing_keys
    }

    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    pub fn is_didcomm_v1(&self) -> bool {
        self.service_type == SERVICE_TYPE_DIDCOMM_V1 || self.service_type == SERVICE_TYPE_INDY_AGENT
    }

    pub fn is_didcomm(&self) -> bool {
        self.is_didcomm_v1() || self.service_type == SERVICE_TYPE_DIDCOMM_V2
    }
}
