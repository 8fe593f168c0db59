use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use url::Url;

/// Struct representing the `~service` decorator from its [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0056-service-decorator/README.md>).
///
/// Lets a message travel without a connection: the receiver answers to the
/// endpoint and keys carried here.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Base58 encoded verification keys.
    pub recipient_keys: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routing_keys: Vec<String>,
    pub service_endpoint: Url,
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    pub fn make_minimal_service() -> Service {
        Service::builder()
            .recipient_keys(vec!["8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K".to_owned()])
            .service_endpoint("https://agent.example.com/".parse().unwrap())
            .build()
    }

    #[test]
    fn test_minimal_service() {
        let expected = json!({
            "recipientKeys": ["8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K"],
            "serviceEndpoint": "https://agent.example.com/"
        });
        test_utils::test_serde(make_minimal_service(), expected);
    }

    #[test]
    fn test_service_with_routing_keys() {
        let service = Service::builder()
            .recipient_keys(vec!["8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K".to_owned()])
            .routing_keys(vec!["9b5Jq1gkHcWkoUeo8H7GFrpNnnAqbGAU3RcUU5N8HWi7".to_owned()])
            .service_endpoint("https://mediator.example.com/".parse().unwrap())
            .build();
        let expected = json!({
            "recipientKeys": ["8HH5gYEeNc3z7PYXmd54d4x6qAfCNrqQqEB3nS7Zfu7K"],
            "routingKeys": ["9b5Jq1gkHcWkoUeo8H7GFrpNnnAqbGAU3RcUU5N8HWi7"],
            "serviceEndpoint": "https://mediator.example.com/"
        });
        test_utils::test_serde(service, expected);
    }
}
