use did_peer::PeerDidNumAlgo;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::DEFAULT_EVENT_CHANNEL_CAPACITY,
    protocols::auto_accept::AutoAcceptPolicy,
};

fn default_peer_num_algo() -> PeerDidNumAlgo {
    PeerDidNumAlgo::ShortFormAndLongForm
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn default_true() -> bool {
    true
}

/// Agent wide settings. Only the label and the endpoint have no default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct AgentConfig {
    #[builder(setter(into))]
    pub label: String,
    /// Where peers deliver messages to this agent.
    pub endpoint: Url,
    #[serde(default)]
    #[builder(default)]
    pub auto_accept_connections: bool,
    #[serde(default)]
    #[builder(default)]
    pub auto_accept_credentials: AutoAcceptPolicy,
    #[serde(default)]
    #[builder(default)]
    pub auto_accept_proofs: AutoAcceptPolicy,
    #[serde(default = "default_peer_num_algo")]
    #[builder(default = default_peer_num_algo())]
    pub peer_num_algo_for_did_exchange: PeerDidNumAlgo,
    #[serde(default = "default_peer_num_algo")]
    #[builder(default = default_peer_num_algo())]
    pub peer_num_algo_for_did_rotation: PeerDidNumAlgo,
    #[serde(default = "default_event_channel_capacity")]
    #[builder(default = default_event_channel_capacity())]
    pub event_channel_capacity: usize,
    #[serde(default = "default_true")]
    #[builder(default = true)]
    pub auto_respond_discover_features: bool,
}

impl AgentConfig {
    pub fn from_json(json: &str) -> VcxResult<Self> {
        serde_json::from_str(json).map_err(|err| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidJson,
                format!("Cannot read agent config: {err}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let config =
            AgentConfig::from_json(r#"{"label":"alice","endpoint":"http://alice.example.org/didcomm"}"#)
                .unwrap();
        let expected = AgentConfig::builder()
            .label("alice")
            .endpoint(Url::parse("http://alice.example.org/didcomm").unwrap())
            .build();
        assert_eq!(config, expected);
        assert_eq!(config.auto_accept_credentials, AutoAcceptPolicy::Never);
        assert_eq!(config.event_channel_capacity, DEFAULT_EVENT_CHANNEL_CAPACITY);
        assert!(config.auto_respond_discover_features);
    }

    #[test]
    fn test_from_json_reads_policies() {
        let config = AgentConfig::from_json(
            r#"{
                "label": "faber",
                "endpoint": "http://faber.example.org/",
                "auto_accept_connections": true,
                "auto_accept_credentials": "contentApproved",
                "auto_accept_proofs": "always",
                "peer_num_algo_for_did_rotation": "MultipleInceptionKeyWithoutDoc"
            }"#,
        )
        .unwrap();
        assert!(config.auto_accept_connections);
        assert_eq!(config.auto_accept_credentials, AutoAcceptPolicy::ContentApproved);
        assert_eq!(config.auto_accept_proofs, AutoAcceptPolicy::Always);
        assert_eq!(
            config.peer_num_algo_for_did_rotation,
            PeerDidNumAlgo::MultipleInceptionKeyWithoutDoc
        );
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let err = AgentConfig::from_json(r#"{"label":"alice"}"#).unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::InvalidJson);
    }
}
