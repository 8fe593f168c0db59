use std::collections::HashMap;

use lazy_static::lazy_static;
use strum::IntoEnumIterator;

use super::{
    protocols::{
        cred_issuance::CredentialIssuanceKind,
        did_exchange::DidExchangeKind,
        did_rotate::DidRotateKind,
        discover_features::{DiscoverFeaturesV1Kind, DiscoverFeaturesV2Kind},
        notification::NotificationKind,
        out_of_band::OutOfBandKind,
        present_proof::PresentProofKind,
        report_problem::ReportProblemKind,
    },
    MessageKind, MessageType, Protocol,
};

fn standalone_types<K>() -> Vec<MessageType>
where
    K: MessageKind + IntoEnumIterator,
{
    K::iter().map(|kind| kind.msg_type()).collect()
}

lazy_static! {
    /// Every standalone message type this crate can deserialize, per protocol.
    pub static ref PROTOCOL_REGISTRY: HashMap<Protocol, Vec<MessageType>> = {
        let mut registry = HashMap::new();
        registry.insert(Protocol::DidExchangeV1, standalone_types::<DidExchangeKind>());
        registry.insert(Protocol::OutOfBandV1, standalone_types::<OutOfBandKind>());
        registry.insert(
            Protocol::CredentialIssuanceV2,
            CredentialIssuanceKind::iter()
                .filter(|kind| *kind != CredentialIssuanceKind::CredentialPreview)
                .map(|kind| kind.msg_type())
                .collect(),
        );
        registry.insert(Protocol::PresentProofV2, standalone_types::<PresentProofKind>());
        registry.insert(Protocol::DiscoverFeaturesV1, standalone_types::<DiscoverFeaturesV1Kind>());
        registry.insert(Protocol::DiscoverFeaturesV2, standalone_types::<DiscoverFeaturesV2Kind>());
        registry.insert(Protocol::DidRotateV1, standalone_types::<DidRotateKind>());
        registry.insert(Protocol::NotificationV1, standalone_types::<NotificationKind>());
        registry.insert(Protocol::ReportProblemV1, standalone_types::<ReportProblemKind>());
        registry
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_protocol() {
        for protocol in Protocol::iter() {
            assert!(!PROTOCOL_REGISTRY[&protocol].is_empty(), "{protocol}");
        }
    }

    #[test]
    fn test_credential_preview_is_not_standalone() {
        let preview = CredentialIssuanceKind::CredentialPreview.msg_type();
        assert!(!PROTOCOL_REGISTRY[&Protocol::CredentialIssuanceV2].contains(&preview));
    }
}
