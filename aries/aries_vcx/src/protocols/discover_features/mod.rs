//! Discover features 1.0 and 2.0: asking a peer which protocols and goal
//! codes it supports, and answering such questions from a
//! [`registry::FeatureRegistry`].

pub mod protocol;
pub mod registry;
pub mod v1;
pub mod v2;

use messages::msg_fields::protocols::discover_features::v2::{FeatureDisclosure, FeatureQuery};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use self::{
    protocol::{DiscoverFeaturesProtocol, QueryOptions},
    registry::FeatureRegistry,
    v1::DiscoverFeaturesV1Protocol,
    v2::DiscoverFeaturesV2Protocol,
};
use super::record::{ExchangeRecord, RecordData, RecordRole, RecordState};

pub const DISCOVER_FEATURES_V1: &str = "v1";
pub const DISCOVER_FEATURES_V2: &str = "v2";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DiscoverFeaturesState {
    QuerySent,
    QueryReceived,
    DisclosureSent,
    DisclosureReceived,
    Abandoned,
}

impl RecordState for DiscoverFeaturesState {
    const ABANDONED: Self = Self::Abandoned;

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DisclosureSent | Self::DisclosureReceived | Self::Abandoned
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscoverFeaturesRole {
    Requester,
    Responder,
}

impl RecordRole for DiscoverFeaturesRole {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverFeaturesData {
    #[serde(default)]
    pub queries: Vec<FeatureQuery>,
    #[serde(default)]
    pub disclosures: Vec<FeatureDisclosure>,
}

impl RecordData for DiscoverFeaturesData {
    const CATEGORY: &'static str = "discover_features";
}

pub type DiscoverFeaturesRecord =
    ExchangeRecord<DiscoverFeaturesState, DiscoverFeaturesRole, DiscoverFeaturesData>;
