use derive_more::From;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::{DiscoverFeatures, FeatureType};
use crate::{
    decorators::{thread::Thread, timing::Timing},
    misc::utils::transit_to_aries_msg,
    msg_fields::traits::delayed_serde_for_protocol,
    msg_parts::MsgParts,
    msg_types::DiscoverFeaturesV2Kind,
};

#[derive(Clone, Debug, From, PartialEq)]
pub enum DiscoverFeaturesV2 {
    Queries(Queries),
    Disclosures(Disclosures),
}

delayed_serde_for_protocol!(DiscoverFeaturesV2, DiscoverFeaturesV2Kind, {
    Queries => Queries,
    Disclosures => Disclosures,
});

transit_to_aries_msg!(Queries, DiscoverFeaturesV2, DiscoverFeatures);
transit_to_aries_msg!(Disclosures, DiscoverFeaturesV2, DiscoverFeatures);

pub type Queries = MsgParts<QueriesContent, QueriesDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct QueriesContent {
    pub queries: Vec<FeatureQuery>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FeatureQuery {
    #[serde(rename = "feature-type")]
    pub feature_type: FeatureType,
    #[serde(rename = "match")]
    pub match_: String,
}

impl FeatureQuery {
    pub fn new(feature_type: FeatureType, match_: impl Into<String>) -> Self {
        Self {
            feature_type,
            match_: match_.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, TypedBuilder)]
pub struct QueriesDecorators {
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

pub type Disclosures = MsgParts<DisclosuresContent, DisclosuresDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct DisclosuresContent {
    pub disclosures: Vec<FeatureDisclosure>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct FeatureDisclosure {
    #[serde(rename = "feature-type")]
    pub feature_type: FeatureType,
    pub id: String,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct DisclosuresDecorators {
    #[serde(rename = "~thread")]
    pub thread: Thread,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "~timing")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}
