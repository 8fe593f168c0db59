use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::Protocol;
use crate::msg_types::MessageKind;

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum DiscoverFeaturesV1Kind {
    Query,
    Disclose,
}

impl MessageKind for DiscoverFeaturesV1Kind {
    fn protocol() -> Protocol {
        Protocol::DiscoverFeaturesV1
    }
}

#[derive(Copy, Clone, Debug, AsRefStr, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum DiscoverFeaturesV2Kind {
    Queries,
    Disclosures,
}

impl MessageKind for DiscoverFeaturesV2Kind {
    fn protocol() -> Protocol {
        Protocol::DiscoverFeaturesV2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_belong_to_their_major_version() {
        assert_eq!(
            DiscoverFeaturesV1Kind::Query.msg_type().to_string(),
            "https://didcomm.org/discover-features/1.0/query"
        );
        assert_eq!(
            DiscoverFeaturesV2Kind::Disclosures.msg_type().to_string(),
            "https://didcomm.org/discover-features/2.0/disclosures"
        );
    }
}
