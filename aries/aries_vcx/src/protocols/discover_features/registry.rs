use messages::{
    msg_fields::protocols::discover_features::{
        v2::{FeatureDisclosure, FeatureQuery},
        FeatureType,
    },
    msg_types::Protocol,
};

/// Features this agent discloses to peers that ask.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureRegistry {
    features: Vec<FeatureDisclosure>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry disclosing `protocols` together with the roles each offers.
    pub fn from_protocols(protocols: impl IntoIterator<Item = Protocol>) -> Self {
        let mut registry = Self::new();
        for protocol in protocols {
            registry.register(FeatureDisclosure {
                feature_type: FeatureType::Protocol,
                id: protocol.pid(),
                roles: Some(protocol.roles().iter().map(|r| (*r).to_owned()).collect()),
            });
        }
        registry
    }

    /// Registering a feature twice replaces the earlier entry.
    pub fn register(&mut self, feature: FeatureDisclosure) {
        match self
            .features
            .iter_mut()
            .find(|f| f.feature_type == feature.feature_type && f.id == feature.id)
        {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
    }

    pub fn register_goal_code(&mut self, goal_code: impl Into<String>) {
        self.register(FeatureDisclosure {
            feature_type: FeatureType::GoalCode,
            id: goal_code.into(),
            roles: None,
        });
    }

    pub fn features(&self) -> &[FeatureDisclosure] {
        &self.features
    }

    /// Every feature matched by at least one of `queries`, each once.
    pub fn query(&self, queries: &[FeatureQuery]) -> Vec<FeatureDisclosure> {
        self.features
            .iter()
            .filter(|feature| {
                queries.iter().any(|query| {
                    query.feature_type == feature.feature_type
                        && wildcard_match(&query.match_, &feature.id)
                })
            })
            .cloned()
            .collect()
    }
}

/// Matches `value` against `pattern`, where `*` stands for any run of
/// characters.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return value.is_empty();
    };
    let Some(mut rest) = value.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No `*` at all.
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
