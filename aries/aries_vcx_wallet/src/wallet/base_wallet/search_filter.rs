use super::record_tags::RecordTags;

/// Tag query evaluated against [`RecordTags`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    Eq(String, String),
    Exists(String),
    Not(Box<SearchFilter>),
    And(Vec<SearchFilter>),
    Or(Vec<SearchFilter>),
}

impl SearchFilter {
    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(name.into(), value.into())
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::Not(Box::new(Self::Exists(name.into())))
    }

    /// Matches `value` when present, otherwise requires the tag to be absent.
    pub fn eq_or_missing(name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => Self::eq(name, value),
            None => Self::missing(name),
        }
    }

    pub fn matches(&self, tags: &RecordTags) -> bool {
        match self {
            Self::Eq(name, value) => tags.contains(name, value),
            Self::Exists(name) => tags.has_name(name),
            Self::Not(inner) => !inner.matches(tags),
            Self::And(filters) => filters.iter().all(|f| f.matches(tags)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(tags)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> RecordTags {
        RecordTags::new(vec![
            ("thread_id".to_owned(), "thid".to_owned()),
            ("role".to_owned(), "sender".to_owned()),
        ])
    }

    #[test]
    fn test_and_with_missing_tag() {
        let filter = SearchFilter::And(vec![
            SearchFilter::eq("thread_id", "thid"),
            SearchFilter::eq_or_missing("connection_id", None),
        ]);
        assert!(filter.matches(&tags()));
    }

    #[test]
    fn test_eq_or_missing_requires_value_when_given() {
        let filter = SearchFilter::eq_or_missing("connection_id", Some("conn"));
        assert!(!filter.matches(&tags()));
    }

    #[test]
    fn test_or() {
        let filter = SearchFilter::Or(vec![
            SearchFilter::eq("role", "receiver"),
            SearchFilter::eq("role", "sender"),
        ]);
        assert!(filter.matches(&tags()));
    }
}
