use std::fmt;

use serde::{de::Visitor, ser::SerializeMap, Deserialize, Serialize};

pub type RecordTag = (String, String);

/// Tags attached to a record. A tag name may repeat with different values,
/// which is how multi-valued attributes such as key fingerprints are stored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordTags {
    inner: Vec<RecordTag>,
}

impl Serialize for RecordTags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for tag in self.inner.iter() {
            map.serialize_entry(&tag.0, &tag.1)?
        }
        map.end()
    }
}

struct RecordTagsVisitor;

impl<'de> Visitor<'de> for RecordTagsVisitor {
    type Value = RecordTags;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a map representing tags")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut tags = RecordTags::new(vec![]);

        while let Some(tag) = map.next_entry()? {
            tags.add(tag);
        }

        Ok(tags)
    }
}

impl<'de> Deserialize<'de> for RecordTags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordTagsVisitor)
    }
}

impl RecordTags {
    pub fn new(inner: Vec<RecordTag>) -> Self {
        let mut items = inner;
        items.sort();

        Self { inner: items }
    }

    pub fn add(&mut self, tag: RecordTag) {
        self.inner.push(tag);
        self.inner.sort();
    }

    /// Adds the tag only when a value is present.
    pub fn add_opt(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.add((name.to_owned(), value.to_owned()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(tag_name, _)| tag_name == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.inner
            .iter()
            .any(|(tag_name, tag_value)| tag_name == name && tag_value == value)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.inner.iter().any(|(tag_name, _)| tag_name == name)
    }

    pub fn into_inner(self) -> Vec<RecordTag> {
        self.inner
    }

    pub fn merge(&mut self, other: RecordTags) {
        self.inner.extend(other.into_inner());
        self.inner.sort();
    }
}

impl IntoIterator for RecordTags {
    type Item = RecordTag;

    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<RecordTag> for RecordTags {
    fn from_iter<T: IntoIterator<Item = RecordTag>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Vec<RecordTag>> for RecordTags {
    fn from(value: Vec<RecordTag>) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_valued_tags() {
        let tags = RecordTags::new(vec![
            ("fingerprint".to_owned(), "z6Mkb".to_owned()),
            ("fingerprint".to_owned(), "z6Mka".to_owned()),
            ("role".to_owned(), "requester".to_owned()),
        ]);

        assert!(tags.contains("fingerprint", "z6Mka"));
        assert!(tags.contains("fingerprint", "z6Mkb"));
        assert_eq!(tags.get("fingerprint"), Some("z6Mka"));
        assert!(!tags.has_name("connection_id"));
    }

    #[test]
    fn test_add_opt_skips_none() {
        let mut tags = RecordTags::default();
        tags.add_opt("connection_id", None);
        tags.add_opt("thread_id", Some("thid"));

        assert!(!tags.has_name("connection_id"));
        assert_eq!(tags.get("thread_id"), Some("thid"));
    }

    #[test]
    fn test_serde_as_map() {
        let tags = RecordTags::new(vec![("role".to_owned(), "sender".to_owned())]);
        let value = serde_json::to_value(&tags).unwrap();
        assert_eq!(value, serde_json::json!({ "role": "sender" }));

        let back: RecordTags = serde_json::from_value(value).unwrap();
        assert_eq!(back, tags);
    }
}
