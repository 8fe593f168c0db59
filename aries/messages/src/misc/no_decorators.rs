use std::fmt;

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Placeholder for the decorators (or the content) of messages that have
/// none. Meant to be flattened: it serializes to no fields and ignores
/// whatever fields it is given.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoDecorators;

impl Serialize for NoDecorators {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for NoDecorators {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IgnoreFields;

        impl<'de> Visitor<'de> for IgnoreFields {
            type Value = NoDecorators;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(NoDecorators)
            }
        }

        deserializer.deserialize_map(IgnoreFields)
    }
}
