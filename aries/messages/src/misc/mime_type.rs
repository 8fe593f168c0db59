use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum MimeType {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/ld+json")]
    JsonLd,
    #[serde(rename = "application/did+json")]
    DidJson,
    #[serde(rename = "text/plain")]
    Plain,
    #[serde(untagged)]
    Other(String),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    #[test]
    fn test_known_and_unknown_mime_types() {
        test_utils::test_serde(MimeType::Json, json!("application/json"));
        test_utils::test_serde(MimeType::Other("image/png".to_owned()), json!("image/png"));
    }
}
