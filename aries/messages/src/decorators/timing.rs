use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::misc::utils;

/// Struct representing the `~timing` decorator from its [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0032-message-timing/README.md>).
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, TypedBuilder)]
pub struct Timing {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub in_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub out_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub stale_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub expires_time: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_milli: Option<u32>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "utils::serialize_opt_datetime")]
    pub wait_until_time: Option<DateTime<Utc>>,
}

impl Timing {
    pub fn out_now() -> Self {
        Self::builder().out_time(Utc::now()).build()
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;

    pub fn make_extended_timing() -> Timing {
        let dt = DateTime::<Utc>::default();
        Timing::builder()
            .in_time(dt)
            .out_time(dt)
            .expires_time(dt)
            .delay_milli(10)
            .build()
    }

    #[test]
    fn test_minimal_timing() {
        assert_eq!(serde_json::to_value(Timing::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_extended_timing() {
        let expected = json!({
            "in_time": "1970-01-01T00:00:00.000Z",
            "out_time": "1970-01-01T00:00:00.000Z",
            "expires_time": "1970-01-01T00:00:00.000Z",
            "delay_milli": 10
        });
        let timing = make_extended_timing();
        assert_eq!(serde_json::to_value(&timing).unwrap(), expected);
        assert_eq!(serde_json::from_value::<Timing>(expected).unwrap(), timing);
    }
}
