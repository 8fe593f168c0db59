use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Struct representing the `~thread` decorator from its [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/concepts/0008-message-id-and-threading/README.md>).
///
/// `thid` can only be absent on the first message of a thread, in which case
/// the thread id is the message's own `@id`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, TypedBuilder)]
pub struct Thread {
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thid: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pthid: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_order: Option<u32>,
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_orders: Option<HashMap<String, u32>>,
}

impl Thread {
    pub fn new(thid: String) -> Self {
        Self {
            thid: Some(thid),
            ..Default::default()
        }
    }

    pub fn with_parent(thid: String, pthid: String) -> Self {
        Self {
            thid: Some(thid),
            pthid: Some(pthid),
            ..Default::default()
        }
    }

    /// Thread id of a message carrying this decorator, falling back to the
    /// message's own id.
    pub fn thid_or<'a>(&'a self, msg_id: &'a str) -> &'a str {
        self.thid.as_deref().unwrap_or(msg_id)
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use super::*;
    use crate::misc::test_utils;

    pub fn make_extended_thread() -> Thread {
        Thread::builder()
            .thid("test_thid".to_owned())
            .pthid("test_pthid".to_owned())
            .sender_order(0)
            .received_orders(HashMap::from([("a".to_owned(), 0)]))
            .build()
    }

    #[test]
    fn test_minimal_thread() {
        test_utils::test_serde(Thread::new("test".to_owned()), json!({ "thid": "test" }));
    }

    #[test]
    fn test_extended_thread() {
        let thread = make_extended_thread();
        let expected = json!({
            "thid": "test_thid",
            "pthid": "test_pthid",
            "sender_order": 0,
            "received_orders": { "a": 0 }
        });
        test_utils::test_serde(thread, expected);
    }

    #[test]
    fn test_thid_falls_back_to_message_id() {
        let thread = Thread::builder().pthid("invitation".to_owned()).build();
        assert_eq!(thread.thid_or("msg-id"), "msg-id");
        assert_eq!(make_extended_thread().thid_or("msg-id"), "test_thid");
    }
}
