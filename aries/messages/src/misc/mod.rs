mod mime_type;
mod no_decorators;
pub(crate) mod utils;

pub use mime_type::MimeType;
pub use no_decorators::NoDecorators;

#[cfg(test)]
pub mod test_utils {
    use pretty_assertions::assert_eq;
    use serde::{de::DeserializeOwned, Serialize};
    use serde_json::{json, Value};

    use crate::{msg_types::MessageType, AriesMessage};

    pub fn test_serde<T>(value: T, expected: Value)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let serialized = serde_json::to_value(&value).unwrap();
        assert_eq!(serialized, expected);

        let deserialized: T = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, value);
    }

    /// Checks the wire form of `msg`, with `@id` = "test" and the given
    /// `@type`, and that it deserializes back into the same message.
    pub fn test_msg<M>(msg: M, msg_type: MessageType, mut expected: Value)
    where
        AriesMessage: From<M>,
    {
        let obj = expected.as_object_mut().expect("JSON object");
        obj.insert("@id".to_owned(), json!("test"));
        obj.insert("@type".to_owned(), json!(msg_type.to_string()));

        let msg = AriesMessage::from(msg);
        assert_eq!(serde_json::to_value(&msg).unwrap(), expected);

        let deserialized: AriesMessage = serde_json::from_value(expected).unwrap();
        assert_eq!(deserialized, msg);
    }
}
