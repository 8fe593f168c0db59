use serde::{Deserialize, Serialize};

use crate::misc::NoDecorators;

/// Struct representing a complete message (apart from the `@type` field) as defined in a protocol
/// RFC. The purpose of this type is to allow decomposition of certain message parts so they can be
/// independently processed, if needed.
///
/// This allows separating, for example, the protocol specific fields from the decorators
/// used in a message without decomposing the entire message into individual fields.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MsgParts<C, D = NoDecorators> {
    /// All standalone messages have an `id` field.
    #[serde(rename = "@id")]
    pub id: String,
    /// The protocol specific fields provided as a standalone type.
    #[serde(flatten)]
    pub content: C,
    /// The decorators this message uses, provided as a standalone type.
    #[serde(flatten)]
    pub decorators: D,
}

impl<C> MsgParts<C> {
    pub fn new(id: String, content: C) -> Self {
        Self {
            id,
            content,
            decorators: NoDecorators,
        }
    }
}

impl<C, D> MsgParts<C, D> {
    pub fn with_decorators(id: String, content: C, decorators: D) -> Self {
        Self {
            id,
            content,
            decorators,
        }
    }
}
