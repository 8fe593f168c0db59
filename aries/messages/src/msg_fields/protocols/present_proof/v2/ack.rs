use serde::{Deserialize, Serialize};

use crate::{
    msg_fields::protocols::notification::{AckContent, AckDecorators},
    msg_parts::MsgParts,
};

pub type AckPresentationV2 = MsgParts<AckPresentationV2Content, AckDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct AckPresentationV2Content {
    pub inner: AckContent,
}

impl From<AckContent> for AckPresentationV2Content {
    fn from(inner: AckContent) -> Self {
        Self { inner }
    }
}
