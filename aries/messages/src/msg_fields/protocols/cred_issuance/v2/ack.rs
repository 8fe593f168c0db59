use serde::{Deserialize, Serialize};

use crate::{
    msg_fields::protocols::notification::{AckContent, AckDecorators},
    msg_parts::MsgParts,
};

pub type AckCredentialV2 = MsgParts<AckCredentialV2Content, AckDecorators>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct AckCredentialV2Content {
    pub inner: AckContent,
}

impl From<AckContent> for AckCredentialV2Content {
    fn from(inner: AckContent) -> Self {
        Self { inner }
    }
}
