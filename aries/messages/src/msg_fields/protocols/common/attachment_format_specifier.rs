use serde::{Deserialize, Serialize};

/// Links an attachment to the format of its content, e.g.
/// `hlindy/cred-abstract@v2.0`. The format strings are owned by the format
/// services, messages only carry them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AttachmentFormatSpecifier {
    pub attach_id: String,
    pub format: String,
}

impl AttachmentFormatSpecifier {
    pub fn new(attach_id: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            attach_id: attach_id.into(),
            format: format.into(),
        }
    }
}
