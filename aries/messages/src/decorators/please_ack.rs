use serde::{Deserialize, Serialize};

/// Struct representing the `~please_ack` decorator, from its [RFC](<https://github.com/hyperledger/aries-rfcs/blob/main/features/0317-please-ack/README.md>).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PleaseAck {
    #[serde(default)]
    pub on: Vec<AckOn>,
}

impl PleaseAck {
    pub fn outcome() -> Self {
        Self {
            on: vec![AckOn::Outcome],
        }
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckOn {
    Receipt,
    Outcome,
}
