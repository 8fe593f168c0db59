pub const ALICE_SEED: &str = "000000000000000000000000000Alice";
pub const BOB_SEED: &str = "00000000000000000000000000000Bob";
pub const FABER_SEED: &str = "0000000000000000000000000000Fabr";

pub const ALICE_ENDPOINT: &str = "http://alice.example.org/didcomm";
pub const BOB_ENDPOINT: &str = "http://bob.example.org/didcomm";
