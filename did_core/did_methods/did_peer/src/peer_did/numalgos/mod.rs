pub mod numalgo0;
pub mod numalgo1;
pub mod numalgo2;
pub mod numalgo4;

use sha2::{Digest, Sha256};

const MULTIHASH_SHA2_256: u8 = 0x12;
const MULTIHASH_SHA2_256_LEN: u8 = 0x20;

/// base58btc multibase of the sha2-256 multihash of `bytes`.
pub(crate) fn multihash_sha256_base58(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut multihash = vec![MULTIHASH_SHA2_256, MULTIHASH_SHA2_256_LEN];
    multihash.extend_from_slice(&digest);
    multibase::encode(multibase::Base::Base58Btc, multihash)
}
