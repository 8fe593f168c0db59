pub mod base_wallet;
pub mod memory;
pub mod utils;
