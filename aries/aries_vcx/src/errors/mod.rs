pub mod error;
mod mapping_others;
mod mapping_wallet;
