pub mod auto_accept;
pub mod common;
pub mod connection;
pub mod did_exchange;
pub mod did_rotate;
pub mod discover_features;
pub mod issuance;
pub mod out_of_band;
pub mod proof_presentation;
pub mod record;
