#[macro_use]
extern crate log;

pub mod error;
pub mod peer_did;
pub mod resolver;

pub use peer_did::{
    alternative_dids_for_peer_did, is_valid_peer_did, num_algo_from_peer_did, PeerDidNumAlgo,
};
