#![allow(clippy::result_large_err)]
#![allow(clippy::large_enum_variant)]

#[macro_use]
extern crate log;

pub extern crate did_doc;
pub extern crate did_peer;
pub extern crate messages;

pub use aries_vcx_wallet;

pub mod agent;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod protocols;
pub mod storage;
pub mod transport;
pub mod utils;
