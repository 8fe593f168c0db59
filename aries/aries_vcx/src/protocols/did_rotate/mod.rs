//! DID rotation 1.0 over an established connection. Our new DID only takes
//! effect once the peer acknowledges it; until then messages keep flowing
//! over the previous DIDs.

pub mod service;

pub use self::service::DidRotateService;
