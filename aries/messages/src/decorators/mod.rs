//! Decorators shared by messages across protocols, as defined in their respective RFCs.

pub mod attachment;
pub mod please_ack;
pub mod service;
pub mod thread;
pub mod timing;
