#[macro_use]
extern crate log;

pub mod did;
pub mod error;
pub mod registry;
pub mod traits;

pub use did_doc;
