pub mod did_doc;
pub mod service;
pub mod verification_method;
