pub mod protocols;
pub(crate) mod traits;
