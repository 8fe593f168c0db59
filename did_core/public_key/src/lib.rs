mod error;
mod jwk;
mod key;
mod key_type;

pub use error::PublicKeyError;
pub use jwk::OkpJwk;
pub use key::Key;
pub use key_type::KeyType;
