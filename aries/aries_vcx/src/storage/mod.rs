//! Typed persistence on top of the wallet's tagged record store.

pub mod agent_message;
pub mod repository;

use aries_vcx_wallet::wallet::base_wallet::record_tags::RecordTags;
use serde::{de::DeserializeOwned, Serialize};

pub use self::repository::Repository;

/// A value stored as one wallet record of `CATEGORY`, named by its id and
/// searchable through its tags.
pub trait StorageRecord: Serialize + DeserializeOwned + Send + Sync {
    const CATEGORY: &'static str;

    fn id(&self) -> &str;

    fn tags(&self) -> RecordTags;
}
