use async_trait::async_trait;
use public_key::Key;

use crate::errors::error::VcxWalletResult;

pub mod record;
pub mod record_tags;
pub mod search_filter;

use self::{record::Record, record_tags::RecordTags, search_filter::SearchFilter};

pub trait BaseWallet: RecordWallet + DidWallet + Send + Sync + std::fmt::Debug {}

/// Key management. Private key material never leaves the implementation;
/// callers address keys by their public half.
#[async_trait]
pub trait DidWallet {
    /// Creates an Ed25519 key pair, deterministic when a 32 byte seed is given.
    async fn create_key(&self, seed: Option<&str>) -> VcxWalletResult<Key>;

    async fn key_count(&self) -> VcxWalletResult<usize>;

    async fn has_key(&self, key: &Key) -> VcxWalletResult<bool>;

    async fn sign(&self, key: &Key, msg: &[u8]) -> VcxWalletResult<Vec<u8>>;

    async fn verify(&self, key: &Key, msg: &[u8], signature: &[u8]) -> VcxWalletResult<bool>;
}

#[async_trait]
pub trait RecordWallet {
    async fn add_record(&self, record: Record) -> VcxWalletResult<()>;

    async fn get_record(&self, category: &str, name: &str) -> VcxWalletResult<Record>;

    async fn update_record_tags(
        &self,
        category: &str,
        name: &str,
        new_tags: RecordTags,
    ) -> VcxWalletResult<()>;

    async fn update_record_value(
        &self,
        category: &str,
        name: &str,
        new_value: &str,
    ) -> VcxWalletResult<()>;

    async fn delete_record(&self, category: &str, name: &str) -> VcxWalletResult<()>;

    async fn search_record(
        &self,
        category: &str,
        search_filter: Option<SearchFilter>,
    ) -> VcxWalletResult<Vec<Record>>;
}
