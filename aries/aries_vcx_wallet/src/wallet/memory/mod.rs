use std::collections::HashMap;

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use public_key::{Key, KeyType};
use tokio::sync::RwLock;

use super::{
    base_wallet::{
        record::Record, record_tags::RecordTags, search_filter::SearchFilter, BaseWallet,
        DidWallet, RecordWallet,
    },
    utils::random_seed,
};
use crate::errors::error::{VcxWalletError, VcxWalletResult};

const KEY_CATEGORY: &str = "key";

/// Wallet holding keys and records in process memory. Contents are lost on drop.
#[derive(Default)]
pub struct InMemoryWallet {
    keys: RwLock<HashMap<String, SigningKey>>,
    records: RwLock<HashMap<(String, String), Record>>,
}

impl std::fmt::Debug for InMemoryWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWallet").finish_non_exhaustive()
    }
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    fn signing_key_from_seed(seed: &str) -> VcxWalletResult<SigningKey> {
        let bytes: [u8; 32] = seed.as_bytes().try_into().map_err(|_| {
            VcxWalletError::InvalidInput(format!(
                "seed must be 32 bytes long, got {}",
                seed.len()
            ))
        })?;
        Ok(SigningKey::from_bytes(&bytes))
    }

    fn verifying_key(key: &Key) -> VcxWalletResult<VerifyingKey> {
        if *key.key_type() != KeyType::Ed25519 {
            return Err(VcxWalletError::InvalidInput(format!(
                "only Ed25519 keys can verify signatures, got {}",
                key.key_type()
            )));
        }
        let bytes: [u8; 32] = key.key().try_into().map_err(|_| {
            VcxWalletError::InvalidInput(format!("invalid key length: {}", key.key().len()))
        })?;
        Ok(VerifyingKey::from_bytes(&bytes)?)
    }
}

impl BaseWallet for InMemoryWallet {}

#[async_trait]
impl DidWallet for InMemoryWallet {
    async fn create_key(&self, seed: Option<&str>) -> VcxWalletResult<Key> {
        let signing_key = match seed {
            Some(seed) => Self::signing_key_from_seed(seed)?,
            None => Self::signing_key_from_seed(&random_seed())?,
        };
        let key = Key::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            KeyType::Ed25519,
        )?;

        self.keys.write().await.insert(key.base58(), signing_key);
        trace!("InMemoryWallet::create_key >> created {}", key.base58());
        Ok(key)
    }

    async fn key_count(&self) -> VcxWalletResult<usize> {
        Ok(self.keys.read().await.len())
    }

    async fn has_key(&self, key: &Key) -> VcxWalletResult<bool> {
        Ok(self.keys.read().await.contains_key(&key.base58()))
    }

    async fn sign(&self, key: &Key, msg: &[u8]) -> VcxWalletResult<Vec<u8>> {
        let keys = self.keys.read().await;
        let signing_key = keys
            .get(&key.base58())
            .ok_or_else(|| VcxWalletError::record_not_found(KEY_CATEGORY, &key.base58()))?;
        Ok(signing_key.sign(msg).to_bytes().to_vec())
    }

    async fn verify(&self, key: &Key, msg: &[u8], signature: &[u8]) -> VcxWalletResult<bool> {
        let verifying_key = Self::verifying_key(key)?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying_key.verify(msg, &signature).is_ok())
    }
}

#[async_trait]
impl RecordWallet for InMemoryWallet {
    async fn add_record(&self, record: Record) -> VcxWalletResult<()> {
        let key = (record.category().to_owned(), record.name().to_owned());
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(VcxWalletError::DuplicateRecord(format!(
                "category: {}, name: {}",
                key.0, key.1
            )));
        }
        records.insert(key, record);
        Ok(())
    }

    async fn get_record(&self, category: &str, name: &str) -> VcxWalletResult<Record> {
        self.records
            .read()
            .await
            .get(&(category.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| VcxWalletError::record_not_found(category, name))
    }

    async fn update_record_tags(
        &self,
        category: &str,
        name: &str,
        new_tags: RecordTags,
    ) -> VcxWalletResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(category.to_owned(), name.to_owned()))
            .ok_or_else(|| VcxWalletError::record_not_found(category, name))?;
        record.set_tags(new_tags);
        Ok(())
    }

    async fn update_record_value(
        &self,
        category: &str,
        name: &str,
        new_value: &str,
    ) -> VcxWalletResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(category.to_owned(), name.to_owned()))
            .ok_or_else(|| VcxWalletError::record_not_found(category, name))?;
        record.set_value(new_value);
        Ok(())
    }

    async fn delete_record(&self, category: &str, name: &str) -> VcxWalletResult<()> {
        self.records
            .write()
            .await
            .remove(&(category.to_owned(), name.to_owned()))
            .map(|_| ())
            .ok_or_else(|| VcxWalletError::record_not_found(category, name))
    }

    async fn search_record(
        &self,
        category: &str,
        search_filter: Option<SearchFilter>,
    ) -> VcxWalletResult<Vec<Record>> {
        let records = self.records.read().await;
        let mut found: Vec<Record> = records
            .values()
            .filter(|record| record.category() == category)
            .filter(|record| {
                search_filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(record.tags()))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "000000000000000000000000Trustee1";

    #[tokio::test]
    async fn did_wallet_should_sign_and_verify() {
        let wallet = InMemoryWallet::new();
        let key = wallet.create_key(None).await.unwrap();

        let msg = "sign this".as_bytes();
        let sig = wallet.sign(&key, msg).await.unwrap();

        assert!(wallet.verify(&key, msg, &sig).await.unwrap());
        assert!(!wallet.verify(&key, b"other", &sig).await.unwrap());
        assert!(wallet.has_key(&key).await.unwrap());
        assert_eq!(wallet.key_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn did_wallet_seeded_keys_are_deterministic() {
        let first = InMemoryWallet::new().create_key(Some(SEED)).await.unwrap();
        let second = InMemoryWallet::new().create_key(Some(SEED)).await.unwrap();
        assert_eq!(first, second);

        let err = InMemoryWallet::new()
            .create_key(Some("too short"))
            .await
            .unwrap_err();
        assert!(matches!(err, VcxWalletError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn did_wallet_should_not_sign_with_unknown_key() {
        let wallet = InMemoryWallet::new();
        let foreign = InMemoryWallet::new().create_key(None).await.unwrap();

        let err = wallet.sign(&foreign, b"msg").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn record_wallet_should_create_record() {
        let wallet = InMemoryWallet::new();
        let record = Record::builder()
            .name("foo")
            .category("my")
            .value("xxx")
            .build();

        wallet.add_record(record.clone()).await.unwrap();
        let res = wallet.get_record("my", "foo").await.unwrap();
        assert_eq!(res, record);

        let err = wallet.add_record(record).await.unwrap_err();
        assert!(matches!(err, VcxWalletError::DuplicateRecord(_)));
    }

    #[tokio::test]
    async fn record_wallet_should_update_and_delete_record() {
        let wallet = InMemoryWallet::new();
        let record = Record::builder()
            .name("foo")
            .category("my")
            .value("xxx")
            .build();
        wallet.add_record(record).await.unwrap();

        wallet.update_record_value("my", "foo", "yyy").await.unwrap();
        wallet
            .update_record_tags(
                "my",
                "foo",
                RecordTags::new(vec![("state".to_owned(), "done".to_owned())]),
            )
            .await
            .unwrap();

        let res = wallet.get_record("my", "foo").await.unwrap();
        assert_eq!(res.value(), "yyy");
        assert_eq!(res.tags().get("state"), Some("done"));

        wallet.delete_record("my", "foo").await.unwrap();
        let err = wallet.get_record("my", "foo").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn record_wallet_should_search_by_tags() {
        let wallet = InMemoryWallet::new();
        for (name, thid, conn) in [
            ("a", "t1", Some("c1")),
            ("b", "t1", None),
            ("c", "t2", Some("c1")),
        ] {
            let mut tags = RecordTags::new(vec![("thread_id".to_owned(), thid.to_owned())]);
            tags.add_opt("connection_id", conn);
            wallet
                .add_record(
                    Record::builder()
                        .category("exchange")
                        .name(name)
                        .value("{}")
                        .tags(tags)
                        .build(),
                )
                .await
                .unwrap();
        }

        let connectionless = wallet
            .search_record(
                "exchange",
                Some(SearchFilter::And(vec![
                    SearchFilter::eq("thread_id", "t1"),
                    SearchFilter::eq_or_missing("connection_id", None),
                ])),
            )
            .await
            .unwrap();
        assert_eq!(connectionless.len(), 1);
        assert_eq!(connectionless[0].name(), "b");

        let all = wallet.search_record("exchange", None).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
