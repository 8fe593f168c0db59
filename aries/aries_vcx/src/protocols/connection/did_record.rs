use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::{
    record_tags::RecordTags, search_filter::SearchFilter, BaseWallet,
};
use chrono::{DateTime, Utc};
use did_doc::schema::did_doc::DidDocument;
use did_peer::{alternative_dids_for_peer_did, is_valid_peer_did};
use public_key::Key;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    storage::{Repository, StorageRecord},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DidRole {
    /// Minted by this agent; the wallet holds the private keys.
    Created,
    /// Learned from a peer.
    Received,
}

/// A DID together with the document it resolved to when it was stored.
/// Indexed by recipient key fingerprints so that envelope keys lead back to
/// the DID, and thus to the connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DidRecord {
    id: String,
    did: String,
    role: DidRole,
    did_document: DidDocument,
    recipient_key_fingerprints: Vec<String>,
    #[serde(default)]
    alternative_dids: Vec<String>,
    created_at: DateTime<Utc>,
}

impl DidRecord {
    fn new(did: &str, role: DidRole, did_document: DidDocument) -> VcxResult<Self> {
        let recipient_key_fingerprints = did_document
            .recipient_keys()?
            .iter()
            .map(Key::fingerprint)
            .collect();
        let alternative_dids = if is_valid_peer_did(did) {
            alternative_dids_for_peer_did(did).unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            did: did.to_owned(),
            role,
            did_document,
            recipient_key_fingerprints,
            alternative_dids,
            created_at: Utc::now(),
        })
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn role(&self) -> DidRole {
        self.role
    }

    pub fn did_document(&self) -> &DidDocument {
        &self.did_document
    }

    pub fn alternative_dids(&self) -> &[String] {
        &self.alternative_dids
    }

    pub fn recipient_keys(&self) -> VcxResult<Vec<Key>> {
        Ok(self.did_document.recipient_keys()?)
    }
}

impl StorageRecord for DidRecord {
    const CATEGORY: &'static str = "did";

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> RecordTags {
        let mut tags = RecordTags::new(vec![
            ("did".to_owned(), self.did.clone()),
            ("role".to_owned(), self.role.to_string()),
        ]);
        for fingerprint in &self.recipient_key_fingerprints {
            tags.add(("recipient_key_fingerprint".to_owned(), fingerprint.clone()));
        }
        for did in &self.alternative_dids {
            tags.add(("alternative_did".to_owned(), did.clone()));
        }
        tags
    }
}

#[derive(Clone, Debug)]
pub struct DidRepository {
    repository: Repository<DidRecord>,
}

impl DidRepository {
    pub fn new(wallet: Arc<dyn BaseWallet>) -> Self {
        Self {
            repository: Repository::new(wallet),
        }
    }

    pub async fn store_created_did(
        &self,
        did: &str,
        did_document: DidDocument,
    ) -> VcxResult<DidRecord> {
        debug!("DidRepository::store_created_did >> did: {did}");
        let record = DidRecord::new(did, DidRole::Created, did_document)?;
        self.repository.save(&record).await?;
        Ok(record)
    }

    /// Stores the peer's DID, replacing the document of a DID already known.
    pub async fn store_received_did(
        &self,
        did: &str,
        did_document: DidDocument,
    ) -> VcxResult<DidRecord> {
        debug!("DidRepository::store_received_did >> did: {did}");
        match self.find_did(did, DidRole::Received).await? {
            Some(existing) => {
                let record = DidRecord {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..DidRecord::new(did, DidRole::Received, did_document)?
                };
                self.repository.update(&record).await?;
                Ok(record)
            }
            None => {
                let record = DidRecord::new(did, DidRole::Received, did_document)?;
                self.repository.save(&record).await?;
                Ok(record)
            }
        }
    }

    pub async fn find_received_did_by_recipient_key(
        &self,
        key: &Key,
    ) -> VcxResult<Option<DidRecord>> {
        self.find_by_recipient_key(key, DidRole::Received).await
    }

    pub async fn find_created_did_by_recipient_key(
        &self,
        key: &Key,
    ) -> VcxResult<Option<DidRecord>> {
        self.find_by_recipient_key(key, DidRole::Created).await
    }

    pub async fn get_received_did(&self, did: &str) -> VcxResult<DidRecord> {
        self.get_did(did, DidRole::Received).await
    }

    pub async fn get_created_did(&self, did: &str) -> VcxResult<DidRecord> {
        self.get_did(did, DidRole::Created).await
    }

    /// Matches the DID itself or any alternative form of it.
    pub async fn find_did(&self, did: &str, role: DidRole) -> VcxResult<Option<DidRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::And(vec![
                SearchFilter::eq("role", role.to_string()),
                SearchFilter::Or(vec![
                    SearchFilter::eq("did", did),
                    SearchFilter::eq("alternative_did", did),
                ]),
            ]))
            .await
    }

    async fn get_did(&self, did: &str, role: DidRole) -> VcxResult<DidRecord> {
        self.find_did(did, role).await?.ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::RecordNotFound,
                format!("No {role} DID record for {did}"),
            )
        })
    }

    async fn find_by_recipient_key(
        &self,
        key: &Key,
        role: DidRole,
    ) -> VcxResult<Option<DidRecord>> {
        self.repository
            .find_single_by_query(SearchFilter::And(vec![
                SearchFilter::eq("role", role.to_string()),
                SearchFilter::eq("recipient_key_fingerprint", key.fingerprint()),
            ]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use test_utils::{
        constants::{ALICE_ENDPOINT, BOB_ENDPOINT},
        devsetup::{dev_build_in_memory_wallet, dev_did_document},
    };

    use super::*;
    use aries_vcx_wallet::wallet::base_wallet::DidWallet;

    #[tokio::test]
    async fn test_received_did_found_by_recipient_key() {
        let wallet = dev_build_in_memory_wallet();
        let repository = DidRepository::new(wallet.clone());
        let key = wallet.create_key(None).await.unwrap();
        let doc = dev_did_document("did:example:bob", &key, BOB_ENDPOINT).unwrap();

        repository
            .store_received_did("did:example:bob", doc)
            .await
            .unwrap();

        let found = repository
            .find_received_did_by_recipient_key(&key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.did(), "did:example:bob");
        assert!(repository
            .find_created_did_by_recipient_key(&key)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_store_received_did_replaces_document() {
        let wallet = dev_build_in_memory_wallet();
        let repository = DidRepository::new(wallet.clone());
        let old_key = wallet.create_key(None).await.unwrap();
        let new_key = wallet.create_key(None).await.unwrap();

        let first = repository
            .store_received_did(
                "did:example:bob",
                dev_did_document("did:example:bob", &old_key, BOB_ENDPOINT).unwrap(),
            )
            .await
            .unwrap();
        let second = repository
            .store_received_did(
                "did:example:bob",
                dev_did_document("did:example:bob", &new_key, ALICE_ENDPOINT).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert!(repository
            .find_received_did_by_recipient_key(&old_key)
            .await
            .unwrap()
            .is_none());
        let stored = repository.get_received_did("did:example:bob").await.unwrap();
        assert_eq!(stored.recipient_keys().unwrap(), vec![new_key]);
    }
}
