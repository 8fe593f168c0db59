use std::{fmt, marker::PhantomData, sync::Arc};

use aries_vcx_wallet::wallet::base_wallet::{
    record::Record, search_filter::SearchFilter, BaseWallet,
};

use super::StorageRecord;
use crate::errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult};

pub struct Repository<T> {
    wallet: Arc<dyn BaseWallet>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            wallet: self.wallet.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: StorageRecord> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("category", &T::CATEGORY)
            .finish()
    }
}

impl<T: StorageRecord> Repository<T> {
    pub fn new(wallet: Arc<dyn BaseWallet>) -> Self {
        Self {
            wallet,
            _record: PhantomData,
        }
    }

    pub async fn save(&self, record: &T) -> VcxResult<()> {
        trace!("Repository<{}>::save >> id: {}", T::CATEGORY, record.id());
        let wallet_record = Record::builder()
            .category(T::CATEGORY)
            .name(record.id())
            .value(serde_json::to_string(record)?)
            .tags(record.tags())
            .build();
        self.wallet.add_record(wallet_record).await?;
        Ok(())
    }

    pub async fn update(&self, record: &T) -> VcxResult<()> {
        trace!("Repository<{}>::update >> id: {}", T::CATEGORY, record.id());
        let value = serde_json::to_string(record)?;
        self.wallet
            .update_record_value(T::CATEGORY, record.id(), &value)
            .await?;
        self.wallet
            .update_record_tags(T::CATEGORY, record.id(), record.tags())
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> VcxResult<T> {
        let record = self.wallet.get_record(T::CATEGORY, id).await?;
        Ok(serde_json::from_str(record.value())?)
    }

    pub async fn find_by_id(&self, id: &str) -> VcxResult<Option<T>> {
        match self.wallet.get_record(T::CATEGORY, id).await {
            Ok(record) => Ok(Some(serde_json::from_str(record.value())?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_query(&self, filter: SearchFilter) -> VcxResult<Vec<T>> {
        self.search(Some(filter)).await
    }

    pub async fn get_all(&self) -> VcxResult<Vec<T>> {
        self.search(None).await
    }

    /// At most one record may match; more than one is reported as
    /// [`AriesVcxErrorKind::DuplicateRecord`].
    pub async fn find_single_by_query(&self, filter: SearchFilter) -> VcxResult<Option<T>> {
        let mut records = self.search(Some(filter.clone())).await?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            count => Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::DuplicateRecord,
                format!(
                    "Expected a single {} record, found {count} for query {filter:?}",
                    T::CATEGORY
                ),
            )),
        }
    }

    pub async fn get_single_by_query(&self, filter: SearchFilter) -> VcxResult<T> {
        self.find_single_by_query(filter.clone())
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!("No {} record found for query {filter:?}", T::CATEGORY),
                )
            })
    }

    pub async fn delete(&self, id: &str) -> VcxResult<()> {
        trace!("Repository<{}>::delete >> id: {id}", T::CATEGORY);
        self.wallet.delete_record(T::CATEGORY, id).await?;
        Ok(())
    }

    async fn search(&self, filter: Option<SearchFilter>) -> VcxResult<Vec<T>> {
        self.wallet
            .search_record(T::CATEGORY, filter)
            .await?
            .iter()
            .map(|record| serde_json::from_str(record.value()).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use aries_vcx_wallet::wallet::base_wallet::record_tags::RecordTags;
    use serde::{Deserialize, Serialize};
    use test_utils::devsetup::dev_build_in_memory_wallet;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        topic: String,
    }

    impl StorageRecord for Note {
        const CATEGORY: &'static str = "note";

        fn id(&self) -> &str {
            &self.id
        }

        fn tags(&self) -> RecordTags {
            RecordTags::new(vec![("topic".to_owned(), self.topic.clone())])
        }
    }

    fn note(id: &str, topic: &str) -> Note {
        Note {
            id: id.to_owned(),
            topic: topic.to_owned(),
        }
    }

    fn repository() -> Repository<Note> {
        Repository::new(dev_build_in_memory_wallet())
    }

    #[tokio::test]
    async fn test_update_refreshes_tags() {
        let repository = repository();
        let mut record = note("1", "draft");
        repository.save(&record).await.unwrap();

        record.topic = "final".to_owned();
        repository.update(&record).await.unwrap();

        let found = repository
            .find_single_by_query(SearchFilter::eq("topic", "final"))
            .await
            .unwrap();
        assert_eq!(found, Some(record));
        assert!(repository
            .find_by_query(SearchFilter::eq("topic", "draft"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_single_query_rejects_duplicates() {
        let repository = repository();
        repository.save(&note("1", "same")).await.unwrap();
        repository.save(&note("2", "same")).await.unwrap();

        let err = repository
            .find_single_by_query(SearchFilter::eq("topic", "same"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::DuplicateRecord);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let repository = repository();
        assert_eq!(repository.find_by_id("nope").await.unwrap(), None);
        assert_eq!(
            repository.get_by_id("nope").await.unwrap_err().kind(),
            AriesVcxErrorKind::RecordNotFound
        );
        assert_eq!(
            repository
                .get_single_by_query(SearchFilter::eq("topic", "x"))
                .await
                .unwrap_err()
                .kind(),
            AriesVcxErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let repository = repository();
        repository.save(&note("1", "gone")).await.unwrap();
        repository.delete("1").await.unwrap();
        assert!(repository.get_all().await.unwrap().is_empty());
    }
}
