use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::{
    record_tags::RecordTags, search_filter::SearchFilter, BaseWallet,
};
use messages::{msg_types::MessageType, AriesMessage};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use super::{Repository, StorageRecord};
use crate::errors::error::VcxResult;

/// Which side of the exchange produced a stored message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentMessageRole {
    Sender,
    Receiver,
}

/// One message of an exchange transcript, attached to the record it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentMessageRecord {
    id: String,
    associated_record_id: String,
    message_name: String,
    role: AgentMessageRole,
    message: AriesMessage,
}

impl AgentMessageRecord {
    pub fn message(&self) -> &AriesMessage {
        &self.message
    }

    pub fn role(&self) -> AgentMessageRole {
        self.role
    }
}

impl StorageRecord for AgentMessageRecord {
    const CATEGORY: &'static str = "agent_message";

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> RecordTags {
        RecordTags::new(vec![
            (
                "associated_record_id".to_owned(),
                self.associated_record_id.clone(),
            ),
            ("message_name".to_owned(), self.message_name.clone()),
            ("role".to_owned(), self.role.to_string()),
        ])
    }
}

fn transcript_query(
    associated_record_id: &str,
    message_type: &MessageType,
    role: Option<AgentMessageRole>,
) -> SearchFilter {
    let mut filters = vec![
        SearchFilter::eq("associated_record_id", associated_record_id),
        SearchFilter::eq("message_name", message_type.to_string()),
    ];
    if let Some(role) = role {
        filters.push(SearchFilter::eq("role", role.as_ref()));
    }
    SearchFilter::And(filters)
}

/// Transcript of the raw messages exchanged for each protocol record.
/// A record keeps the latest message per (message type, role).
#[derive(Clone, Debug)]
pub struct AgentMessageStore {
    repository: Repository<AgentMessageRecord>,
}

impl AgentMessageStore {
    pub fn new(wallet: Arc<dyn BaseWallet>) -> Self {
        Self {
            repository: Repository::new(wallet),
        }
    }

    pub async fn save_or_update_agent_message(
        &self,
        associated_record_id: &str,
        role: AgentMessageRole,
        message: &AriesMessage,
    ) -> VcxResult<()> {
        let message_type = message.msg_type();
        let existing = self
            .repository
            .find_single_by_query(transcript_query(
                associated_record_id,
                &message_type,
                Some(role),
            ))
            .await?;

        match existing {
            Some(mut record) => {
                record.message = message.clone();
                self.repository.update(&record).await
            }
            None => {
                let record = AgentMessageRecord {
                    id: Uuid::new_v4().to_string(),
                    associated_record_id: associated_record_id.to_owned(),
                    message_name: message_type.to_string(),
                    role,
                    message: message.clone(),
                };
                self.repository.save(&record).await
            }
        }
    }

    /// Latest message of `message_type` stored for the record, optionally
    /// restricted to the side that produced it.
    pub async fn find_agent_message(
        &self,
        associated_record_id: &str,
        message_type: &MessageType,
        role: Option<AgentMessageRole>,
    ) -> VcxResult<Option<AriesMessage>> {
        let record = self
            .repository
            .find_single_by_query(transcript_query(associated_record_id, message_type, role))
            .await?;
        Ok(record.map(|record| record.message))
    }

    pub async fn find_all_for_record(
        &self,
        associated_record_id: &str,
    ) -> VcxResult<Vec<AgentMessageRecord>> {
        self.repository
            .find_by_query(SearchFilter::eq(
                "associated_record_id",
                associated_record_id,
            ))
            .await
    }

    pub async fn delete_for_record(&self, associated_record_id: &str) -> VcxResult<()> {
        for record in self.find_all_for_record(associated_record_id).await? {
            self.repository.delete(&record.id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use messages::{
        decorators::thread::Thread,
        msg_fields::protocols::notification::{Ack, AckContent, AckDecorators, AckStatus},
        msg_types::{MessageKind, NotificationKind},
    };
    use test_utils::devsetup::dev_build_in_memory_wallet;

    use super::*;

    fn ack(id: &str, status: AckStatus) -> AriesMessage {
        Ack::with_decorators(
            id.to_owned(),
            AckContent { status },
            AckDecorators::new(Thread::new("thid".to_owned())),
        )
        .into()
    }

    #[tokio::test]
    async fn test_latest_message_replaces_previous() {
        let store = AgentMessageStore::new(dev_build_in_memory_wallet());
        store
            .save_or_update_agent_message("rec", AgentMessageRole::Sender, &ack("1", AckStatus::Pending))
            .await
            .unwrap();
        store
            .save_or_update_agent_message("rec", AgentMessageRole::Sender, &ack("2", AckStatus::Ok))
            .await
            .unwrap();
        store
            .save_or_update_agent_message("rec", AgentMessageRole::Receiver, &ack("3", AckStatus::Fail))
            .await
            .unwrap();

        let msg_type = NotificationKind::Ack.msg_type();
        let sent = store
            .find_agent_message("rec", &msg_type, Some(AgentMessageRole::Sender))
            .await
            .unwrap();
        assert_eq!(sent, Some(ack("2", AckStatus::Ok)));
        assert_eq!(store.find_all_for_record("rec").await.unwrap().len(), 2);

        store.delete_for_record("rec").await.unwrap();
        assert!(store.find_all_for_record("rec").await.unwrap().is_empty());
    }
}
