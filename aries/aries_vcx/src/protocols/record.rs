//! The persisted state of one negotiation, shared by every protocol family.
//!
//! A record is created once per thread and role, then only moves along the
//! edges its family declares: every mutation goes through
//! [`ExchangeRecord::transition`] or [`ExchangeRecord::abandon`], which check
//! the current state first.

use std::fmt::{Debug, Display};

use aries_vcx_wallet::wallet::base_wallet::{record_tags::RecordTags, search_filter::SearchFilter};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::auto_accept::AutoAcceptPolicy;
use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::{AgentEvent, EventBus, StateChangedEvent},
    storage::{Repository, StorageRecord},
};

pub trait RecordState:
    Copy + Eq + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// State reached when either side gives up on the exchange.
    const ABANDONED: Self;

    /// Terminal states have no outgoing edges.
    fn is_terminal(&self) -> bool;
}

pub trait RecordRole:
    Copy + Eq + Debug + AsRef<str> + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Family specific part of a record.
pub trait RecordData: Clone + Debug + Serialize + DeserializeOwned + Send + Sync {
    const CATEGORY: &'static str;

    fn tags(&self) -> RecordTags {
        RecordTags::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord<S, R, D> {
    id: String,
    thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection_id: Option<String>,
    role: R,
    state: S,
    protocol_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_accept: Option<AutoAcceptPolicy>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pub data: D,
}

impl<S: RecordState, R: RecordRole, D: RecordData> ExchangeRecord<S, R, D> {
    pub fn new(
        thread_id: impl Into<String>,
        role: R,
        state: S,
        protocol_version: impl Into<String>,
        data: D,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            parent_thread_id: None,
            connection_id: None,
            role,
            state,
            protocol_version: protocol_version.into(),
            error_message: None,
            auto_accept: None,
            created_at: now,
            updated_at: now,
            data,
        }
    }

    pub fn with_parent_thread_id(mut self, parent_thread_id: Option<String>) -> Self {
        self.parent_thread_id = parent_thread_id;
        self
    }

    pub fn with_connection_id(mut self, connection_id: Option<String>) -> Self {
        self.connection_id = connection_id;
        self
    }

    pub fn with_auto_accept(mut self, auto_accept: Option<AutoAcceptPolicy>) -> Self {
        self.auto_accept = auto_accept;
        self
    }

    /// Keeps the current policy when `auto_accept` is `None`.
    pub fn override_auto_accept(&mut self, auto_accept: Option<AutoAcceptPolicy>) {
        if auto_accept.is_some() {
            self.auto_accept = auto_accept;
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn parent_thread_id(&self) -> Option<&str> {
        self.parent_thread_id.as_deref()
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn role(&self) -> R {
        self.role
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn auto_accept(&self) -> Option<AutoAcceptPolicy> {
        self.auto_accept
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn assert_state(&self, expected: &[S]) -> VcxResult<()> {
        if expected.contains(&self.state) {
            Ok(())
        } else {
            Err(AriesVcxError::illegal_state(self.state, expected))
        }
    }

    pub fn assert_role(&self, expected: R) -> VcxResult<()> {
        if self.role == expected {
            Ok(())
        } else {
            Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!(
                    "{} record {} has role {}, expected {}",
                    D::CATEGORY,
                    self.id,
                    self.role.as_ref(),
                    expected.as_ref()
                ),
            ))
        }
    }

    /// Moves to `next` if the record is in one of `expected`. Returns the
    /// state left behind; on failure the record is untouched.
    pub fn transition(&mut self, expected: &[S], next: S) -> VcxResult<S> {
        self.assert_state(expected)?;
        Ok(self.set_state(next))
    }

    /// The one transition allowed from any non-terminal state.
    pub fn abandon(&mut self, reason: impl Into<String>) -> VcxResult<S> {
        if self.state.is_terminal() {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::IllegalStateTransition,
                format!(
                    "{} record {} is already in terminal state {}",
                    D::CATEGORY,
                    self.id,
                    self.state
                ),
            ));
        }
        self.error_message = Some(reason.into());
        Ok(self.set_state(S::ABANDONED))
    }

    fn set_state(&mut self, next: S) -> S {
        info!(
            "{} record {} (thread {}): {} -> {}",
            D::CATEGORY,
            self.id,
            self.thread_id,
            self.state,
            next
        );
        self.updated_at = Utc::now();
        std::mem::replace(&mut self.state, next)
    }

    fn state_changed_event(&self, previous_state: Option<S>) -> VcxResult<StateChangedEvent> {
        Ok(StateChangedEvent {
            record_type: D::CATEGORY.to_owned(),
            record_id: self.id.clone(),
            thread_id: self.thread_id.clone(),
            connection_id: self.connection_id.clone(),
            previous_state: previous_state.map(|state| state.to_string()),
            state: self.state.to_string(),
            record: serde_json::to_value(self)?,
        })
    }
}

impl<S: RecordState, R: RecordRole, D: RecordData> StorageRecord for ExchangeRecord<S, R, D> {
    const CATEGORY: &'static str = D::CATEGORY;

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> RecordTags {
        let mut tags = RecordTags::new(vec![
            ("thread_id".to_owned(), self.thread_id.clone()),
            ("role".to_owned(), self.role.as_ref().to_owned()),
            ("state".to_owned(), self.state.to_string()),
            ("protocol_version".to_owned(), self.protocol_version.clone()),
        ]);
        tags.add_opt("parent_thread_id", self.parent_thread_id.as_deref());
        tags.add_opt("connection_id", self.connection_id.as_deref());
        tags.merge(self.data.tags());
        tags
    }
}

/// Query identifying the single record of a family for a thread: the
/// thread id, the local role and the connection (or its absence).
pub fn thread_query(thread_id: &str, role: &str, connection_id: Option<&str>) -> SearchFilter {
    SearchFilter::And(vec![
        SearchFilter::eq("thread_id", thread_id),
        SearchFilter::eq("role", role),
        SearchFilter::eq_or_missing("connection_id", connection_id),
    ])
}

impl<S: RecordState, R: RecordRole, D: RecordData> Repository<ExchangeRecord<S, R, D>> {
    pub async fn find_by_thread(
        &self,
        thread_id: &str,
        role: R,
        connection_id: Option<&str>,
    ) -> VcxResult<Option<ExchangeRecord<S, R, D>>> {
        self.find_single_by_query(thread_query(thread_id, role.as_ref(), connection_id))
            .await
    }

    pub async fn get_by_thread(
        &self,
        thread_id: &str,
        role: R,
        connection_id: Option<&str>,
    ) -> VcxResult<ExchangeRecord<S, R, D>> {
        self.find_by_thread(thread_id, role, connection_id)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!(
                        "No {} record with thread {thread_id}, role {} and connection {:?}",
                        D::CATEGORY,
                        role.as_ref(),
                        connection_id
                    ),
                )
            })
    }

    /// Lookup for messages either role may receive, such as problem reports.
    pub async fn find_by_thread_any_role(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> VcxResult<Option<ExchangeRecord<S, R, D>>> {
        self.find_single_by_query(SearchFilter::And(vec![
            SearchFilter::eq("thread_id", thread_id),
            SearchFilter::eq_or_missing("connection_id", connection_id),
        ]))
        .await
    }

    pub async fn get_by_thread_any_role(
        &self,
        thread_id: &str,
        connection_id: Option<&str>,
    ) -> VcxResult<ExchangeRecord<S, R, D>> {
        self.find_by_thread_any_role(thread_id, connection_id)
            .await?
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::RecordNotFound,
                    format!(
                        "No {} record with thread {thread_id} and connection {:?}",
                        D::CATEGORY,
                        connection_id
                    ),
                )
            })
    }

    /// Stores a new record and announces its initial state.
    pub async fn save_and_emit(
        &self,
        events: &EventBus,
        record: &ExchangeRecord<S, R, D>,
    ) -> VcxResult<()> {
        self.save(record).await?;
        events.emit(AgentEvent::StateChanged(record.state_changed_event(None)?));
        Ok(())
    }

    /// Persists a record after a transition away from `previous_state`.
    pub async fn update_and_emit(
        &self,
        events: &EventBus,
        record: &ExchangeRecord<S, R, D>,
        previous_state: S,
    ) -> VcxResult<()> {
        self.update(record).await?;
        events.emit(AgentEvent::StateChanged(
            record.state_changed_event(Some(previous_state))?,
        ));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};
    use strum_macros::{AsRefStr, Display};
    use test_utils::devsetup::dev_build_in_memory_wallet;

    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
    #[serde(rename_all = "kebab-case")]
    #[strum(serialize_all = "kebab-case")]
    pub enum PingState {
        Sent,
        Received,
        Done,
        Abandoned,
    }

    impl RecordState for PingState {
        const ABANDONED: Self = Self::Abandoned;

        fn is_terminal(&self) -> bool {
            matches!(self, Self::Done | Self::Abandoned)
        }
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
    #[serde(rename_all = "snake_case")]
    #[strum(serialize_all = "snake_case")]
    pub enum PingRole {
        Sender,
        Receiver,
    }

    impl RecordRole for PingRole {}

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct PingData {
        pub comment: Option<String>,
    }

    impl RecordData for PingData {
        const CATEGORY: &'static str = "ping";
    }

    pub type PingRecord = ExchangeRecord<PingState, PingRole, PingData>;

    fn record(thread_id: &str, connection_id: Option<&str>) -> PingRecord {
        PingRecord::new(
            thread_id,
            PingRole::Sender,
            PingState::Sent,
            "v1",
            PingData::default(),
        )
        .with_connection_id(connection_id.map(ToOwned::to_owned))
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let mut record = record("t1", None);
        let err = record
            .transition(&[PingState::Received], PingState::Done)
            .unwrap_err();

        assert_eq!(err.kind(), AriesVcxErrorKind::IllegalStateTransition);
        assert_eq!(record.state(), PingState::Sent);
    }

    #[test]
    fn test_abandon_from_any_active_state_only() {
        let mut record = record("t1", None);
        assert_eq!(record.abandon("peer gave up").unwrap(), PingState::Sent);
        assert_eq!(record.state(), PingState::Abandoned);
        assert_eq!(record.error_message(), Some("peer gave up"));

        let err = record.abandon("again").unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::IllegalStateTransition);
    }

    #[tokio::test]
    async fn test_thread_lookup_disambiguates_connection() {
        let repository: Repository<PingRecord> = Repository::new(dev_build_in_memory_wallet());
        let over_connection = record("t1", Some("conn-1"));
        let connectionless = record("t1", None);
        repository.save(&over_connection).await.unwrap();
        repository.save(&connectionless).await.unwrap();

        let found = repository
            .get_by_thread("t1", PingRole::Sender, Some("conn-1"))
            .await
            .unwrap();
        assert_eq!(found.id(), over_connection.id());

        let found = repository
            .get_by_thread("t1", PingRole::Sender, None)
            .await
            .unwrap();
        assert_eq!(found.id(), connectionless.id());

        assert!(repository
            .find_by_thread("t1", PingRole::Receiver, None)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repository
                .get_by_thread("t1", PingRole::Sender, Some("conn-2"))
                .await
                .unwrap_err()
                .kind(),
            AriesVcxErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn test_update_emits_state_change() {
        let repository: Repository<PingRecord> = Repository::new(dev_build_in_memory_wallet());
        let events = EventBus::default();
        let mut subscription = events.subscribe();

        let mut record = record("t1", None);
        repository.save_and_emit(&events, &record).await.unwrap();
        let previous = record
            .transition(&[PingState::Sent], PingState::Done)
            .unwrap();
        repository
            .update_and_emit(&events, &record, previous)
            .await
            .unwrap();

        let event = subscription
            .wait_for_state(record.id(), PingState::Done, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(event.previous_state.as_deref(), Some("sent"));
        assert_eq!(event.record_type, "ping");
        let stored = repository.get_by_id(record.id()).await.unwrap();
        assert_eq!(stored.state(), PingState::Done);
    }
}
