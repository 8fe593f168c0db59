use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use derive_more::Display;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult};

/// Messages sharing a key are processed one at a time. The role is only
/// known once a message is routed, so the key is the coarser pair of
/// thread and connection.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display(fmt = "{}@{:?}", thread_id, connection_id)]
pub struct ThreadKey {
    pub thread_id: String,
    pub connection_id: Option<String>,
}

impl ThreadKey {
    pub fn new(thread_id: impl Into<String>, connection_id: Option<&str>) -> Self {
        Self {
            thread_id: thread_id.into(),
            connection_id: connection_id.map(ToOwned::to_owned),
        }
    }
}

type LockMap = HashMap<ThreadKey, Arc<AsyncMutex<()>>>;

#[derive(Clone, Debug, Default)]
pub struct ThreadLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder of `key` is left.
    pub async fn lock(&self, key: ThreadKey) -> VcxResult<ThreadGuard> {
        let mutex = {
            let mut locks = self.locks.lock().map_err(|_| {
                AriesVcxError::from_msg(AriesVcxErrorKind::LockError, "Thread lock map poisoned")
            })?;
            locks.entry(key.clone()).or_default().clone()
        };
        trace!("ThreadLocks::lock >> waiting for {key}");
        let guard = mutex.lock_owned().await;
        Ok(ThreadGuard {
            key,
            locks: self.locks.clone(),
            guard: Some(guard),
        })
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the key on drop. The map entry goes away with the last user.
#[derive(Debug)]
pub struct ThreadGuard {
    key: ThreadKey,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        self.guard.take();
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
