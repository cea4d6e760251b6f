//! In-process session table.
//!
//! Works like `tower_sessions::MemoryStore`, but also implements
//! `ExpiredDeletion` so a background task can drop records whose expiry has
//! passed instead of letting the map grow for the life of the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion};

#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

impl SessionTable {
    /// Number of stored records, expired or not.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Deletes expired records every `period`, until the handle is aborted.
    #[must_use]
    pub fn spawn_pruning(&self, period: Duration) -> JoinHandle<()> {
        let table = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = table.delete_expired().await {
                    tracing::warn!("Failed to prune expired sessions: {e}");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for SessionTable {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .get(session_id)
            .filter(|record| is_active(record))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SessionTable {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| is_active(record));

        let removed = before - records.len();
        if removed > 0 {
            tracing::debug!(removed, "Pruned expired sessions");
        }
        Ok(())
    }
}
