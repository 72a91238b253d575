use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use chime_storage::{StorageError, StoredTimer, TimerStorage};

use crate::crud::timer_crud;
use crate::models::timer::NewTimerRow;

/// SQLite-backed implementation of the `TimerStorage` contract.
#[derive(Clone)]
pub struct TimerPersistence {
    pool: SqlitePool,
}

impl TimerPersistence {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TimerStorage for TimerPersistence {
    async fn fetch_soonest(&self, horizon: Duration) -> Result<Option<StoredTimer>, StorageError> {
        let cutoff = Utc::now().naive_utc() + horizon;
        let row = timer_crud::find_soonest_before(&self.pool, cutoff).await?;
        row.map(|r| r.into_stored()).transpose()
    }

    async fn insert(&self, timer: &StoredTimer) -> Result<StoredTimer, StorageError> {
        let row = NewTimerRow::from_stored(timer)?;
        let id = timer_crud::insert_timer(&self.pool, &row).await?;
        let mut persisted = timer.clone();
        persisted.id = Some(id);
        Ok(persisted)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, StorageError> {
        Ok(timer_crud::delete_timer(&self.pool, id).await?)
    }

    async fn delete_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, StorageError> {
        Ok(timer_crud::delete_by_event_and_fields(&self.pool, event, fields).await?)
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<StoredTimer>, StorageError> {
        let row = timer_crud::get_timer(&self.pool, id).await?;
        row.map(|r| r.into_stored()).transpose()
    }

    async fn fetch_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<Option<StoredTimer>, StorageError> {
        let row = timer_crud::find_by_event_and_fields(&self.pool, event, fields).await?;
        row.map(|r| r.into_stored()).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<StoredTimer>, StorageError> {
        let rows = timer_crud::find_all_timers(&self.pool).await?;
        rows.into_iter().map(|r| r.into_stored()).collect()
    }
}
