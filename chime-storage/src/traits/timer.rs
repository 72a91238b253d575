use chrono::Duration;
use serde_json::{Map, Value};

use crate::entities::timer::StoredTimer;
use crate::error::StorageError;

/// Durable CRUD over pending timers. No operation retries internally;
/// retry and backoff are the scheduler's responsibility.
#[async_trait::async_trait]
pub trait TimerStorage: Send + Sync {
    /// The single timer expiring soonest within `now + horizon`, or None.
    /// Timers further out than the horizon must not be returned even if
    /// they are the only pending rows.
    async fn fetch_soonest(&self, horizon: Duration) -> Result<Option<StoredTimer>, StorageError>;

    /// Persist a timer and return it with its assigned id populated.
    async fn insert(&self, timer: &StoredTimer) -> Result<StoredTimer, StorageError>;

    /// Delete by surrogate id, returning the affected count (0 is not an error).
    async fn delete_by_id(&self, id: i64) -> Result<u64, StorageError>;

    /// Delete all timers matching the event and every payload field equality.
    async fn delete_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, StorageError>;

    async fn fetch_by_id(&self, id: i64) -> Result<Option<StoredTimer>, StorageError>;

    async fn fetch_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<Option<StoredTimer>, StorageError>;

    async fn fetch_all(&self) -> Result<Vec<StoredTimer>, StorageError>;
}
