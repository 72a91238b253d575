use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use chime_storage::{StorageError, StoredTimer};

/// A persisted timer row. `data` holds the payload as JSON text; the
/// entity layer converts it back to a structured map.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimerRow {
    pub id: i64,
    pub event: String,
    pub data: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub timezone: String,
}

/// Insert arguments; the id is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewTimerRow {
    pub event: String,
    pub data: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub timezone: String,
}

impl TimerRow {
    pub fn into_stored(self) -> Result<StoredTimer, StorageError> {
        let payload: Map<String, Value> = serde_json::from_str(&self.data).map_err(|e| {
            StorageError::DeserializationError(format!("timer {} payload: {e}", self.id))
        })?;
        Ok(StoredTimer {
            id: Some(self.id),
            event: self.event,
            expires_at: self.expires_at,
            created_at: self.created_at,
            timezone: self.timezone,
            payload,
        })
    }
}

impl NewTimerRow {
    pub fn from_stored(timer: &StoredTimer) -> Result<Self, StorageError> {
        let data = serde_json::to_string(&timer.payload)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        Ok(Self {
            event: timer.event.clone(),
            data,
            expires_at: timer.expires_at,
            created_at: timer.created_at,
            timezone: timer.timezone.clone(),
        })
    }
}
