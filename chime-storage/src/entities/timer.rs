use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A scheduled, named, payload-carrying future event.
///
/// Timestamps are naive UTC; `timezone` records the IANA alias the
/// original wall-clock time was expressed in and is display metadata
/// only, never used to filter or compare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTimer {
    pub id: Option<i64>, // None until persisted; fast-path timers never get one
    pub event: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub timezone: String,
    pub payload: Map<String, Value>,
}

impl StoredTimer {
    pub fn new(event: impl Into<String>, expires_at: NaiveDateTime) -> Self {
        Self {
            id: None,
            event: event.into(),
            expires_at,
            created_at: Utc::now().naive_utc(),
            timezone: "UTC".to_string(),
            payload: Map::new(),
        }
    }

    /// Scheduled delay, measured from creation rather than from now.
    pub fn delay(&self) -> Duration {
        self.expires_at - self.created_at
    }

    /// Event name broadcast when this timer fires.
    pub fn completion_event(&self) -> String {
        format!("{}_timer_complete", self.event)
    }
}

/// Ids compare when both timers are persisted. The tuple fallback for
/// unpersisted timers is best-effort and not guaranteed unique; comparing
/// two unpersisted timers is undefined behavior as far as callers are
/// concerned.
impl PartialEq for StoredTimer {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.event == other.event
                    && self.expires_at == other.expires_at
                    && self.created_at == other.created_at
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(event: &str) -> StoredTimer {
        let now = Utc::now().naive_utc();
        StoredTimer {
            id: None,
            event: event.to_string(),
            expires_at: now + Duration::hours(2),
            created_at: now,
            timezone: "UTC".to_string(),
            payload: Map::new(),
        }
    }

    #[test]
    fn test_equality_by_id_when_both_persisted() {
        let mut a = sample("reminder");
        let mut b = sample("birthday");
        a.id = Some(7);
        b.id = Some(7);
        assert_eq!(a, b);

        b.id = Some(8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_falls_back_to_tuple_without_ids() {
        let a = sample("reminder");
        let mut b = a.clone();
        assert_eq!(a, b);

        b.event = "birthday".to_string();
        assert_ne!(a, b);

        // Persisted vs unpersisted also falls back to the tuple.
        let mut c = a.clone();
        c.id = Some(1);
        assert_eq!(a, c);
    }

    #[test]
    fn test_delay_and_completion_event() {
        let timer = sample("reminder");
        assert_eq!(timer.delay(), Duration::hours(2));
        assert_eq!(timer.completion_event(), "reminder_timer_complete");
    }
}
