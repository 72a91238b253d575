mod common;

use chrono::{Duration, Utc};
use common::setup_pool;
use serde_json::{json, Map};

use chime_sqlite::TimerPersistence;
use chime_storage::{StoredTimer, TimerStorage};

fn timer(event: &str, offset_secs: i64) -> StoredTimer {
    let now = Utc::now().naive_utc();
    StoredTimer {
        id: None,
        event: event.to_string(),
        expires_at: now + Duration::seconds(offset_secs),
        created_at: now,
        timezone: "UTC".to_string(),
        payload: Map::new(),
    }
}

#[tokio::test]
async fn test_timer_persistence_full() {
    let pool = setup_pool().await;
    let persistence = TimerPersistence::new(pool);

    let mut t = timer("reminder", 7200);
    t.timezone = "Europe/Berlin".to_string();
    t.payload.insert("user_id".to_string(), json!(42));

    // 1. Insert assigns an id.
    let persisted = persistence.insert(&t).await.unwrap();
    let id = persisted.id.unwrap();
    assert!(id > 0);

    // 2. Round trip: every logical field survives storage.
    let fetched = persistence.fetch_by_id(id).await.unwrap().unwrap();
    assert_eq!(fetched.event, t.event);
    assert_eq!(fetched.expires_at, t.expires_at);
    assert_eq!(fetched.created_at, t.created_at);
    assert_eq!(fetched.timezone, "Europe/Berlin");
    assert_eq!(fetched.payload.get("user_id"), Some(&json!(42)));

    // 3. Soonest within a wide horizon finds it.
    let soonest = persistence
        .fetch_soonest(Duration::days(40))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(soonest.id, Some(id));

    // 4. Field lookup finds it, wrong fields do not.
    let mut fields = Map::new();
    fields.insert("user_id".to_string(), json!(42));
    let by_fields = persistence
        .fetch_by_event_and_fields("reminder", &fields)
        .await
        .unwrap();
    assert_eq!(by_fields.unwrap().id, Some(id));

    fields.insert("user_id".to_string(), json!(1));
    assert!(persistence
        .fetch_by_event_and_fields("reminder", &fields)
        .await
        .unwrap()
        .is_none());

    // 5. Deletion is idempotent: 1 affected row, then 0.
    assert_eq!(persistence.delete_by_id(id).await.unwrap(), 1);
    assert_eq!(persistence.delete_by_id(id).await.unwrap(), 0);
    assert!(persistence.fetch_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_soonest_honors_horizon() {
    let pool = setup_pool().await;
    let persistence = TimerPersistence::new(pool);

    persistence.insert(&timer("far", 86_400)).await.unwrap();

    // A day-long timer is invisible through a one-hour horizon.
    assert!(persistence
        .fetch_soonest(Duration::hours(1))
        .await
        .unwrap()
        .is_none());
    assert!(persistence
        .fetch_soonest(Duration::days(2))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_delete_by_event_and_fields_counts_matches() {
    let pool = setup_pool().await;
    let persistence = TimerPersistence::new(pool);

    for user in [1, 2] {
        let mut t = timer("birthday", 600);
        t.payload.insert("user_id".to_string(), json!(user));
        t.payload.insert("guild_id".to_string(), json!(99));
        persistence.insert(&t).await.unwrap();
    }

    let mut fields = Map::new();
    fields.insert("guild_id".to_string(), json!(99));
    let removed = persistence
        .delete_by_event_and_fields("birthday", &fields)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    // Second call finds nothing left; not an error.
    let removed = persistence
        .delete_by_event_and_fields("birthday", &fields)
        .await
        .unwrap();
    assert_eq!(removed, 0);

    assert!(persistence.fetch_all().await.unwrap().is_empty());
}
