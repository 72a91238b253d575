use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use sqlx::{Executor, QueryBuilder, Result, Sqlite};

use crate::models::timer::{NewTimerRow, TimerRow};

const TIMER_COLUMNS: &str = "id, event, data, expires_at, created_at, timezone";

pub async fn insert_timer<'e, E>(executor: E, row: &NewTimerRow) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO timers (event, data, expires_at, created_at, timezone)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.event)
    .bind(&row.data)
    .bind(row.expires_at)
    .bind(row.created_at)
    .bind(&row.timezone)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_timer<'e, E>(executor: E, id: i64) -> Result<Option<TimerRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, TimerRow>(
        r#"
        SELECT id, event, data, expires_at, created_at, timezone
        FROM timers WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Soonest row with `expires_at` strictly before the cutoff. Rows further
/// out stay invisible; the scheduler relies on this to bound its sleep.
pub async fn find_soonest_before<'e, E>(
    executor: E,
    cutoff: NaiveDateTime,
) -> Result<Option<TimerRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, TimerRow>(
        r#"
        SELECT id, event, data, expires_at, created_at, timezone
        FROM timers
        WHERE expires_at < ?
        ORDER BY expires_at ASC
        LIMIT 1
        "#,
    )
    .bind(cutoff)
    .fetch_optional(executor)
    .await
}

pub async fn find_all_timers<'e, E>(executor: E) -> Result<Vec<TimerRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, TimerRow>(
        r#"
        SELECT id, event, data, expires_at, created_at, timezone
        FROM timers
        ORDER BY expires_at ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn delete_timer<'e, E>(executor: E, id: i64) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM timers WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_event_and_fields<'e, E>(
    executor: E,
    event: &str,
    fields: &Map<String, Value>,
) -> Result<Option<TimerRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = QueryBuilder::new(format!(
        "SELECT {TIMER_COLUMNS} FROM timers WHERE event = "
    ));
    query.push_bind(event.to_owned());
    push_field_filters(&mut query, fields);
    query.push(" ORDER BY expires_at ASC LIMIT 1");

    query
        .build_query_as::<TimerRow>()
        .fetch_optional(executor)
        .await
}

pub async fn delete_by_event_and_fields<'e, E>(
    executor: E,
    event: &str,
    fields: &Map<String, Value>,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = QueryBuilder::new("DELETE FROM timers WHERE event = ");
    query.push_bind(event.to_owned());
    push_field_filters(&mut query, fields);

    let result = query.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// Appends one `json_extract(data, '$.<key>') = ?` condition per field.
/// json_extract yields native SQL values, so numbers, booleans (1/0) and
/// text all compare with a primitive bind.
fn push_field_filters(query: &mut QueryBuilder<'_, Sqlite>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        query.push(" AND json_extract(data, ");
        query.push_bind(format!("$.{key}"));
        query.push(") = ");
        match value {
            Value::Bool(b) => query.push_bind(i64::from(*b)),
            Value::Number(n) if n.is_i64() => query.push_bind(n.as_i64().unwrap_or_default()),
            Value::Number(n) => query.push_bind(n.as_f64().unwrap_or_default()),
            Value::String(s) => query.push_bind(s.clone()),
            other => query.push_bind(other.to_string()),
        };
    }
}
