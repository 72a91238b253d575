use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chime_eventbus::{EventBus, TimerFired};
use chime_storage::{StoredTimer, TimerStorage};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::reporter::ErrorReporter;

/// Source tag handed to the error reporter for dispatch-loop failures.
const DISPATCH_LOOP_TAG: &str = "timer_dispatch_loop";

/// Pause before restarting the loop after a connectivity failure.
const RESTART_BACKOFF: std::time::Duration = std::time::Duration::from_secs(1);

/// Producer-facing request for a new timer. `created_at` and `timezone`
/// default to now / "UTC" when omitted.
#[derive(Debug, Clone)]
pub struct CreateTimer {
    pub event: String,
    pub expires_at: NaiveDateTime,
    pub created_at: Option<NaiveDateTime>,
    pub timezone: Option<String>,
    pub payload: Map<String, Value>,
}

impl CreateTimer {
    pub fn new(event: impl Into<String>, expires_at: NaiveDateTime) -> Self {
        Self {
            event: event.into(),
            expires_at,
            created_at: None,
            timezone: None,
            payload: Map::new(),
        }
    }

    pub fn with_created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// The dispatch loop. Owns at most one armed timer at a time; producers
/// reach the armed snapshot and the wake signal only through `create`,
/// `delete_by_id` and `delete_by_event_and_fields`.
pub struct Scheduler {
    store: Arc<dyn TimerStorage>,
    bus: Arc<dyn EventBus>,
    reporter: Arc<dyn ErrorReporter>,
    config: EngineConfig,
    armed: Mutex<Option<StoredTimer>>,
    wake: Notify,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn TimerStorage>,
        bus: Arc<dyn EventBus>,
        reporter: Arc<dyn ErrorReporter>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            bus,
            reporter,
            config,
            armed: Mutex::new(None),
            wake: Notify::new(),
        }
    }

    /// Spawn the dispatch loop onto the runtime.
    pub fn start(self: &Arc<Self>) -> JoinHandle<Result<(), EngineError>> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    /// Run the dispatch loop on the current task. Connectivity failures
    /// restart the loop from scratch (durable state lives in storage, so
    /// nothing is lost beyond at-least-once). Anything else is reported
    /// and returned; the supervising caller decides whether to run again.
    pub async fn run(&self) -> Result<(), EngineError> {
        info!("✅ timer dispatch loop started");
        loop {
            match self.dispatch_loop().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_connectivity() => {
                    warn!("🔌 storage connectivity lost, restarting dispatch loop: {e}");
                    *self.armed_lock() = None;
                    tokio::time::sleep(RESTART_BACKOFF).await;
                }
                Err(e) => {
                    self.reporter.report(&e, DISPATCH_LOOP_TAG);
                    return Err(e);
                }
            }
        }
    }

    /// Schedule a named event. Sub-minute delays (measured from
    /// `created_at`, threshold inclusive) skip storage and arm a one-shot
    /// task directly; a crash in that window drops the timer, which is
    /// the accepted trade-off of the fast path. Durable timers wake the
    /// loop when they become the new soonest wait.
    pub async fn create(&self, request: CreateTimer) -> Result<StoredTimer, EngineError> {
        let created_at = request
            .created_at
            .unwrap_or_else(|| Utc::now().naive_utc());
        let timezone = request.timezone.unwrap_or_else(|| "UTC".to_string());
        let timer = StoredTimer {
            id: None,
            event: request.event,
            expires_at: request.expires_at,
            created_at,
            timezone,
            payload: request.payload,
        };

        if timer.delay() <= self.config.fast_path_threshold {
            self.spawn_fast_path(timer.clone());
            return Ok(timer);
        }

        let persisted = self.store.insert(&timer).await?;
        if self.preempts_armed(&persisted) {
            debug!(id = persisted.id, "new soonest timer; waking loop");
            self.wake.notify_one();
        }
        Ok(persisted)
    }

    /// Delete a persisted timer. Waking the loop is only needed when the
    /// removed row is the one currently driving the armed sleep.
    pub async fn delete_by_id(&self, id: i64) -> Result<u64, EngineError> {
        let removed = self.store.delete_by_id(id).await?;
        if removed > 0 && self.armed_lock().as_ref().and_then(|t| t.id) == Some(id) {
            debug!(id = id, "armed timer deleted; waking loop");
            self.wake.notify_one();
        }
        Ok(removed)
    }

    /// Delete all timers matching the event and payload field equalities,
    /// e.g. cancelling "my" reminder by user id.
    pub async fn delete_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, EngineError> {
        let removed = self.store.delete_by_event_and_fields(event, fields).await?;
        if removed > 0 {
            // The SQL filter compares with SQLite's coercing semantics
            // (json_extract 42 matches a bound 42.0), so the field match
            // is not re-derived in memory: a deleted row plus an event
            // match on the armed timer is enough, and a spurious wake
            // only costs one re-query.
            let interrupted = self.armed_lock().as_ref().is_some_and(|t| t.event == event);
            if interrupted {
                debug!(event = event, "armed timer deleted; waking loop");
                self.wake.notify_one();
            }
        }
        Ok(removed)
    }

    pub async fn fetch_by_id(&self, id: i64) -> Result<Option<StoredTimer>, EngineError> {
        Ok(self.store.fetch_by_id(id).await?)
    }

    pub async fn fetch_by_event_and_fields(
        &self,
        event: &str,
        fields: &Map<String, Value>,
    ) -> Result<Option<StoredTimer>, EngineError> {
        Ok(self.store.fetch_by_event_and_fields(event, fields).await?)
    }

    pub async fn fetch_all(&self) -> Result<Vec<StoredTimer>, EngineError> {
        Ok(self.store.fetch_all().await?)
    }

    /// One pass of the state machine per iteration: query, then either
    /// idle on the wake signal, or arm a cancellable sleep on the soonest
    /// timer and dispatch when it survives to expiry.
    async fn dispatch_loop(&self) -> Result<(), EngineError> {
        loop {
            let Some(timer) = self.store.fetch_soonest(self.config.horizon).await? else {
                // Idle. Re-query at the latest after a full horizon so
                // timers beyond it eventually become visible.
                let idle_cap = self
                    .config
                    .horizon
                    .to_std()
                    .unwrap_or(std::time::Duration::from_secs(60));
                tokio::select! {
                    _ = self.wake.notified() => debug!("wake signal while idle"),
                    _ = tokio::time::sleep(idle_cap) => debug!("idle horizon elapsed; re-querying"),
                }
                continue;
            };

            let sleep_for = (timer.expires_at - Utc::now().naive_utc())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            debug!(id = timer.id, event = %timer.event, ?sleep_for, "⏰ armed");
            *self.armed_lock() = Some(timer.clone());

            let fired = tokio::select! {
                _ = tokio::time::sleep(sleep_for) => true,
                _ = self.wake.notified() => false,
            };
            *self.armed_lock() = None;

            if fired {
                self.dispatch(timer).await?;
            } else {
                // Restarting: the soonest pending timer changed under us.
                debug!("armed wait preempted; re-querying");
            }
        }
    }

    /// Dispatch step: consume the row, then broadcast. Emission is
    /// fire-and-forget; listener failures are the listeners' problem.
    async fn dispatch(&self, timer: StoredTimer) -> Result<(), EngineError> {
        if let Some(id) = timer.id {
            // Zero rows means someone else consumed it already; tolerated.
            if self.store.delete_by_id(id).await? == 0 {
                debug!(id = id, "fired timer already removed from storage");
            }
        }
        let name = timer.completion_event();
        info!(event = %name, "⏰ timer fired");
        if let Err(e) = self.bus.emit(TimerFired { name, timer }) {
            debug!("no listeners for fired timer: {e}");
        }
        Ok(())
    }

    /// Fast path: no id, no durability, dispatch straight from a spawned
    /// one-shot sleep.
    fn spawn_fast_path(&self, timer: StoredTimer) {
        let bus = Arc::clone(&self.bus);
        let sleep_for = (timer.expires_at - Utc::now().naive_utc())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        debug!(event = %timer.event, ?sleep_for, "fast path armed, skipping storage");
        tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            let name = timer.completion_event();
            info!(event = %name, "⏰ timer fired (fast path)");
            if let Err(e) = bus.emit(TimerFired { name, timer }) {
                debug!("no listeners for fired timer: {e}");
            }
        });
    }

    fn preempts_armed(&self, timer: &StoredTimer) -> bool {
        match self.armed_lock().as_ref() {
            None => true,
            Some(armed) => timer.expires_at < armed.expires_at,
        }
    }

    fn armed_lock(&self) -> MutexGuard<'_, Option<StoredTimer>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
