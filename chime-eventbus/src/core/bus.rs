use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::Receiver;

use chime_storage::StoredTimer;

use crate::error::EventBusError;

/// Envelope broadcast when a timer fires. `name` is always
/// `"<event>_timer_complete"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerFired {
    pub name: String,
    pub timer: StoredTimer,
}

/// Fan-out seam towards the chat platform. Emission is fire-and-forget;
/// whatever listeners do with a fired timer is their problem.
pub trait EventBus: Send + Sync {
    fn emit(&self, event: TimerFired) -> Result<(), EventBusError>;
    fn subscribe(&self) -> Receiver<TimerFired>;
}
