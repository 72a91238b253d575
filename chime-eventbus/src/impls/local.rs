use tokio::sync::broadcast::{channel, Receiver, Sender};

use crate::core::bus::{EventBus, TimerFired};
use crate::error::EventBusError;

/// In-process bus over a tokio broadcast channel.
#[derive(Clone, Debug)]
pub struct LocalEventBus {
    sender: Sender<TimerFired>,
}

impl LocalEventBus {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = channel(buffer);
        Self { sender }
    }
}

impl EventBus for LocalEventBus {
    fn emit(&self, event: TimerFired) -> Result<(), EventBusError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|e| EventBusError::BroadcastError(e.to_string()))
    }

    fn subscribe(&self) -> Receiver<TimerFired> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_storage::StoredTimer;
    use chrono::Utc;

    fn fired(name: &str) -> TimerFired {
        TimerFired {
            name: name.to_string(),
            timer: StoredTimer::new("reminder", Utc::now().naive_utc()),
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = LocalEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(fired("reminder_timer_complete")).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.name, "reminder_timer_complete");
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_errors() {
        let bus = LocalEventBus::new(16);
        assert!(bus.emit(fired("reminder_timer_complete")).is_err());
    }
}
