use tokio::sync::broadcast;

use super::types::QueueEvent;

/// Fan-out of queue state changes to any number of observers.
///
/// Publishing never blocks. Subscribers that fall more than `capacity` events
/// behind lose the oldest ones and see `RecvError::Lagged`.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: QueueEvent) {
        // No subscribers is normal (e.g. no dashboard open)
        if self.tx.send(event).is_err() {
            tracing::trace!("Queue event dropped, no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    use super::*;
    use crate::models::{EntryState, PatientId, UrgencyLevel};
    use crate::queue::types::QueueEventKind;

    fn event(kind: QueueEventKind) -> QueueEvent {
        QueueEvent {
            entry_id: Uuid::new_v4(),
            patient_id: PatientId::new("p-1").unwrap(),
            kind,
            state: EntryState::Waiting,
            urgency: UrgencyLevel::Low,
            at: Utc::now(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.publish(event(QueueEventKind::Enqueued));

        let mut late = bus.subscribe();
        assert!(matches!(late.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(event(QueueEventKind::Enqueued));
        bus.publish(event(QueueEventKind::Admitted));

        assert_eq!(rx.recv().await.unwrap().kind, QueueEventKind::Enqueued);
        assert_eq!(rx.recv().await.unwrap().kind, QueueEventKind::Admitted);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(event(QueueEventKind::UrgencyChanged));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert!(rx.recv().await.is_ok());
    }
}
