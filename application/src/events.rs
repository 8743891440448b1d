//! In-process event channel.
//!
//! [`EventBus`] fans [`CouncilEvent`]s out to every subscriber over a tokio
//! broadcast channel. Each subscriber sees events in publish order. A slow
//! subscriber lags and skips events instead of blocking the publisher, and
//! publishing with no subscribers is not an error.

use council_domain::CouncilEvent;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Shared handle to the event channel. Cloning shares the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CouncilEvent>,
}

/// Receiver that yields only events matching a predicate.
pub struct FilteredReceiver<F> {
    receiver: broadcast::Receiver<CouncilEvent>,
    predicate: F,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to all current subscribers (best effort).
    pub fn publish(&self, event: CouncilEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Event published"),
            Err(_) => debug!(event = name, "Event published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CouncilEvent> {
        self.sender.subscribe()
    }

    pub fn subscribe_filtered<F>(&self, predicate: F) -> FilteredReceiver<F>
    where
        F: Fn(&CouncilEvent) -> bool,
    {
        FilteredReceiver {
            receiver: self.sender.subscribe(),
            predicate,
        }
    }

    /// Subscribe to one event name, e.g. `"task:completed"`.
    pub fn subscribe_event(
        &self,
        name: &'static str,
    ) -> FilteredReceiver<impl Fn(&CouncilEvent) -> bool> {
        self.subscribe_filtered(move |event| event.name() == name)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&CouncilEvent) -> bool,
{
    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<CouncilEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if (self.predicate)(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{AgentId, TaskId};

    #[tokio::test]
    async fn test_publish_order_preserved() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        for i in 1..=3 {
            bus.publish(CouncilEvent::TaskSubmitted {
                task_id: TaskId::sequential(i),
                agent_id: AgentId::new("a"),
            });
        }

        for i in 1..=3 {
            match rx.recv().await.unwrap() {
                CouncilEvent::TaskSubmitted { task_id, .. } => {
                    assert_eq!(task_id, TaskId::sequential(i))
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let bus = EventBus::new(16);
        let mut completed = bus.subscribe_event("task:completed");

        bus.publish(CouncilEvent::TaskSubmitted {
            task_id: TaskId::new("task-1"),
            agent_id: AgentId::new("a"),
        });
        bus.publish(CouncilEvent::TaskCompleted {
            task_id: TaskId::new("task-1"),
            agent_id: AgentId::new("a"),
        });

        let event = completed.recv().await.unwrap();
        assert_eq!(event.name(), "task:completed");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(CouncilEvent::AgentRegistered {
            agent_id: AgentId::new("a"),
            max_concurrent_tasks: 2,
        });
        assert_eq!(bus.receiver_count(), 0);
    }
}
