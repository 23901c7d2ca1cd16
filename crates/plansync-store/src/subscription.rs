//! Change-feed subscription system.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use plansync_core::ChangeEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

/// Publisher side of the change feed.
///
/// Every committed store mutation is broadcast to all subscribers, including
/// the client that issued it; subscribers filter to their own principal and
/// merge idempotently by id.
pub struct ChangeHub {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<ChangeEvent>,

    /// Ids of live subscriptions. Guarded by a std mutex so the handle can
    /// deregister itself in `Drop`.
    subscribers: Arc<Mutex<HashSet<Uuid>>>,
}

impl ChangeHub {
    /// Create a new hub with the given event backlog capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscribers: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Open a subscription scoped to one principal.
    pub fn subscribe(&self, owner: Uuid) -> Subscription {
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .insert(id);

        Subscription {
            id,
            owner,
            receiver: self.sender.subscribe(),
            registry: Arc::clone(&self.subscribers),
        }
    }

    /// Broadcast one event. Having no live subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live, owner-scoped view of the change feed.
///
/// The handle deregisters itself from the hub when dropped, so holding it for
/// the lifetime of a session gives scoped acquisition with guaranteed release.
pub struct Subscription {
    /// Unique id for this subscription.
    id: Uuid,

    /// Principal scope; events for other owners are skipped.
    owner: Uuid,

    /// Receiver for broadcast events.
    receiver: broadcast::Receiver<ChangeEvent>,

    /// Shared registry, for deregistration on drop.
    registry: Arc<Mutex<HashSet<Uuid>>>,
}

impl Subscription {
    /// The principal this subscription is scoped to.
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Wait for the next event in this owner's scope. Returns `None` once the
    /// hub is gone. A lagged receiver skips the missed backlog and keeps
    /// going; recovery from missed events is the reconciliation fetch.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.owner() == self.owner => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take one already-queued event without waiting, if any.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.owner() == self.owner => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed lagged, events dropped");
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use plansync_core::{ChangeKind, Plan};

    use super::*;

    fn plan_for(owner: Uuid) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            owner,
            title: "swim weekly".to_string(),
            description: String::new(),
            progress: 0,
            order: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscription_receives_own_scope_only() {
        let hub = ChangeHub::default();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut sub = hub.subscribe(owner);

        hub.publish(ChangeEvent::now(ChangeKind::Insert, plan_for(stranger)));
        let mine = plan_for(owner);
        hub.publish(ChangeEvent::now(ChangeKind::Insert, mine.clone()));

        let event = sub.next().await.unwrap();
        assert_eq!(event.plan_id(), mine.id);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_drop_deregisters() {
        let hub = ChangeHub::default();
        let sub = hub.subscribe(Uuid::new_v4());
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_try_next_on_empty_feed() {
        let hub = ChangeHub::default();
        let mut sub = hub.subscribe(Uuid::new_v4());
        assert!(sub.try_next().is_none());
    }
}
