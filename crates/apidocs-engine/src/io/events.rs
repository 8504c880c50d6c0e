use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::{ProjectId, SnapshotId};

/// A project gained a new newest snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub project: ProjectId,
    pub snapshot_id: SnapshotId,
}

pub type ChangeCallback = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change notifications between views of the same project
///
/// The host wires this to whatever transport it has (another tab, a
/// websocket, a database change feed). The engine only publishes.
pub trait EventBus: Send + Sync {
    fn on_change(&self, project: &ProjectId, callback: ChangeCallback) -> SubscriptionId;

    /// Returns false when the subscription was already gone
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn publish(&self, event: &ChangeEvent);
}

type Subscriber = (SubscriptionId, ProjectId, Arc<dyn Fn(&ChangeEvent) + Send + Sync>);

/// In-process event bus
#[derive(Default)]
pub struct LocalEventBus {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for LocalEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("LocalEventBus").field("subscribers", &count).finish()
    }
}

impl EventBus for LocalEventBus {
    fn on_change(&self, project: &ProjectId, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, project.clone(), Arc::from(callback)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _, _)| *sub_id != id);
        subscribers.len() != before
    }

    fn publish(&self, event: &ChangeEvent) {
        // Call outside the lock so callbacks may subscribe or unsubscribe
        let callbacks: Vec<_> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, project, _)| *project == event.project)
            .map(|(_, _, callback)| Arc::clone(callback))
            .collect();

        log::debug!(
            "Publishing change {} for {} to {} subscribers",
            event.snapshot_id,
            event.project,
            callbacks.len()
        );
        for callback in callbacks {
            callback(event);
        }
    }
}
