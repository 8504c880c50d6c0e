//! Boundaries to the host application: where snapshots are persisted and how
//! other views learn that a project changed.

pub mod events;
pub mod store;

pub use events::{ChangeCallback, ChangeEvent, EventBus, LocalEventBus, SubscriptionId};
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError};
