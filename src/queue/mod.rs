//! Consultation queue: priority ordering, entry lifecycle and change notifications.

pub mod events;
pub mod scheduler;
pub mod types;

pub use events::EventBus;
pub use scheduler::QueueScheduler;
pub use types::{EnqueueOutcome, QueueEntry, QueueError, QueueEvent, QueueEventKind, QueueStats};
