//! Collaborators the sync layer depends on but does not implement.

use std::fmt;

use async_trait::async_trait;
use containers::{Block, ResponseEntity};
use parking_lot::Mutex;
use tracing::debug;

/// Block validation and state application.
#[async_trait]
pub trait BlockApplier: Send + Sync {
    /// Validate a received block and apply it to account and round state.
    async fn receive_block(&self, block: &Block) -> ResponseEntity<()>;

    /// Revert the effects of a block that was removed from the tip.
    async fn undo_block(&self, block: &Block) -> ResponseEntity<()>;
}

/// Forging round bookkeeping.
pub trait RoundService: Send + Sync {
    fn restore_to_slot(&self, slot: u64);
}

/// Queue of events deferred while the node is synchronizing.
pub trait EventQueue: Send + Sync {
    /// Run every pending event and return how many ran.
    fn process(&self) -> usize;
}

type PendingEvent = Box<dyn FnOnce() + Send>;

/// In-process [`EventQueue`] holding deferred closures.
#[derive(Default)]
pub struct PendingEventQueue {
    pool: Mutex<Vec<PendingEvent>>,
}

impl PendingEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl FnOnce() + Send + 'static) {
        self.pool.lock().push(Box::new(event));
    }

    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }
}

impl EventQueue for PendingEventQueue {
    fn process(&self) -> usize {
        let events = std::mem::take(&mut *self.pool.lock());
        let count = events.len();

        debug!(events = count, "Processing deferred events");

        for event in events {
            event();
        }
        count
    }
}

impl fmt::Debug for PendingEventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEventQueue")
            .field("pending", &self.len())
            .finish()
    }
}
