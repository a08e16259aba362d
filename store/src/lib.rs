//! In-memory window of recent blocks backed by a persistent repository.
//!
//! - **BlockMemoryStore**: bounded window of the newest blocks plus a header
//!   index and the transaction index of the windowed blocks
//! - **BlockRepository**: paginated persistent store consulted on misses
//! - **Loader**: sequential warm-up of the window at startup
pub mod error;
pub mod loader;
pub mod memory;
pub mod repository;
pub mod transaction_index;

pub use error::StoreError;
pub use loader::warm_up;
pub use memory::BlockMemoryStore;
pub use repository::{BlockRepository, InMemoryBlockRepository};
pub use transaction_index::TransactionIndex;

#[cfg(test)]
mod tests;
