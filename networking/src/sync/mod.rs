//! Chain synchronization for the sync node.
//!
//! This module keeps the local chain consistent with the peer network. It
//! includes:
//!
//! - **Headers**: Local height, broadhash and recent block-id pool advertised to peers
//! - **Peer Manager**: Tracks advertised peer headers and selects peers for negotiation
//! - **Consensus**: Estimates how much of the network agrees with the local chain
//! - **Sync Service**: Negotiates a common block, pulls missing blocks, rolls back and relays
//! - **Runner**: Drives the sync service on a fixed period
//!
//! ## Architecture
//!
//! The sync service operates on a periodic tick:
//! 1. Measure consensus on the local broadhash
//! 2. If it is below the minimum, pick a random peer on a different chain
//! 3. Negotiate a common block with that peer
//! 4. Pull blocks page by page from the common block and apply them in order
//! 5. If no common block exists, roll back the local tip and try again next tick
//!
//! ## State Machine
//!
//! - **IN_SYNC**: Local tip is trusted
//! - **CHECKING_CONSENSUS**: Measuring peer agreement
//! - **NEGOTIATING_COMMON_BLOCK**: Looking for the fork point
//! - **PULLING_BLOCKS**: Applying blocks from the negotiated peer
//! - **ROLLING_BACK**: Discarding the local tip

pub mod collaborators;
pub mod consensus;
pub mod context;
pub mod error;
pub mod headers;
pub mod peer_manager;
pub mod runner;
pub mod service;
pub mod states;

pub use collaborators::{BlockApplier, EventQueue, PendingEventQueue, RoundService};
pub use consensus::ConsensusTracker;
pub use context::NodeContext;
pub use error::SyncError;
pub use headers::{HeadersRepository, HeadersUpdate};
pub use peer_manager::PeerManager;
pub use runner::run_sync_loop;
pub use service::{SyncService, SyncStats, TickOutcome};
pub use states::SyncState;

#[cfg(test)]
mod tests;
