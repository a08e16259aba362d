use std::sync::Arc;

use chain::{ChainConfig, EmissionSchedule};
use parking_lot::Mutex;
use store::BlockMemoryStore;

use super::{
    collaborators::{BlockApplier, RoundService},
    headers::HeadersRepository,
    peer_manager::PeerManager,
};
use crate::transport::PeerTransport;

/// Process-wide node state and collaborators, built once at startup and
/// shared with every component.
#[derive(Clone)]
pub struct NodeContext {
    pub config: Arc<ChainConfig>,
    pub emission: Arc<EmissionSchedule>,
    pub headers: Arc<HeadersRepository>,
    pub blocks: Arc<BlockMemoryStore>,
    pub peers: Arc<Mutex<PeerManager>>,
    pub transport: Arc<dyn PeerTransport>,
    pub applier: Arc<dyn BlockApplier>,
    pub rounds: Arc<dyn RoundService>,
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("headers", &self.headers)
            .field("blocks", &self.blocks)
            .field("peers", &self.peers.lock().len())
            .finish()
    }
}
