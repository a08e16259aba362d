//! Local chain headers advertised to peers.
//!
//! Holds the node's height, broadhash and a bounded pool of recent block
//! ids, plus the synchronization flag whose true -> false edge flushes the
//! deferred event queue.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chain::ChainConfig;
use containers::{Block, BlockId, FullHeaders, Headers, Height};
use parking_lot::RwLock;
use tracing::debug;

use super::collaborators::EventQueue;

/// Partial header update. Absent or zero fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadersUpdate {
    pub height: Option<Height>,
    pub broadhash: Option<BlockId>,
    pub min_version: Option<u32>,
}

#[derive(Debug, Clone)]
struct LocalHeaders {
    height: Height,
    broadhash: Option<BlockId>,
    min_version: u32,
    blocks_ids: BTreeMap<Height, BlockId>,
}

/// Handshake metadata that never changes after startup.
#[derive(Debug, Clone)]
struct NodeInfo {
    os: String,
    version: u32,
    port: u16,
    ip: String,
}

pub struct HeadersRepository {
    local: RwLock<LocalHeaders>,
    info: NodeInfo,
    pool_limit: usize,
    synchronization: AtomicBool,
    event_queue: Arc<dyn EventQueue>,
}

impl HeadersRepository {
    pub fn new(config: &ChainConfig, event_queue: Arc<dyn EventQueue>) -> Self {
        Self {
            local: RwLock::new(LocalHeaders {
                height: 1,
                broadhash: None,
                min_version: config.min_version,
                blocks_ids: BTreeMap::new(),
            }),
            info: NodeInfo {
                os: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
                version: config.current_block_version,
                port: config.socket_port,
                ip: config.public_host.clone(),
            },
            pool_limit: config.block_id_pool_limit.max(1),
            synchronization: AtomicBool::new(false),
            event_queue,
        }
    }

    pub fn height(&self) -> Height {
        self.local.read().height
    }

    pub fn broadhash(&self) -> Option<BlockId> {
        self.local.read().broadhash
    }

    pub fn min_version(&self) -> u32 {
        self.local.read().min_version
    }

    /// Field-wise merge of `data` into the current headers.
    pub fn update(&self, data: HeadersUpdate) {
        let mut local = self.local.write();
        if let Some(broadhash) = data.broadhash {
            local.broadhash = Some(broadhash);
        }
        if let Some(height) = data.height.filter(|height| *height > 0) {
            local.height = height;
        }
        if let Some(min_version) = data.min_version.filter(|version| *version > 0) {
            local.min_version = min_version;
        }
    }

    pub fn set_broadhash(&self, block: Option<&Block>) {
        self.local.write().broadhash = block.map(|block| block.id);
    }

    /// Set the height from `block`, defaulting to genesis height.
    pub fn set_height(&self, block: Option<&Block>) {
        self.local.write().height = block
            .map(|block| block.height)
            .filter(|height| *height > 0)
            .unwrap_or(1);
    }

    /// Record `block` in the block-id pool.
    ///
    /// Re-inserting an occupied height first drops every entry at or above
    /// it, so ids from an abandoned fork never linger. The lowest height is
    /// evicted once the pool grows past its limit.
    pub fn add_block_id_in_pool(&self, block: &Block) {
        let mut local = self.local.write();

        if local.blocks_ids.contains_key(&block.height) {
            local.blocks_ids.retain(|height, _| *height < block.height);
        }
        local.blocks_ids.insert(block.height, block.id);

        if local.blocks_ids.len() > self.pool_limit {
            local.blocks_ids.pop_first();
        }
    }

    /// Drop every pool entry at or above `height`.
    pub fn clear_pool_by_height(&self, height: Height) {
        self.local
            .write()
            .blocks_ids
            .retain(|pooled, _| *pooled < height);
    }

    pub fn pool_snapshot(&self) -> BTreeMap<Height, BlockId> {
        self.local.read().blocks_ids.clone()
    }

    pub fn get_headers(&self) -> Headers {
        let local = self.local.read();
        Headers {
            height: local.height,
            broadhash: local.broadhash,
        }
    }

    pub fn get_full_headers(&self) -> FullHeaders {
        let local = self.local.read();
        FullHeaders {
            os: self.info.os.clone(),
            version: self.info.version,
            port: self.info.port,
            min_version: local.min_version,
            ip: self.info.ip.clone(),
            blocks_ids: local
                .blocks_ids
                .iter()
                .map(|(height, id)| (*height, *id))
                .collect(),
            height: local.height,
            broadhash: local.broadhash,
        }
    }

    pub fn synchronization(&self) -> bool {
        self.synchronization.load(Ordering::Acquire)
    }

    /// Store the synchronization flag.
    ///
    /// Only a true -> false transition drains the event queue; the number
    /// of drained events is returned for that edge and `None` otherwise.
    pub fn set_synchronization(&self, value: bool) -> Option<usize> {
        let previous = self.synchronization.swap(value, Ordering::AcqRel);
        debug!(previous = previous, value = value, "Set synchronization flag");

        if previous && !value {
            let drained = self.event_queue.process();
            debug!(drained = drained, "Drained deferred events after synchronization");
            return Some(drained);
        }
        None
    }
}

impl std::fmt::Debug for HeadersRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadersRepository")
            .field("headers", &self.get_headers())
            .field("synchronization", &self.synchronization())
            .finish()
    }
}
