//! Bounded in-memory window of the most recent blocks.
//!
//! The window holds at most `limit` blocks in push order. Pushing past the
//! limit evicts the oldest block together with its transactions; the
//! persistent repository remains the owner of evicted blocks and serves
//! reads that miss the window.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use containers::{Block, BlockHeader, BlockId, Height, TransactionId};
use parking_lot::RwLock;
use tracing::debug;

use crate::{BlockRepository, StoreError, TransactionIndex};

#[derive(Debug, Default)]
struct Window {
    /// Block ids, oldest first.
    order: VecDeque<BlockId>,
    blocks: HashMap<BlockId, Block>,
    /// One entry per block pushed, kept across eviction, removed on `pop`.
    headers: HashMap<BlockId, BlockHeader>,
    transactions: TransactionIndex,
}

impl Window {
    fn remove_back(&mut self) -> Option<Block> {
        let id = self.order.pop_back()?;
        let block = self.blocks.remove(&id)?;
        self.transactions.remove_block(&block);
        Some(block)
    }

    fn remove_front(&mut self) -> Option<Block> {
        let id = self.order.pop_front()?;
        let block = self.blocks.remove(&id)?;
        self.transactions.remove_block(&block);
        Some(block)
    }

    fn first(&self) -> Option<&Block> {
        self.order.front().and_then(|id| self.blocks.get(id))
    }

    fn last(&self) -> Option<&Block> {
        self.order.back().and_then(|id| self.blocks.get(id))
    }
}

/// Block storage combining the memory window with a persistent fallback.
///
/// All window mutations happen under one write lock, so readers never see
/// a pushed block without its header or an evicted block's transactions.
/// Locks are released before any repository call is awaited.
pub struct BlockMemoryStore {
    limit: usize,
    window: RwLock<Window>,
    repository: Arc<dyn BlockRepository>,
}

impl BlockMemoryStore {
    pub fn new(limit: usize, repository: Arc<dyn BlockRepository>) -> Self {
        Self {
            limit: limit.max(1),
            window: RwLock::new(Window::default()),
            repository,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append a block to the window.
    ///
    /// Returns the block evicted to keep the window within its limit.
    /// Pushing an id already in the window is ignored.
    pub fn push(&self, block: Block) -> Option<Block> {
        let mut window = self.window.write();

        if window.blocks.contains_key(&block.id) {
            debug!(id = %block.id, height = block.height, "Block already in memory window");
            return None;
        }

        window.headers.insert(block.id, block.header());
        window.transactions.add_block(&block);
        window.order.push_back(block.id);
        window.blocks.insert(block.id, block);

        if window.order.len() <= self.limit {
            return None;
        }

        let evicted = window.remove_front()?;
        debug!(
            id = %evicted.id,
            height = evicted.height,
            transactions = evicted.transactions.len(),
            "Evicted block from memory window"
        );
        Some(evicted)
    }

    /// Remove the tip block and its header index entry.
    pub fn pop(&self) -> Option<Block> {
        let mut window = self.window.write();
        let block = window.remove_back()?;
        window.headers.remove(&block.id);
        Some(block)
    }

    /// Remove the tip block, leaving the header index untouched.
    ///
    /// For callers that maintain header entries themselves.
    pub fn pop_last(&self) -> Option<Block> {
        self.window.write().remove_back()
    }

    /// Check the header index for `id`.
    pub fn has(&self, id: &BlockId) -> bool {
        self.window.read().headers.contains_key(id)
    }

    pub fn get_headers_by_id(&self, id: &BlockId) -> Option<BlockHeader> {
        self.window.read().headers.get(id).copied()
    }

    pub fn has_transaction(&self, id: &TransactionId) -> bool {
        self.window.read().transactions.contains(id)
    }

    pub fn transaction_count(&self) -> usize {
        self.window.read().transactions.len()
    }

    /// Block by id, from the window or else from the repository.
    pub async fn get_by_id(&self, id: &BlockId) -> Result<Block, StoreError> {
        let cached = self.window.read().blocks.get(id).cloned();
        if let Some(block) = cached {
            return Ok(block);
        }

        self.repository
            .get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Up to `limit` blocks at or above `height`.
    ///
    /// The window answers only when it reaches back to `height`; an older
    /// `height` is served by the repository so the page has no gap.
    pub async fn get_many(&self, limit: usize, height: Height) -> Result<Vec<Block>, StoreError> {
        let cached = self.get_memory_many(limit, height);
        if !cached.is_empty() {
            return Ok(cached);
        }

        let offset = usize::try_from(height.saturating_sub(1)).unwrap_or(usize::MAX);
        self.repository.get_many(limit, offset).await
    }

    fn get_memory_many(&self, limit: usize, height: Height) -> Vec<Block> {
        let window = self.window.read();
        if window.first().is_none_or(|first| first.height > height) {
            return Vec::new();
        }
        window
            .order
            .iter()
            .filter_map(|id| window.blocks.get(id))
            .filter(|block| block.height >= height)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_genesis(&self) -> Result<Block, StoreError> {
        self.window.read().first().cloned().ok_or(StoreError::NotFound)
    }

    pub fn get_last(&self) -> Result<Block, StoreError> {
        self.window.read().last().cloned().ok_or(StoreError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.window.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.read().order.is_empty()
    }
}

impl std::fmt::Debug for BlockMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockMemoryStore")
            .field("limit", &self.limit)
            .field("len", &self.len())
            .finish()
    }
}
