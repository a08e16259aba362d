use async_trait::async_trait;
use containers::{Block, BlockId, Height};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::StoreError;

/// Persistent block store.
///
/// Pages are ordered by height. Callers stop paginating once a page is
/// shorter than the requested limit.
#[async_trait]
pub trait BlockRepository: Send + Sync {
    async fn get_many(&self, limit: usize, offset: usize) -> Result<Vec<Block>, StoreError>;

    async fn get_by_id(&self, id: &BlockId) -> Result<Option<Block>, StoreError>;

    async fn get_count(&self) -> Result<usize, StoreError>;
}

/// Repository kept entirely in memory, ordered by height.
#[derive(Debug, Default)]
pub struct InMemoryBlockRepository {
    blocks: RwLock<BTreeMap<Height, Block>>,
    heights: RwLock<HashMap<BlockId, Height>>,
}

impl InMemoryBlockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let repository = Self::new();
        for block in blocks {
            repository.save(block);
        }
        repository
    }

    /// Store a block, replacing whatever was saved at its height.
    pub fn save(&self, block: Block) {
        let mut blocks = self.blocks.write();
        let mut heights = self.heights.write();
        if let Some(replaced) = blocks.insert(block.height, block.clone()) {
            heights.remove(&replaced.id);
        }
        heights.insert(block.id, block.height);
    }

    /// Delete every block at or above `height`.
    pub fn truncate(&self, height: Height) {
        let mut blocks = self.blocks.write();
        let mut heights = self.heights.write();
        for (_, block) in blocks.split_off(&height) {
            heights.remove(&block.id);
        }
    }
}

#[async_trait]
impl BlockRepository for InMemoryBlockRepository {
    async fn get_many(&self, limit: usize, offset: usize) -> Result<Vec<Block>, StoreError> {
        Ok(self
            .blocks
            .read()
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &BlockId) -> Result<Option<Block>, StoreError> {
        let Some(height) = self.heights.read().get(id).copied() else {
            return Ok(None);
        };
        Ok(self.blocks.read().get(&height).cloned())
    }

    async fn get_count(&self) -> Result<usize, StoreError> {
        Ok(self.blocks.read().len())
    }
}
