use containers::{Block, BlockId, TransactionId};
use std::collections::HashMap;

/// Index of the transactions contained in windowed blocks.
#[derive(Debug, Default, Clone)]
pub struct TransactionIndex {
    transactions: HashMap<TransactionId, BlockId>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every transaction of `block`.
    pub fn add_block(&mut self, block: &Block) {
        for id in block.transaction_ids() {
            self.transactions.insert(id, block.id);
        }
    }

    /// Drop every transaction of `block` from the index.
    pub fn remove_block(&mut self, block: &Block) {
        for id in block.transaction_ids() {
            self.transactions.remove(&id);
        }
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.transactions.contains_key(id)
    }

    /// Block holding the transaction.
    pub fn block_of(&self, id: &TransactionId) -> Option<BlockId> {
        self.transactions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
