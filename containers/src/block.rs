use crate::{BlockId, Height, TransactionId};
use serde::{Deserialize, Serialize};

/// Transaction reference carried inside a block.
///
/// Only the fields the sync layer needs are modelled; balances, assets and
/// signatures belong to the transaction logic.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub block_id: Option<BlockId>,
    pub created_at: u64,
    /// Hop count of this transaction across the peer graph.
    pub relay: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub height: Height,
    pub previous_block: Option<BlockId>,
    /// Seconds since the network epoch.
    pub created_at: u64,
    pub transactions: Vec<Transaction>,
    /// Forging reward, fixed by the emission schedule for this height.
    pub reward: u64,
    /// Hop count of this block across the peer graph.
    pub relay: u32,
}

impl Block {
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            id: self.id,
            height: self.height,
        }
    }

    pub fn transaction_ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.transactions.iter().map(|trs| trs.id)
    }
}

/// Lightweight header index entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: BlockId,
    pub height: Height,
}
