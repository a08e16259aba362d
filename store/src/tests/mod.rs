mod memory_tests;

use alloy_primitives::keccak256;
use containers::{Block, BlockId, Height, Transaction, TransactionId};

pub(crate) fn block_id(height: Height, fork: u8) -> BlockId {
    let mut seed = height.to_be_bytes().to_vec();
    seed.push(fork);
    BlockId(keccak256(seed))
}

pub(crate) fn create_test_block(height: Height, transactions: usize) -> Block {
    let id = block_id(height, 0);
    Block {
        id,
        height,
        previous_block: (height > 1).then(|| block_id(height - 1, 0)),
        created_at: height * 10,
        transactions: (0..transactions)
            .map(|index| Transaction {
                id: TransactionId(keccak256([id.0.as_slice(), &[index as u8][..]].concat())),
                block_id: Some(id),
                created_at: height * 10,
                relay: 0,
            })
            .collect(),
        reward: 0,
        relay: 0,
    }
}
