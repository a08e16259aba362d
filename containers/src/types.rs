use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block height. The genesis block sits at height 1.
pub type Height = u64;

/// Opaque content hash identifying a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub B256);

/// Opaque content hash identifying a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub B256);

impl BlockId {
    pub const fn repeat_byte(byte: u8) -> Self {
        BlockId(B256::repeat_byte(byte))
    }
}

impl TransactionId {
    pub const fn repeat_byte(byte: u8) -> Self {
        TransactionId(B256::repeat_byte(byte))
    }
}

impl From<B256> for BlockId {
    fn from(hash: B256) -> Self {
        BlockId(hash)
    }
}

impl From<B256> for TransactionId {
    fn from(hash: B256) -> Self {
        TransactionId(hash)
    }
}

impl FromStr for BlockId {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s).map(BlockId)
    }
}

impl FromStr for TransactionId {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s).map(TransactionId)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
