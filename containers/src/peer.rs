use crate::{BlockId, Height};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Remote node as seen through its advertised headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub address: SocketAddr,
    pub height: Height,
    pub broadhash: Option<BlockId>,
    /// Recent block ids advertised by the peer, keyed by height.
    pub blocks_ids: BTreeMap<Height, BlockId>,
    pub banned: bool,
}

impl Peer {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            height: 1,
            broadhash: None,
            blocks_ids: BTreeMap::new(),
            banned: false,
        }
    }

    /// Check if the peer's pool holds `id` at `height`.
    pub fn has_block(&self, id: &BlockId, height: Height) -> bool {
        self.blocks_ids.get(&height) == Some(id)
    }

    /// Lowest height still present in the peer's pool.
    pub fn min_pooled_height(&self) -> Option<Height> {
        self.blocks_ids.keys().next().copied()
    }
}
