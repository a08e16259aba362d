use crate::{BlockId, Height};
use serde::{Deserialize, Serialize};

/// Compact header snapshot broadcast after every applied block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headers {
    pub height: Height,
    pub broadhash: Option<BlockId>,
}

/// Header snapshot used during the peer handshake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullHeaders {
    pub os: String,
    pub version: u32,
    pub port: u16,
    pub min_version: u32,
    pub ip: String,
    /// Pool entries in ascending height order.
    pub blocks_ids: Vec<(Height, BlockId)>,
    pub height: Height,
    pub broadhash: Option<BlockId>,
}
