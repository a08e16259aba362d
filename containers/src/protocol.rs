use crate::{BlockId, Height, Peer};
use serde::{Deserialize, Serialize};

/// Correlation id of an inbound peer request.
pub type RequestId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonBlockQuery {
    pub id: BlockId,
    pub height: Height,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonBlockAnswer {
    pub is_exist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<Peer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksQuery {
    pub height: Height,
    pub limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonBlocksExist {
    pub is_exist: bool,
}
