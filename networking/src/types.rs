use async_trait::async_trait;
use containers::{
    Block, BlocksQuery, CommonBlockAnswer, CommonBlockQuery, CommonBlocksExist, Headers, Peer,
    RequestId, ResponseEntity, Transaction,
};
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};

/// Message handed from the sync layer to the peer network.
///
/// Requests carry a reply channel; everything else is fire-and-forget.
#[derive(Debug)]
pub enum OutboundSyncMessage {
    RequestCommonBlocks {
        peer: Peer,
        query: CommonBlockQuery,
        reply: oneshot::Sender<ResponseEntity<CommonBlockAnswer>>,
    },
    RequestBlocks {
        peer: Peer,
        query: BlocksQuery,
        reply: oneshot::Sender<ResponseEntity<Vec<Block>>>,
    },
    SendBlocks {
        peer: Peer,
        request_id: RequestId,
        blocks: Vec<Block>,
    },
    SendCommonBlocksExist {
        peer: Peer,
        request_id: RequestId,
        answer: CommonBlocksExist,
    },
    SendPeers {
        peer: Peer,
        request_id: RequestId,
    },
    SendHeaders(Headers),
    SendNewBlock(Block),
    SendUnconfirmedTransaction(Transaction),
}

impl Display for OutboundSyncMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboundSyncMessage::RequestCommonBlocks { peer, query, .. } => write!(
                f,
                "RequestCommonBlocks(peer={}, height={})",
                peer.address, query.height
            ),
            OutboundSyncMessage::RequestBlocks { peer, query, .. } => write!(
                f,
                "RequestBlocks(peer={}, height={}, limit={})",
                peer.address, query.height, query.limit
            ),
            OutboundSyncMessage::SendBlocks { peer, blocks, .. } => {
                write!(f, "SendBlocks(peer={}, count={})", peer.address, blocks.len())
            }
            OutboundSyncMessage::SendCommonBlocksExist { peer, answer, .. } => write!(
                f,
                "SendCommonBlocksExist(peer={}, exist={})",
                peer.address, answer.is_exist
            ),
            OutboundSyncMessage::SendPeers { peer, .. } => {
                write!(f, "SendPeers(peer={})", peer.address)
            }
            OutboundSyncMessage::SendHeaders(headers) => {
                write!(f, "SendHeaders(height={})", headers.height)
            }
            OutboundSyncMessage::SendNewBlock(block) => {
                write!(f, "SendNewBlock(height={}, relay={})", block.height, block.relay)
            }
            OutboundSyncMessage::SendUnconfirmedTransaction(trs) => {
                write!(f, "SendUnconfirmedTransaction(id={}, relay={})", trs.id, trs.relay)
            }
        }
    }
}

#[async_trait]
pub trait P2pRequestSource<T>: Send {
    async fn recv(&mut self) -> Option<T>;
}

#[async_trait]
impl<T: Send + 'static> P2pRequestSource<T> for mpsc::UnboundedReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}
