use anyhow::{Result, anyhow};
use async_trait::async_trait;
use containers::{
    Block, BlocksQuery, CommonBlockAnswer, CommonBlockQuery, CommonBlocksExist, Headers, Peer,
    RequestId, ResponseEntity, Transaction,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};

use crate::types::OutboundSyncMessage;

/// Peer protocol as seen by the sync layer.
///
/// Requests are awaited and answer with a [`ResponseEntity`]. Sends are
/// fire-and-forget.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn request_common_blocks(
        &self,
        peer: &Peer,
        query: CommonBlockQuery,
    ) -> ResponseEntity<CommonBlockAnswer>;

    async fn request_blocks(&self, query: BlocksQuery, peer: &Peer) -> ResponseEntity<Vec<Block>>;

    fn send_blocks(&self, blocks: Vec<Block>, peer: &Peer, request_id: RequestId);

    fn send_common_blocks_exist(
        &self,
        answer: CommonBlocksExist,
        peer: &Peer,
        request_id: RequestId,
    );

    fn send_headers(&self, headers: Headers);

    fn send_new_block(&self, block: &Block);

    fn send_unconfirmed_transaction(&self, trs: &Transaction);

    fn send_peers(&self, peer: &Peer, request_id: RequestId);
}

/// Transport handing every message to the network task over a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<OutboundSyncMessage>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::UnboundedSender<OutboundSyncMessage>) -> Self {
        Self { sender }
    }

    fn dispatch(&self, message: OutboundSyncMessage) -> Result<()> {
        trace!(message = %message, "Dispatching sync message");
        self.sender
            .send(message)
            .map_err(|err| anyhow!("failed to send message to network: {err}"))
    }

    fn notify(&self, message: OutboundSyncMessage) {
        if let Err(err) = self.dispatch(message) {
            warn!(error = %err, "Dropped outbound sync message");
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<ResponseEntity<T>>) -> OutboundSyncMessage,
    ) -> ResponseEntity<T> {
        let (reply, response) = oneshot::channel();

        if let Err(err) = self.dispatch(build(reply)) {
            return ResponseEntity::failure([err.to_string()]);
        }

        match response.await {
            Ok(response) => response,
            Err(_) => ResponseEntity::failure(["peer request dropped without a response"]),
        }
    }
}

#[async_trait]
impl PeerTransport for ChannelTransport {
    async fn request_common_blocks(
        &self,
        peer: &Peer,
        query: CommonBlockQuery,
    ) -> ResponseEntity<CommonBlockAnswer> {
        let peer = peer.clone();
        self.request(|reply| OutboundSyncMessage::RequestCommonBlocks { peer, query, reply })
            .await
    }

    async fn request_blocks(&self, query: BlocksQuery, peer: &Peer) -> ResponseEntity<Vec<Block>> {
        let peer = peer.clone();
        self.request(|reply| OutboundSyncMessage::RequestBlocks { peer, query, reply })
            .await
    }

    fn send_blocks(&self, blocks: Vec<Block>, peer: &Peer, request_id: RequestId) {
        self.notify(OutboundSyncMessage::SendBlocks {
            peer: peer.clone(),
            request_id,
            blocks,
        });
    }

    fn send_common_blocks_exist(
        &self,
        answer: CommonBlocksExist,
        peer: &Peer,
        request_id: RequestId,
    ) {
        self.notify(OutboundSyncMessage::SendCommonBlocksExist {
            peer: peer.clone(),
            request_id,
            answer,
        });
    }

    fn send_headers(&self, headers: Headers) {
        self.notify(OutboundSyncMessage::SendHeaders(headers));
    }

    fn send_new_block(&self, block: &Block) {
        self.notify(OutboundSyncMessage::SendNewBlock(block.clone()));
    }

    fn send_unconfirmed_transaction(&self, trs: &Transaction) {
        self.notify(OutboundSyncMessage::SendUnconfirmedTransaction(trs.clone()));
    }

    fn send_peers(&self, peer: &Peer, request_id: RequestId) {
        self.notify(OutboundSyncMessage::SendPeers {
            peer: peer.clone(),
            request_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use containers::BlockId;
    use std::net::SocketAddr;

    fn peer() -> Peer {
        Peer::new(SocketAddr::from(([127, 0, 0, 1], 7008)))
    }

    #[tokio::test]
    async fn test_request_round_trips_through_channel() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let transport = ChannelTransport::new(sender);

        let responder = tokio::spawn(async move {
            match receiver.recv().await {
                Some(OutboundSyncMessage::RequestCommonBlocks { reply, query, .. }) => {
                    assert_eq!(query.height, 7);
                    let _ = reply.send(ResponseEntity::ok(CommonBlockAnswer {
                        is_exist: true,
                        peer: None,
                    }));
                }
                other => panic!("unexpected message: {other:?}"),
            }
        });

        let response = transport
            .request_common_blocks(
                &peer(),
                CommonBlockQuery {
                    id: BlockId::repeat_byte(1),
                    height: 7,
                },
            )
            .await;

        responder.await.unwrap();
        assert!(response.success);
        assert!(response.data.unwrap().is_exist);
    }

    #[tokio::test]
    async fn test_request_fails_when_network_is_gone() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let transport = ChannelTransport::new(sender);

        let response = transport
            .request_blocks(BlocksQuery { height: 1, limit: 10 }, &peer())
            .await;

        assert!(!response.success);
        assert_eq!(response.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_reply_is_a_failure() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let transport = ChannelTransport::new(sender);

        let responder = tokio::spawn(async move {
            let message = receiver.recv().await;
            drop(message);
        });

        let response = transport
            .request_blocks(BlocksQuery { height: 1, limit: 10 }, &peer())
            .await;
        responder.await.unwrap();

        assert!(!response.success);
    }
}
