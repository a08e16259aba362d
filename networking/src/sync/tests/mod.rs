
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

use alloy_primitives::keccak256;
use async_trait::async_trait;
use chain::{ChainConfig, EmissionSchedule};
use containers::{
    Block, BlockId, BlocksQuery, CommonBlockAnswer, CommonBlockQuery, CommonBlocksExist, Headers,
    Height, Peer, RequestId, ResponseEntity, Transaction,
};
use parking_lot::Mutex;
use store::{BlockMemoryStore, InMemoryBlockRepository};
use tokio::sync::Notify;

use crate::sync::{
    BlockApplier, HeadersRepository, NodeContext, PeerManager, PendingEventQueue, RoundService,
};
use crate::transport::PeerTransport;

pub(crate) fn block_id(height: Height, fork: u8) -> BlockId {
    let mut seed = height.to_be_bytes().to_vec();
    seed.push(fork);
    BlockId(keccak256(seed))
}

pub(crate) fn create_test_block(height: Height, fork: u8) -> Block {
    Block {
        id: block_id(height, fork),
        height,
        previous_block: (height > 1).then(|| block_id(height - 1, fork)),
        created_at: height * 10,
        ..Default::default()
    }
}

pub(crate) fn chain(heights: std::ops::RangeInclusive<Height>, fork: u8) -> Vec<Block> {
    heights.map(|height| create_test_block(height, fork)).collect()
}

pub(crate) fn address(port: u16) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 1], port))
}

pub(crate) fn create_peer(port: u16, height: Height, broadhash: Option<BlockId>) -> Peer {
    Peer {
        height,
        broadhash,
        ..Peer::new(address(port))
    }
}

pub(crate) fn create_peer_with_pool(
    port: u16,
    height: Height,
    broadhash: Option<BlockId>,
    pool: impl IntoIterator<Item = (Height, BlockId)>,
) -> Peer {
    Peer {
        blocks_ids: pool.into_iter().collect::<BTreeMap<_, _>>(),
        ..create_peer(port, height, broadhash)
    }
}

/// Transport with scripted answers that records everything sent through it.
///
/// The common-block answer is repeated for every request.
#[derive(Default)]
pub(crate) struct MockTransport {
    pub common_block_response: Mutex<Option<ResponseEntity<CommonBlockAnswer>>>,
    pub block_pages: Mutex<VecDeque<ResponseEntity<Vec<Block>>>>,
    pub common_block_requests: Mutex<Vec<CommonBlockQuery>>,
    pub block_requests: Mutex<Vec<BlocksQuery>>,
    pub sent_blocks: Mutex<Vec<(Vec<Block>, RequestId)>>,
    pub common_blocks_exist: Mutex<Vec<(CommonBlocksExist, RequestId)>>,
    pub headers: Mutex<Vec<Headers>>,
    pub new_blocks: Mutex<Vec<Block>>,
    pub transactions: Mutex<Vec<Transaction>>,
    pub peer_requests: Mutex<Vec<RequestId>>,
    /// When set, common-block requests wait for this gate to open.
    pub gate: Option<Arc<Notify>>,
    pub entered: Notify,
}

impl MockTransport {
    pub fn with_common_block(self, response: ResponseEntity<CommonBlockAnswer>) -> Self {
        *self.common_block_response.lock() = Some(response);
        self
    }

    pub fn with_pages(self, pages: impl IntoIterator<Item = ResponseEntity<Vec<Block>>>) -> Self {
        self.block_pages.lock().extend(pages);
        self
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn request_common_blocks(
        &self,
        _peer: &Peer,
        query: CommonBlockQuery,
    ) -> ResponseEntity<CommonBlockAnswer> {
        self.common_block_requests.lock().push(query);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.common_block_response
            .lock()
            .clone()
            .unwrap_or_else(|| ResponseEntity::failure(["no response scripted"]))
    }

    async fn request_blocks(&self, query: BlocksQuery, _peer: &Peer) -> ResponseEntity<Vec<Block>> {
        self.block_requests.lock().push(query);
        self.block_pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| ResponseEntity::ok(Vec::new()))
    }

    fn send_blocks(&self, blocks: Vec<Block>, _peer: &Peer, request_id: RequestId) {
        self.sent_blocks.lock().push((blocks, request_id));
    }

    fn send_common_blocks_exist(
        &self,
        answer: CommonBlocksExist,
        _peer: &Peer,
        request_id: RequestId,
    ) {
        self.common_blocks_exist.lock().push((answer, request_id));
    }

    fn send_headers(&self, headers: Headers) {
        self.headers.lock().push(headers);
    }

    fn send_new_block(&self, block: &Block) {
        self.new_blocks.lock().push(block.clone());
    }

    fn send_unconfirmed_transaction(&self, trs: &Transaction) {
        self.transactions.lock().push(trs.clone());
    }

    fn send_peers(&self, _peer: &Peer, request_id: RequestId) {
        self.peer_requests.lock().push(request_id);
    }
}

/// Applier accepting every block except the one at `fail_at`.
#[derive(Default)]
pub(crate) struct MockApplier {
    pub fail_at: Option<Height>,
    pub fail_undo: bool,
    pub applied: Mutex<Vec<Height>>,
    pub undone: Mutex<Vec<Height>>,
    /// When set, accepted blocks wait for this gate before counting as applied.
    pub gate: Option<Arc<Notify>>,
    pub entered: Notify,
}

#[async_trait]
impl BlockApplier for MockApplier {
    async fn receive_block(&self, block: &Block) -> ResponseEntity<()> {
        if self.fail_at == Some(block.height) {
            return ResponseEntity::failure([format!("invalid block at {}", block.height)]);
        }
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.applied.lock().push(block.height);
        ResponseEntity::ok(())
    }

    async fn undo_block(&self, block: &Block) -> ResponseEntity<()> {
        self.undone.lock().push(block.height);
        if self.fail_undo {
            return ResponseEntity::failure(["undo failed"]);
        }
        ResponseEntity::ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockRounds {
    pub restored: Mutex<Vec<u64>>,
}

impl RoundService for MockRounds {
    fn restore_to_slot(&self, slot: u64) {
        self.restored.lock().push(slot);
    }
}

pub(crate) struct TestNode {
    pub ctx: NodeContext,
    pub transport: Arc<MockTransport>,
    pub applier: Arc<MockApplier>,
    pub rounds: Arc<MockRounds>,
    pub events: Arc<PendingEventQueue>,
}

impl TestNode {
    pub fn new(config: ChainConfig, transport: MockTransport, applier: MockApplier) -> Self {
        let transport = Arc::new(transport);
        let applier = Arc::new(applier);
        let rounds = Arc::new(MockRounds::default());
        let events = Arc::new(PendingEventQueue::new());

        let ctx = NodeContext {
            emission: Arc::new(EmissionSchedule::new(&config.emission)),
            headers: Arc::new(HeadersRepository::new(&config, events.clone())),
            blocks: Arc::new(BlockMemoryStore::new(
                config.memory_blocks_limit,
                Arc::new(InMemoryBlockRepository::new()),
            )),
            peers: Arc::new(Mutex::new(PeerManager::new())),
            transport: transport.clone(),
            applier: applier.clone(),
            rounds: rounds.clone(),
            config: Arc::new(config),
        };

        Self {
            ctx,
            transport,
            applier,
            rounds,
            events,
        }
    }

    /// Push `blocks` into the window and advertise the last one.
    pub fn with_chain(self, blocks: Vec<Block>) -> Self {
        for block in blocks {
            self.ctx.headers.set_broadhash(Some(&block));
            self.ctx.headers.set_height(Some(&block));
            self.ctx.headers.add_block_id_in_pool(&block);
            self.ctx.blocks.push(block);
        }
        self
    }

    pub fn with_peers(self, peers: impl IntoIterator<Item = Peer>) -> Self {
        {
            let mut manager = self.ctx.peers.lock();
            for peer in peers {
                manager.add_peer(peer);
            }
        }
        self
    }
}
