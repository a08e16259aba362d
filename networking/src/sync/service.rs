//! Sync coordinator driving consensus checks, common-block negotiation,
//! block pulls, rollback and relay.
//!
//! Every step runs one at a time per coordinator. Peer and repository calls
//! are awaited in order; no lock is held across an await.

use containers::{
    Block, BlockHeader, BlocksQuery, CommonBlockAnswer, CommonBlockQuery, CommonBlocksExist, Peer,
    RequestId, Transaction,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::{
    consensus::ConsensusTracker, context::NodeContext, error::SyncError,
    peer_manager::PeerManager, states::SyncState,
};

const SAVE_REQUESTED_BLOCKS_FAILED: &str = "failed to save requested blocks";

/// Result of one periodic tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The local tip is trusted.
    InSync { consensus: f64 },
    /// A common block was found and the pull finished.
    Synced { applied: usize },
    /// The negotiated peer shares no ancestor with the local tip. The caller
    /// decides how far to roll back.
    NoCommonBlock,
}

/// Sync service coordinating all sync operations.
pub struct SyncService {
    ctx: NodeContext,
    consensus: ConsensusTracker,
    state: Mutex<SyncState>,
    tick_guard: tokio::sync::Mutex<()>,
    /// Bumped by every rollback; a pull stops once it sees a newer value.
    pull_generation: AtomicU64,
}

impl SyncService {
    pub fn new(ctx: NodeContext) -> Self {
        let consensus = ConsensusTracker::new(ctx.config.min_consensus);
        Self {
            ctx,
            consensus,
            state: Mutex::new(SyncState::default()),
            tick_guard: tokio::sync::Mutex::new(()),
            pull_generation: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    /// Get current sync state.
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Move to `target`, returning whether the machine is now in it.
    fn transition(&self, target: SyncState) -> bool {
        let mut state = self.state.lock();
        if *state == target {
            return true;
        }
        if !state.can_transition_to(target) {
            warn!(from = ?*state, to = ?target, "Invalid state transition attempted");
            return false;
        }
        match target {
            SyncState::RollingBack => warn!(from = ?*state, "Transitioning to ROLLING_BACK"),
            _ => info!(from = ?*state, to = ?target, "Sync state transition"),
        }
        *state = target;
        true
    }

    fn active_peers(&self) -> Vec<Peer> {
        self.ctx.peers.lock().active_peers().cloned().collect()
    }

    /// Agreement of non-banned peers with the local broadhash, in percent.
    pub fn get_consensus(&self) -> f64 {
        let peers = self.active_peers();
        let broadhash = self.ctx.headers.broadhash();
        self.consensus.consensus(&peers, broadhash.as_ref())
    }

    pub fn get_my_consensus(&self) -> bool {
        self.consensus.is_reached(self.get_consensus())
    }

    /// Agreement of non-banned peers on `block`, in percent.
    pub fn get_block_consensus(&self, block: &BlockHeader) -> f64 {
        let peers = self.active_peers();
        self.consensus.block_consensus(&peers, block)
    }

    pub fn check_block_consensus(&self, block: &BlockHeader) -> bool {
        self.consensus.is_reached(self.get_block_consensus(block))
    }

    /// Periodic tick.
    ///
    /// Checks consensus and, when the local tip is not trusted, negotiates a
    /// common block and pulls the missing blocks. Always ends in `InSync`.
    /// Returns [`SyncError::Busy`] if a tick of this coordinator is still
    /// running.
    pub async fn tick(&self) -> Result<TickOutcome, SyncError> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            debug!("Previous sync tick still running");
            return Err(SyncError::Busy);
        };

        self.transition(SyncState::CheckingConsensus);

        let last_block = match self.ctx.blocks.get_last() {
            Ok(block) => block,
            Err(err) => {
                self.transition(SyncState::InSync);
                return Err(err.into());
            }
        };

        let consensus = self.get_consensus();
        if self.consensus.is_reached(consensus) || last_block.height == 1 {
            debug!(
                consensus = consensus,
                height = last_block.height,
                "Local chain is consistent with peers"
            );
            self.transition(SyncState::InSync);
            return Ok(TickOutcome::InSync { consensus });
        }

        info!(
            consensus = consensus,
            min_consensus = self.consensus.min_consensus(),
            height = last_block.height,
            "Consensus below minimum, looking for common block"
        );

        self.transition(SyncState::NegotiatingCommonBlock);
        self.ctx.headers.set_synchronization(true);

        let outcome = self.synchronize(&last_block).await;

        self.transition(SyncState::InSync);
        self.ctx.headers.set_synchronization(false);

        if let Err(err) = &outcome {
            warn!(errors = ?err.errors(), "Synchronization failed");
        }
        outcome
    }

    async fn synchronize(&self, last_block: &Block) -> Result<TickOutcome, SyncError> {
        let generation = self.pull_generation.load(Ordering::Acquire);

        let answer = self.check_common_block(last_block).await?;
        let Some(peer) = answer.peer.filter(|_| answer.is_exist) else {
            info!(height = last_block.height, "No common block with peer");
            return Ok(TickOutcome::NoCommonBlock);
        };

        self.transition(SyncState::PullingBlocks);
        let applied = self.pull_blocks(&peer, generation).await?;

        info!(
            peer = %peer.address,
            applied = applied,
            height = self.ctx.headers.height(),
            "Finished pulling blocks"
        );
        Ok(TickOutcome::Synced { applied })
    }

    /// Find a peer sharing the local last block.
    ///
    /// Picks a random eligible peer. If the network already agrees on
    /// `last_block` that peer is used directly; otherwise, when the peer's
    /// pool starts above `last_block`, it is asked whether it knows the block.
    pub async fn check_common_block(
        &self,
        last_block: &Block,
    ) -> Result<CommonBlockAnswer, SyncError> {
        let broadhash = self.ctx.headers.broadhash();
        let filtered = self
            .ctx
            .peers
            .lock()
            .get_peers_by_filter(last_block.height, broadhash.as_ref());

        let Some(peer) = PeerManager::get_random_peer(&filtered).cloned() else {
            return Err(SyncError::NotEnoughPeers);
        };

        debug!(
            peer = %peer.address,
            candidates = filtered.len(),
            "Selected peer for common block negotiation"
        );

        if self.check_block_consensus(&last_block.header()) || last_block.height == 1 {
            return Ok(CommonBlockAnswer {
                is_exist: true,
                peer: Some(peer),
            });
        }

        let min_height = peer.min_pooled_height();
        if min_height.is_none_or(|min_height| min_height > last_block.height) {
            let query = CommonBlockQuery {
                id: last_block.id,
                height: last_block.height,
            };
            let response = self.ctx.transport.request_common_blocks(&peer, query).await;

            if !response.success {
                let mut errors = vec!["response from peer not success".to_string()];
                errors.extend(response.errors);
                return Err(SyncError::PeerResponseFailure(errors));
            }

            if let Some(CommonBlockAnswer {
                is_exist: true,
                peer: responder,
            }) = response.data
            {
                return Ok(CommonBlockAnswer {
                    is_exist: true,
                    peer: Some(responder.unwrap_or(peer)),
                });
            }
        }

        Ok(CommonBlockAnswer {
            is_exist: false,
            peer: None,
        })
    }

    /// Request and apply pages of blocks from `peer`, starting at the local tip.
    async fn pull_blocks(&self, peer: &Peer, generation: u64) -> Result<usize, SyncError> {
        let limit = self.ctx.config.request_block_limit;
        let mut applied = 0;

        loop {
            let last_block = self.ctx.blocks.get_last()?;
            let response = self.request_blocks(&last_block, peer).await;
            self.ensure_generation(generation)?;

            let page = response.into_result().map_err(SyncError::PeerResponseFailure)?;
            let page_len = page.len();

            debug!(
                peer = %peer.address,
                from_height = last_block.height,
                blocks = page_len,
                "Received requested blocks"
            );

            let progressed = self.save_requested_blocks(page, generation).await?;
            applied += progressed;

            if page_len < limit || progressed == 0 {
                return Ok(applied);
            }
        }
    }

    pub async fn request_blocks(
        &self,
        last_block: &Block,
        peer: &Peer,
    ) -> containers::ResponseEntity<Vec<Block>> {
        let query = BlocksQuery {
            height: last_block.height,
            limit: self.ctx.config.request_block_limit,
        };
        self.ctx.transport.request_blocks(query, peer).await
    }

    /// Apply pulled blocks one by one, in order.
    ///
    /// Blocks already known locally are skipped. The first failure stops the
    /// batch; blocks applied before it stay applied.
    pub async fn save_requested_blocks(
        &self,
        blocks: Vec<Block>,
        generation: u64,
    ) -> Result<usize, SyncError> {
        let mut applied = 0;

        for mut block in blocks {
            self.ensure_generation(generation)?;

            if self.ctx.blocks.has(&block.id) {
                debug!(id = %block.id, height = block.height, "Skipping known block");
                continue;
            }

            self.ctx
                .rounds
                .restore_to_slot(self.ctx.config.slot_number(block.created_at));

            let expected_reward = self.ctx.emission.reward_at(block.height)?;
            if block.reward != expected_reward {
                return Err(SyncError::BlockApplicationFailure(vec![
                    format!(
                        "block {} at height {} carries reward {}, expected {}",
                        block.id, block.height, block.reward, expected_reward
                    ),
                    SAVE_REQUESTED_BLOCKS_FAILED.to_string(),
                ]));
            }

            let response = self.ctx.applier.receive_block(&block).await;
            if !response.success {
                let mut errors = response.errors;
                errors.push(SAVE_REQUESTED_BLOCKS_FAILED.to_string());
                return Err(SyncError::BlockApplicationFailure(errors));
            }
            if let Err(err) = self.ensure_generation(generation) {
                let undo = self.ctx.applier.undo_block(&block).await;
                if !undo.success {
                    warn!(id = %block.id, errors = ?undo.errors, "Failed to undo abandoned block");
                }
                return Err(err);
            }

            self.ctx.blocks.push(block.clone());
            self.update_headers(&block);
            self.send_new_block(&mut block);
            applied += 1;
        }

        Ok(applied)
    }

    /// Current pull generation, for callers driving `save_requested_blocks`.
    pub fn pull_generation(&self) -> u64 {
        self.pull_generation.load(Ordering::Acquire)
    }

    fn ensure_generation(&self, generation: u64) -> Result<(), SyncError> {
        if self.pull_generation.load(Ordering::Acquire) != generation {
            warn!("Rollback started, abandoning block pull");
            return Err(SyncError::Abandoned);
        }
        Ok(())
    }

    /// Advertise `last_block` as the new tip.
    pub fn update_headers(&self, last_block: &Block) {
        let headers = &self.ctx.headers;
        headers.set_broadhash(Some(last_block));
        headers.add_block_id_in_pool(last_block);
        headers.set_height(Some(last_block));
        self.ctx.transport.send_headers(headers.get_headers());
    }

    /// Discard the local tip.
    ///
    /// Any pull in flight is abandoned. An empty window leaves nothing to
    /// roll back and is not an error. Returns the removed block.
    pub async fn rollback(&self) -> Option<Block> {
        self.pull_generation.fetch_add(1, Ordering::AcqRel);
        // A tick still negotiating keeps its state and ends on its own.
        let rolling_back = self.transition(SyncState::RollingBack);

        let Some(removed) = self.ctx.blocks.pop() else {
            debug!("Nothing to roll back");
            if rolling_back {
                self.transition(SyncState::InSync);
            }
            return None;
        };

        let headers = &self.ctx.headers;
        headers.clear_pool_by_height(removed.height);

        match self.ctx.blocks.get_last() {
            Ok(new_last) => {
                headers.set_broadhash(Some(&new_last));
                headers.set_height(Some(&new_last));
                self.ctx
                    .rounds
                    .restore_to_slot(self.ctx.config.slot_number(new_last.created_at));
            }
            Err(_) => {
                headers.set_broadhash(None);
                headers.set_height(None);
            }
        }

        let undo = self.ctx.applier.undo_block(&removed).await;
        if !undo.success {
            warn!(id = %removed.id, errors = ?undo.errors, "Failed to undo rolled back block");
        }

        warn!(
            id = %removed.id,
            height = removed.height,
            new_height = headers.height(),
            "Rolled back last block"
        );

        if rolling_back {
            self.transition(SyncState::InSync);
        }
        Some(removed)
    }

    /// Relay a block unless it already travelled `max_block_relay` hops.
    ///
    /// Returns whether the block was broadcast.
    pub fn send_new_block(&self, block: &mut Block) -> bool {
        block.relay += 1;
        if block.relay < self.ctx.config.max_block_relay {
            self.ctx.transport.send_new_block(block);
            return true;
        }
        false
    }

    /// Relay a transaction unless it already travelled `max_trs_relay` hops.
    pub fn send_unconfirmed_transaction(&self, trs: &mut Transaction) -> bool {
        trs.relay += 1;
        if trs.relay < self.ctx.config.max_trs_relay {
            self.ctx.transport.send_unconfirmed_transaction(trs);
            return true;
        }
        false
    }

    /// Answer a peer asking whether we hold `block`.
    pub fn check_common_blocks(&self, block: CommonBlockQuery, peer: &Peer, request_id: RequestId) {
        let is_exist = self
            .ctx
            .blocks
            .get_headers_by_id(&block.id)
            .is_some_and(|header| header.height == block.height);

        debug!(peer = %peer.address, height = block.height, is_exist = is_exist, "Common block check");

        self.ctx
            .transport
            .send_common_blocks_exist(CommonBlocksExist { is_exist }, peer, request_id);
    }

    /// Answer a peer's block request from the memory window or the repository.
    pub async fn send_blocks(&self, query: BlocksQuery, peer: &Peer, request_id: RequestId) {
        let limit = query.limit.min(self.ctx.config.request_block_limit);
        let blocks = match self.ctx.blocks.get_many(limit, query.height).await {
            Ok(blocks) => blocks,
            Err(err) => {
                warn!(peer = %peer.address, error = %err, "Failed to load requested blocks");
                Vec::new()
            }
        };
        self.ctx.transport.send_blocks(blocks, peer, request_id);
    }

    pub fn send_peers(&self, peer: &Peer, request_id: RequestId) {
        self.ctx.transport.send_peers(peer, request_id);
    }

    /// Get sync statistics.
    pub fn get_stats(&self) -> SyncStats {
        let (peers, active_peers) = {
            let pm = self.ctx.peers.lock();
            (pm.len(), pm.active_peers().count())
        };

        SyncStats {
            state: self.state(),
            local_height: self.ctx.headers.height(),
            synchronization: self.ctx.headers.synchronization(),
            in_memory_blocks: self.ctx.blocks.len(),
            peers,
            active_peers,
        }
    }
}

/// Statistics about the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub state: SyncState,
    pub local_height: u64,
    pub synchronization: bool,
    pub in_memory_blocks: usize,
    pub peers: usize,
    pub active_peers: usize,
}
