//! Peer registry for sync operations.
//!
//! Tracks the headers peers advertise and selects peers for negotiation.

use containers::{BlockId, Height, Peer};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

/// Peer registry keyed by address.
#[derive(Debug, Default, Clone)]
pub struct PeerManager {
    peers: HashMap<SocketAddr, Peer>,
}

impl PeerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the manager, keeping an existing entry for the same address.
    pub fn add_peer(&mut self, peer: Peer) -> &mut Peer {
        self.peers.entry(peer.address).or_insert(peer)
    }

    /// Remove a peer from the manager.
    pub fn remove_peer(&mut self, address: &SocketAddr) -> Option<Peer> {
        self.peers.remove(address)
    }

    pub fn get_peer(&self, address: &SocketAddr) -> Option<&Peer> {
        self.peers.get(address)
    }

    pub fn get_peer_mut(&mut self, address: &SocketAddr) -> Option<&mut Peer> {
        self.peers.get_mut(address)
    }

    /// Update the headers a peer advertises.
    pub fn update_headers(
        &mut self,
        address: &SocketAddr,
        height: Height,
        broadhash: Option<BlockId>,
        blocks_ids: BTreeMap<Height, BlockId>,
    ) {
        if let Some(peer) = self.peers.get_mut(address) {
            peer.height = height;
            peer.broadhash = broadhash;
            peer.blocks_ids = blocks_ids;
        }
    }

    /// Toggle the ban flag. Owned by the ban policy, not by sync.
    pub fn set_banned(&mut self, address: &SocketAddr, banned: bool) {
        if let Some(peer) = self.peers.get_mut(address) {
            peer.banned = banned;
        }
    }

    /// Every peer that is not banned.
    pub fn active_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values().filter(|peer| !peer.banned)
    }

    /// Peers eligible for common-block negotiation.
    ///
    /// A peer qualifies when it is not banned, advertises a different
    /// broadhash than ours and is at least as high as our last block.
    pub fn get_peers_by_filter(&self, height: Height, broadhash: Option<&BlockId>) -> Vec<Peer> {
        self.active_peers()
            .filter(|peer| peer.height >= height && peer.broadhash.as_ref() != broadhash)
            .cloned()
            .collect()
    }

    /// Pick one peer uniformly at random.
    pub fn get_random_peer(peers: &[Peer]) -> Option<&Peer> {
        peers.choose(&mut rand::thread_rng())
    }

    /// Get all tracked peers.
    pub fn get_all_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
