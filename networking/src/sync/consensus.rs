use chain::config::TOTAL_PERCENTAGE;
use containers::{BlockHeader, BlockId, Peer};

/// Estimates how much of the visible network agrees with the local chain.
///
/// Agreement is `(agreeing + 1) / (peers + 1) * 100`, counting the local
/// node as one agreeing voter. Callers pass only non-banned peers; with no
/// peers at all the estimate is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusTracker {
    min_consensus: f64,
}

impl ConsensusTracker {
    pub fn new(min_consensus: f64) -> Self {
        Self { min_consensus }
    }

    pub fn min_consensus(&self) -> f64 {
        self.min_consensus
    }

    /// Share of peers advertising the local broadhash.
    pub fn consensus<'a>(
        &self,
        peers: impl IntoIterator<Item = &'a Peer>,
        broadhash: Option<&BlockId>,
    ) -> f64 {
        Self::percentage(peers, |peer| peer.broadhash.as_ref() == broadhash)
    }

    /// Share of peers whose block-id pool holds `block` at its height.
    pub fn block_consensus<'a>(
        &self,
        peers: impl IntoIterator<Item = &'a Peer>,
        block: &BlockHeader,
    ) -> f64 {
        Self::percentage(peers, |peer| peer.has_block(&block.id, block.height))
    }

    pub fn is_reached(&self, consensus: f64) -> bool {
        consensus >= self.min_consensus
    }

    fn percentage<'a>(
        peers: impl IntoIterator<Item = &'a Peer>,
        agrees: impl Fn(&Peer) -> bool,
    ) -> f64 {
        let (total, agreeing) = peers.into_iter().fold((0usize, 0usize), |(total, agreeing), peer| {
            (total + 1, agreeing + usize::from(agrees(peer)))
        });

        if total == 0 {
            return 0.0;
        }
        (agreeing + 1) as f64 / (total + 1) as f64 * TOTAL_PERCENTAGE
    }
}
