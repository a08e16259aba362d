//! Sync coordinator state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Local tip is trusted. Waiting for the next periodic tick.
    #[default]
    InSync,

    /// Measuring how many peers agree with the local broadhash.
    CheckingConsensus,

    /// Looking for the fork point with a randomly selected peer.
    NegotiatingCommonBlock,

    /// Requesting blocks from the negotiated peer and applying them in order.
    PullingBlocks,

    /// Discarding the local tip after it was found invalid.
    RollingBack,
}

impl SyncState {
    /// Check if a transition to the target state is valid.
    ///
    /// Every in-flight state may fall back to `InSync` when its step ends or
    /// fails; rollback may interrupt a tip that is idle or being extended.
    pub fn can_transition_to(&self, target: SyncState) -> bool {
        match self {
            SyncState::InSync => matches!(
                target,
                SyncState::CheckingConsensus | SyncState::RollingBack
            ),
            SyncState::CheckingConsensus => matches!(
                target,
                SyncState::InSync | SyncState::NegotiatingCommonBlock
            ),
            SyncState::NegotiatingCommonBlock => matches!(
                target,
                SyncState::InSync | SyncState::PullingBlocks
            ),
            SyncState::PullingBlocks => matches!(
                target,
                SyncState::InSync | SyncState::RollingBack
            ),
            SyncState::RollingBack => matches!(target, SyncState::InSync),
        }
    }
}
