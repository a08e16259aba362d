use chain::EmissionError;
use store::StoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// No peer passed the negotiation filter.
    #[error("not enough peers for synchronization")]
    NotEnoughPeers,

    /// A peer rejected or failed a request.
    #[error("peer response failure: {}", .0.join("; "))]
    PeerResponseFailure(Vec<String>),

    /// A pulled block could not be applied. Halts the current pull.
    #[error("block application failure: {}", .0.join("; "))]
    BlockApplicationFailure(Vec<String>),

    /// A rollback started while blocks were being pulled.
    #[error("block pull abandoned after rollback")]
    Abandoned,

    /// Another tick of the same coordinator is still running.
    #[error("sync tick already in progress")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Emission(#[from] EmissionError),
}

impl SyncError {
    /// Error messages in the order they were accumulated.
    pub fn errors(&self) -> Vec<String> {
        match self {
            SyncError::PeerResponseFailure(errors) | SyncError::BlockApplicationFailure(errors) => {
                errors.clone()
            }
            other => vec![other.to_string()],
        }
    }
}
