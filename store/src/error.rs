#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Read miss. Triggers a fallback to the persistent repository where one exists.
    #[error("block not found")]
    NotFound,
    #[error("repository error: {0}")]
    Repository(String),
}
