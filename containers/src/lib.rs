pub mod types;
pub mod block;
pub mod peer;
pub mod headers;
pub mod protocol;
pub mod response;

pub use block::{Block, BlockHeader, Transaction};
pub use headers::{FullHeaders, Headers};
pub use peer::Peer;
pub use protocol::{BlocksQuery, CommonBlockAnswer, CommonBlockQuery, CommonBlocksExist, RequestId};
pub use response::ResponseEntity;
pub use types::{BlockId, Height, TransactionId};
