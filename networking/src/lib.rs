pub mod sync;
pub mod transport;
pub mod types;
