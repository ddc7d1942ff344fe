pub mod stellar;
pub mod traits;

pub use traits::BlockchainClient;
