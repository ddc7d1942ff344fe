pub mod amount;
pub mod config;
pub mod errors;
pub mod key_store;
pub mod validation;

pub use config::WalletConfig;
pub use errors::WalletError;
pub use key_store::KeyStore;
