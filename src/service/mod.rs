pub mod address_deriver;
pub mod funding_selector;
pub mod key_store;
pub mod wallet_storage;

pub use funding_selector::FundingSelector;
pub use key_store::KeyStore;
pub use wallet_storage::WalletStorage;
