//! Domain 模块
//!
//! 地址、密钥、钱包版本与资金选择相关的领域模型

pub mod address;
pub mod funding;
pub mod key_pair;
pub mod wallet_state;
pub mod wallet_version;

// 重新导出常用类型
pub use address::{Address, ADDRESS_LEN};
pub use funding::{FundingSet, LedgerWallet, LedgerWalletType, PendingTransaction};
pub use key_pair::{AddressEntry, ChainStep, KeyPair, KeyPairSummary, PRIMARY_NONCE};
pub use wallet_state::{GeneratedWallet, WalletState};
pub use wallet_version::{Layout, WalletVersion};
