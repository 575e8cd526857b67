//! walletstore - 区块链客户端本地钱包存储
//!
//! 加密的多版本钱包文件、nonce 链式地址派生和交易资金选择

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use error::{WalletError, WalletResult};
pub use service::WalletStorage;

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{Address, FundingSet, GeneratedWallet, PendingTransaction, WalletVersion},
        error::{WalletError, WalletResult},
        infrastructure::{InMemoryLedger, LedgerOracle},
        service::WalletStorage,
    };
}
