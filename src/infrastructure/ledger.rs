//! 账本查询协作方

use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;

use crate::domain::address::Address;
use crate::domain::funding::{LedgerWallet, LedgerWalletType};

/// 账本预言机：查询地址余额和钱包元数据
pub trait LedgerOracle: Send + Sync {
    fn get_balance(&self, address: &Address) -> Decimal;

    fn get_wallet(&self, address: &Address) -> LedgerWallet;
}

/// 内存账本，用于离线工具和测试
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    wallets: RwLock<HashMap<Address, LedgerWallet>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &Address, balance: Decimal) {
        self.set_wallet(address, LedgerWallet::normal(balance));
    }

    pub fn set_wallet(&self, address: &Address, wallet: LedgerWallet) {
        self.wallets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address.clone(), wallet);
    }
}

impl LedgerOracle for InMemoryLedger {
    fn get_balance(&self, address: &Address) -> Decimal {
        self.get_wallet(address).balance
    }

    fn get_wallet(&self, address: &Address) -> LedgerWallet {
        self.wallets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(address)
            .cloned()
            .unwrap_or(LedgerWallet {
                wallet_type: LedgerWalletType::Normal,
                balance: Decimal::ZERO,
            })
    }
}
