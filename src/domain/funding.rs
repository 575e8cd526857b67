//! 交易资金来源相关模型

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::address::Address;

/// 账本中的钱包类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWalletType {
    Normal,
    Multisig,
    Chat,
}

/// 账本返回的钱包信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerWallet {
    pub wallet_type: LedgerWalletType,
    pub balance: Decimal,
}

impl LedgerWallet {
    pub fn normal(balance: Decimal) -> Self {
        Self {
            wallet_type: LedgerWalletType::Normal,
            balance,
        }
    }
}

/// 尚未确认的交易，只关心其资金来源
#[derive(Debug, Clone, Default)]
pub struct PendingTransaction {
    pub from_list: BTreeMap<Address, Decimal>,
}

impl PendingTransaction {
    pub fn new(from_list: impl IntoIterator<Item = (Address, Decimal)>) -> Self {
        Self {
            from_list: from_list.into_iter().collect(),
        }
    }

    /// 该交易已占用某地址的金额
    pub fn committed_from(&self, address: &Address) -> Decimal {
        self.from_list.get(address).copied().unwrap_or(Decimal::ZERO)
    }
}

/// 地址 → 金额，总和恰好等于请求金额
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingSet {
    entries: BTreeMap<Address, Decimal>,
}

impl FundingSet {
    /// 不需要按地址归属时，把全部金额记到零长度的合成键上
    pub fn unattributed(total: Decimal) -> Self {
        let mut set = Self::default();
        set.entries.insert(Address::from_bytes(Vec::new()), total);
        set
    }

    pub(crate) fn insert(&mut self, address: Address, amount: Decimal) {
        self.entries.insert(address, amount);
    }

    pub fn get(&self, address: &Address) -> Option<Decimal> {
        self.entries.get(address).copied()
    }

    pub fn total(&self) -> Decimal {
        self.entries.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Decimal)> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> BTreeMap<Address, Decimal> {
        self.entries
    }
}
