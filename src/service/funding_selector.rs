//! 资金来源选择
//!
//! 贪心算法：余额从小到大累加，最后一个地址只取补足的差额。
//! 凑不满目标金额时整体失败，不返回部分结果。

use rust_decimal::Decimal;

use crate::domain::address::Address;
use crate::domain::funding::{FundingSet, LedgerWalletType, PendingTransaction};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::ledger::LedgerOracle;

pub struct FundingSelector<'a> {
    ledger: &'a dyn LedgerOracle,
}

impl<'a> FundingSelector<'a> {
    pub fn new(ledger: &'a dyn LedgerOracle) -> Self {
        Self { ledger }
    }

    /// 可用候选：排除跳过列表、非普通钱包和零余额，扣除待处理交易已占用的金额，
    /// 按调整后余额升序
    pub fn candidates(
        &self,
        addresses: impl IntoIterator<Item = Address>,
        skip: &[Address],
        pending: &[PendingTransaction],
    ) -> Vec<(Address, Decimal)> {
        let mut candidates: Vec<(Address, Decimal)> = addresses
            .into_iter()
            .filter(|address| !skip.contains(address))
            .filter_map(|address| {
                let wallet = self.ledger.get_wallet(&address);
                if wallet.wallet_type != LedgerWalletType::Normal || wallet.balance.is_zero() {
                    return None;
                }
                let committed: Decimal = pending
                    .iter()
                    .map(|tx| tx.committed_from(&address))
                    .sum();
                let available = wallet.balance - committed;
                if available <= Decimal::ZERO {
                    return None;
                }
                Some((address, available))
            })
            .collect();

        // 稳定排序，余额相同时保持地址登记顺序
        candidates.sort_by(|a, b| a.1.cmp(&b.1));
        candidates
    }

    /// 凑出恰好 `total` 的资金集合
    pub fn select(
        &self,
        addresses: impl IntoIterator<Item = Address>,
        total: Decimal,
        skip: &[Address],
        pending: &[PendingTransaction],
    ) -> WalletResult<FundingSet> {
        if total <= Decimal::ZERO {
            return Err(WalletError::InsufficientFunds {
                required: total,
                available: Decimal::ZERO,
            });
        }

        let mut funding = FundingSet::default();
        let mut gathered = Decimal::ZERO;

        for (address, available) in self.candidates(addresses, skip, pending) {
            let remaining = total - gathered;
            if available >= remaining {
                funding.insert(address, remaining);
                gathered = total;
                break;
            }
            funding.insert(address, available);
            gathered += available;
        }

        if gathered < total {
            tracing::debug!(%total, %gathered, "Not enough spendable balance to fund transaction");
            return Err(WalletError::InsufficientFunds {
                required: total,
                available: gathered,
            });
        }

        Ok(funding)
    }
}
