//! 内存中的密钥与地址表
//!
//! - 密钥表：地址 -> [`KeyPair`]，按插入顺序保存，第一把为主密钥
//! - 地址表：地址 -> [`AddressEntry`]，主地址的 nonce 固定为 `[0]`
//!
//! 本身不加锁，由 [`WalletStorage`](crate::service::wallet_storage::WalletStorage)
//! 的读写锁整体保护

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::address::Address;
use crate::domain::key_pair::{AddressEntry, ChainStep, KeyPair};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::hashing::HashVariant;
use crate::infrastructure::ledger::LedgerOracle;
use crate::infrastructure::log_redact::redact_address;
use crate::service::address_deriver;

/// 撤销一次已提交的地址派生
#[derive(Debug, Clone)]
pub(crate) struct AddressUndo {
    owner: Address,
    previous_last_nonce: Option<Vec<u8>>,
    previous_last_address: Option<Address>,
    inserted: Option<Address>,
}

#[derive(Debug, Default, Clone)]
pub struct KeyStore {
    keys: Vec<KeyPair>,
    key_index: HashMap<Address, usize>,
    addresses: HashMap<Address, AddressEntry>,
    address_order: Vec<Address>,
    last_address: Option<Address>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入密钥并登记其主地址，重复的密钥返回 false
    pub fn insert_key(&mut self, key_pair: KeyPair) -> bool {
        let address = key_pair.address.clone();
        if self.key_index.contains_key(&address) {
            return false;
        }

        self.key_index.insert(address.clone(), self.keys.len());
        self.keys.push(key_pair);
        self.register_address(address.clone(), AddressEntry::primary(address.clone()));
        if self.last_address.is_none() {
            self.last_address = Some(address);
        }
        true
    }

    /// 移除最后插入的密钥及其名下所有地址
    pub(crate) fn pop_key(&mut self) -> Option<KeyPair> {
        let key_pair = self.keys.pop()?;
        let owner = key_pair.address.clone();
        self.key_index.remove(&owner);
        self.addresses.retain(|_, entry| entry.owner != owner);
        self.address_order.retain(|address| self.addresses.contains_key(address));
        if self.last_address.as_ref().map_or(false, |a| !self.addresses.contains_key(a)) {
            self.last_address = self.keys.first().map(|k| k.address.clone());
        }
        Some(key_pair)
    }

    fn register_address(&mut self, address: Address, entry: AddressEntry) {
        if self.addresses.insert(address.clone(), entry).is_none() {
            self.address_order.push(address);
        }
    }

    pub fn key_pair(&self, address: &Address) -> Option<&KeyPair> {
        self.key_index.get(address).map(|&i| &self.keys[i])
    }

    fn key_pair_mut(&mut self, address: &Address) -> Option<&mut KeyPair> {
        match self.key_index.get(address) {
            Some(&i) => self.keys.get_mut(i),
            None => None,
        }
    }

    fn require_key(&self, address: &Address) -> WalletResult<&KeyPair> {
        self.key_pair(address)
            .ok_or_else(|| WalletError::UnknownKey(address.to_base58()))
    }

    pub fn primary_key(&self) -> Option<&KeyPair> {
        self.keys.first()
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyPair> {
        self.keys.iter()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn key_addresses(&self) -> Vec<Address> {
        self.keys.iter().map(|k| k.address.clone()).collect()
    }

    pub fn address_entry(&self, address: &Address) -> Option<&AddressEntry> {
        self.addresses.get(address)
    }

    pub fn is_mine(&self, address: &Address) -> bool {
        self.addresses.contains_key(address)
    }

    /// 所有地址，按登记顺序
    pub fn my_addresses(&self) -> Vec<Address> {
        self.address_order.clone()
    }

    pub fn my_addresses_base58(&self) -> Vec<String> {
        self.address_order.iter().map(Address::to_base58).collect()
    }

    /// 某把密钥名下的地址（包括主地址）
    pub fn addresses_owned_by(&self, owner: &Address) -> Vec<Address> {
        self.address_order
            .iter()
            .filter(|address| {
                self.addresses
                    .get(*address)
                    .map_or(false, |entry| &entry.owner == owner)
            })
            .cloned()
            .collect()
    }

    pub fn last_address(&self) -> Option<&Address> {
        self.last_address.as_ref()
    }

    /// 从列表中挑出属于本钱包的地址，一个都没有时返回 None
    pub fn extract_my_addresses<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a Address>,
    ) -> Option<Vec<Address>> {
        let mine: Vec<Address> = candidates
            .into_iter()
            .filter(|address| self.is_mine(address))
            .cloned()
            .collect();
        if mine.is_empty() {
            None
        } else {
            Some(mine)
        }
    }

    pub fn nonce_for_address(&self, address: &Address) -> Option<&[u8]> {
        self.addresses.get(address).map(|entry| entry.nonce.as_slice())
    }

    /// 汇总余额，只计非零余额；给定 `primary` 时只统计该密钥名下的地址
    pub fn total_balance(&self, ledger: &dyn LedgerOracle, primary: Option<&Address>) -> Decimal {
        self.address_order
            .iter()
            .filter(|address| match primary {
                Some(owner) => self
                    .addresses
                    .get(*address)
                    .map_or(false, |entry| &entry.owner == owner),
                None => true,
            })
            .map(|address| ledger.get_balance(address))
            .filter(|balance| !balance.is_zero())
            .sum()
    }

    /// 预览下一个地址，不修改任何状态
    pub fn preview_address(
        &self,
        owner: &Address,
        variant: HashVariant,
        last_nonce_override: Option<&[u8]>,
    ) -> WalletResult<ChainStep> {
        let key_pair = self.require_key(owner)?;
        let last_nonce = last_nonce_override.or(key_pair.last_nonce.as_deref());
        Ok(address_deriver::chain_step(
            variant,
            owner,
            &key_pair.base_nonce,
            last_nonce,
        ))
    }

    /// 派生并提交下一个地址
    pub fn commit_address(
        &mut self,
        owner: &Address,
        variant: HashVariant,
        last_nonce_override: Option<&[u8]>,
    ) -> WalletResult<ChainStep> {
        self.commit_address_with_undo(owner, variant, last_nonce_override)
            .map(|(step, _)| step)
    }

    pub(crate) fn commit_address_with_undo(
        &mut self,
        owner: &Address,
        variant: HashVariant,
        last_nonce_override: Option<&[u8]>,
    ) -> WalletResult<(ChainStep, AddressUndo)> {
        let step = self.preview_address(owner, variant, last_nonce_override)?;
        let previous_last_address = self.last_address.clone();

        let key_pair = self
            .key_pair_mut(owner)
            .ok_or_else(|| WalletError::UnknownKey(owner.to_base58()))?;
        let previous_last_nonce = key_pair.last_nonce.replace(step.nonce.clone());

        let inserted = if self.addresses.contains_key(&step.address) {
            None
        } else {
            self.register_address(
                step.address.clone(),
                AddressEntry {
                    nonce: step.nonce.clone(),
                    owner: owner.clone(),
                },
            );
            Some(step.address.clone())
        };
        self.last_address = Some(step.address.clone());

        Ok((
            step,
            AddressUndo {
                owner: owner.clone(),
                previous_last_nonce,
                previous_last_address,
                inserted,
            },
        ))
    }

    pub(crate) fn undo_address(&mut self, undo: AddressUndo) {
        if let Some(key_pair) = self.key_pair_mut(&undo.owner) {
            key_pair.last_nonce = undo.previous_last_nonce;
        }
        if let Some(address) = undo.inserted {
            self.addresses.remove(&address);
            self.address_order.retain(|a| a != &address);
        }
        self.last_address = undo.previous_last_address;
    }

    /// 从头重放派生链直到遇到已保存的 nonce，重放出的地址全部登记
    ///
    /// 在 `max_steps` 步内没有遇到时返回 CheckpointUnreachable，此时不保留任何重放结果
    pub fn catch_up(
        &mut self,
        owner: &Address,
        variant: HashVariant,
        checkpoint: &[u8],
        max_steps: usize,
    ) -> WalletResult<usize> {
        let key_pair = self.require_key(owner)?;
        let base_nonce = key_pair.base_nonce.clone();

        let mut replayed = Vec::new();
        let mut reached = false;
        for step in address_deriver::walk(variant, owner, &base_nonce, None).take(max_steps) {
            let done = step.nonce == checkpoint;
            replayed.push(step);
            if done {
                reached = true;
                break;
            }
        }

        if !reached {
            tracing::error!(
                owner = %redact_address(&owner.to_base58()),
                max_steps,
                "Unable to reach the saved last nonce while replaying the address chain"
            );
            return Err(WalletError::CheckpointUnreachable { steps: max_steps });
        }

        let count = replayed.len();
        for step in replayed {
            if let Some(key_pair) = self.key_pair_mut(owner) {
                key_pair.last_nonce = Some(step.nonce.clone());
            }
            self.register_address(
                step.address.clone(),
                AddressEntry {
                    nonce: step.nonce,
                    owner: owner.clone(),
                },
            );
            self.last_address = Some(step.address);
        }

        tracing::debug!(
            owner = %redact_address(&owner.to_base58()),
            count,
            "Replayed address chain up to the saved last nonce"
        );
        Ok(count)
    }
}
