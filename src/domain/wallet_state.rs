//! 钱包级状态

use zeroize::Zeroizing;

use crate::domain::address::Address;
use crate::domain::wallet_version::WalletVersion;

/// 钱包状态（与密钥表处于同一把锁下）
#[derive(Clone)]
pub struct WalletState {
    pub version: WalletVersion,
    pub viewing: bool,
    pub master_seed: Zeroizing<Vec<u8>>,
    pub derived_master_seed: Zeroizing<Vec<u8>>,
    pub seed_hash: Vec<u8>,
    pub primary_address: Address,
    pub base_nonce: Zeroizing<Vec<u8>>,
}

impl WalletState {
    /// 单密钥钱包没有独立种子，主种子和种子哈希都退化为主地址
    pub fn single_key(
        version: WalletVersion,
        viewing: bool,
        primary_address: Address,
        base_nonce: Vec<u8>,
    ) -> Self {
        let seed = primary_address.as_bytes().to_vec();
        Self {
            version,
            viewing,
            master_seed: Zeroizing::new(seed.clone()),
            derived_master_seed: Zeroizing::new(seed.clone()),
            seed_hash: seed,
            primary_address,
            base_nonce: Zeroizing::new(base_nonce),
        }
    }
}

impl std::fmt::Debug for WalletState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletState")
            .field("version", &self.version)
            .field("viewing", &self.viewing)
            .field("primary_address", &self.primary_address)
            .finish_non_exhaustive()
    }
}

/// 新生成钱包的结构化结果，展示由调用方负责
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedWallet {
    pub version: WalletVersion,
    pub address: Address,
    pub public_key: Vec<u8>,
}
