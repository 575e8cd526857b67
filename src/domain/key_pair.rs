//! 密钥对与地址记录

use zeroize::Zeroizing;

use crate::domain::address::Address;

/// 主地址在地址表中的 nonce
pub const PRIMARY_NONCE: [u8; 1] = [0];

/// 一对密钥及其派生链状态
///
/// 只读钱包没有私钥
#[derive(Clone)]
pub struct KeyPair {
    pub private_key: Option<Zeroizing<Vec<u8>>>,
    pub public_key: Vec<u8>,
    pub address: Address,
    /// 每个密钥独立的 base nonce，由该密钥自身材料派生
    pub base_nonce: Zeroizing<Vec<u8>>,
    /// 最近一次提交的链 nonce
    pub last_nonce: Option<Vec<u8>>,
}

impl KeyPair {
    pub fn is_viewing(&self) -> bool {
        self.private_key.is_none()
    }

    pub fn summary(&self) -> KeyPairSummary {
        KeyPairSummary {
            address: self.address.clone(),
            public_key: self.public_key.clone(),
            last_nonce: self.last_nonce.clone(),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .field("viewing", &self.is_viewing())
            .field("last_nonce", &self.last_nonce.as_ref().map(hex::encode))
            .finish_non_exhaustive()
    }
}

/// 对外暴露的密钥对信息（不含私钥）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairSummary {
    pub address: Address,
    pub public_key: Vec<u8>,
    pub last_nonce: Option<Vec<u8>>,
}

/// 地址表条目：当前地址的链 nonce 和所属密钥对的主地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub nonce: Vec<u8>,
    pub owner: Address,
}

impl AddressEntry {
    pub fn primary(owner: Address) -> Self {
        Self {
            nonce: PRIMARY_NONCE.to_vec(),
            owner,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.nonce == PRIMARY_NONCE
    }
}

/// 一次链派生的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub address: Address,
    pub nonce: Vec<u8>,
}
