//! 钱包地址
//!
//! 二进制布局：`version(1) || digest(44) || checksum(3)`
//! - 主地址：digest 取自公钥
//! - 子地址：digest 取自 `primary_address || nonce`
//!
//! 文本形式为纯 base58

use std::fmt;

use crate::infrastructure::hashing::{sha512_qu_trunc, sha512_sq_trunc};

pub const ADDRESS_VERSION: u8 = 1;
const DIGEST_LEN: usize = 44;
const CHECKSUM_LEN: usize = 3;
pub const ADDRESS_LEN: usize = 1 + DIGEST_LEN + CHECKSUM_LEN;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Vec<u8>);

impl Address {
    /// 直接包装已有的地址字节
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// 由公钥计算主地址，公钥为空时返回 `None`
    pub fn from_public_key(public_key: &[u8]) -> Option<Self> {
        if public_key.is_empty() {
            return None;
        }
        Some(Self::build(public_key))
    }

    /// 由主地址和链 nonce 计算子地址
    pub fn derive(primary: &Address, nonce: &[u8]) -> Self {
        let mut input = Vec::with_capacity(primary.0.len() + nonce.len());
        input.extend_from_slice(&primary.0);
        input.extend_from_slice(nonce);
        Self::build(&input)
    }

    fn build(input: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(ADDRESS_LEN);
        bytes.push(ADDRESS_VERSION);
        bytes.extend_from_slice(&sha512_qu_trunc(input, 0, 0, DIGEST_LEN));
        let checksum = sha512_sq_trunc(&bytes, 0, 0, CHECKSUM_LEN);
        bytes.extend_from_slice(&checksum);
        Self(bytes)
    }

    /// 校验和是否匹配
    pub fn is_valid(&self) -> bool {
        if self.0.len() != ADDRESS_LEN || self.0[0] != ADDRESS_VERSION {
            return false;
        }
        let (body, checksum) = self.0.split_at(ADDRESS_LEN - CHECKSUM_LEN);
        sha512_sq_trunc(body, 0, 0, CHECKSUM_LEN) == checksum
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_base58(text: &str) -> Option<Self> {
        bs58::decode(text).into_vec().ok().map(Self)
    }

    /// 备份文件名使用的钱包标识：base58 前 8 个字符
    pub fn wallet_id(&self) -> String {
        self.to_base58().chars().take(8).collect()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_address() {
        let addr = Address::from_public_key(b"public key bytes").unwrap();
        assert_eq!(addr.as_bytes().len(), ADDRESS_LEN);
        assert!(addr.is_valid());
        assert_eq!(addr, Address::from_public_key(b"public key bytes").unwrap());
        assert!(Address::from_public_key(&[]).is_none());
    }

    #[test]
    fn test_derived_address_depends_on_nonce() {
        let primary = Address::from_public_key(b"public key bytes").unwrap();
        let a = Address::derive(&primary, &[1u8; 16]);
        let b = Address::derive(&primary, &[2u8; 16]);
        assert_ne!(a, b);
        assert_ne!(a, primary);
        assert!(a.is_valid());
    }

    #[test]
    fn test_base58_round_trip_and_wallet_id() {
        let addr = Address::from_public_key(b"another key").unwrap();
        let text = addr.to_base58();
        assert_eq!(Address::from_base58(&text).unwrap(), addr);
        assert_eq!(addr.wallet_id(), text[..8]);

        let mut tampered = addr.into_bytes();
        tampered[5] ^= 0xff;
        assert!(!Address::from_bytes(tampered).is_valid());
    }
}
