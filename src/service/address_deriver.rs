//! 地址派生
//!
//! 两种派生方式：
//! 1. 链式 nonce 派生（所有版本）：`nonce_n = H(base_nonce || nonce_{n-1})[..16]`，
//!    子地址由 `(主地址, nonce_n)` 计算，H 按格式版本选择四轮或两轮 SHA-512
//! 2. 主种子派生（仅 v3）：通过密钥协作方从主种子派生第 n 个子密钥，
//!    必须通过自检并能算出地址才被接受

use crate::domain::address::Address;
use crate::domain::key_pair::ChainStep;
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::hashing::HashVariant;
use crate::infrastructure::key_provider::{
    KeyMaterial, KeyProvider, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT,
};

/// 链 nonce 长度
pub const CHAIN_NONCE_LEN: usize = 16;
/// base nonce 长度
pub const BASE_NONCE_LEN: usize = 64;

const SELF_TEST_PLAINTEXT: &[u8] = b"TEST TEST";

/// 由密钥材料计算 base nonce
///
/// 取私钥中跳过公钥长度之后的最多 64 字节；私钥不比公钥长时使用整个私钥
pub fn base_nonce(variant: HashVariant, private_key: &[u8], public_key: &[u8]) -> Vec<u8> {
    if private_key.len() > public_key.len() {
        variant.trunc(private_key, public_key.len(), BASE_NONCE_LEN, BASE_NONCE_LEN)
    } else {
        variant.trunc(private_key, 0, 0, BASE_NONCE_LEN)
    }
}

/// 计算下一个链 nonce
pub fn next_nonce(variant: HashVariant, base_nonce: &[u8], last_nonce: Option<&[u8]>) -> Vec<u8> {
    let mut input = Vec::with_capacity(base_nonce.len() + CHAIN_NONCE_LEN);
    input.extend_from_slice(base_nonce);
    if let Some(last_nonce) = last_nonce {
        input.extend_from_slice(last_nonce);
    }
    variant.trunc(&input, 0, 0, CHAIN_NONCE_LEN)
}

/// 纯函数：一步链派生，不修改任何状态
pub fn chain_step(
    variant: HashVariant,
    primary: &Address,
    base_nonce: &[u8],
    last_nonce: Option<&[u8]>,
) -> ChainStep {
    let nonce = next_nonce(variant, base_nonce, last_nonce);
    ChainStep {
        address: Address::derive(primary, &nonce),
        nonce,
    }
}

/// 从给定 nonce 之后无限预览派生链
pub struct ChainWalk<'a> {
    variant: HashVariant,
    primary: &'a Address,
    base_nonce: &'a [u8],
    last_nonce: Option<Vec<u8>>,
}

impl Iterator for ChainWalk<'_> {
    type Item = ChainStep;

    fn next(&mut self) -> Option<ChainStep> {
        let step = chain_step(
            self.variant,
            self.primary,
            self.base_nonce,
            self.last_nonce.as_deref(),
        );
        self.last_nonce = Some(step.nonce.clone());
        Some(step)
    }
}

pub fn walk<'a>(
    variant: HashVariant,
    primary: &'a Address,
    base_nonce: &'a [u8],
    start: Option<Vec<u8>>,
) -> ChainWalk<'a> {
    ChainWalk {
        variant,
        primary,
        base_nonce,
        last_nonce: start,
    }
}

/// 从主种子派生第 `index` 个子密钥，自检和地址计算都通过才返回
pub fn derive_child_key(
    provider: &dyn KeyProvider,
    master_seed: &[u8],
    index: u32,
) -> WalletResult<(KeyMaterial, Address)> {
    let keys = provider
        .derive_key(master_seed, index, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT)
        .ok_or_else(|| {
            tracing::error!(index, "Unable to derive new key pair from the master seed");
            WalletError::DerivationFailure(format!("unable to derive key #{}", index))
        })?;

    if !provider.test_keys(SELF_TEST_PLAINTEXT, &keys) {
        tracing::error!(index, "Newly derived key pair failed its self-test");
        return Err(WalletError::DerivationFailure(format!(
            "key #{} failed self-test",
            index
        )));
    }

    let address = Address::from_public_key(&keys.public_key).ok_or_else(|| {
        tracing::error!(index, "Unable to produce a valid address for derived key pair");
        WalletError::DerivationFailure(format!("key #{} has no valid address", index))
    })?;

    Ok((keys, address))
}
