//! 非对称密钥协作方
//!
//! 提供新密钥生成、基于主种子的确定性子密钥派生以及密钥自检

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroizing;

/// 派生子密钥时使用的密钥长度（位）
pub const DEFAULT_KEY_SIZE: u32 = 4096;
/// 派生子密钥时使用的公钥指数
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65537;

/// 派生密钥的原始材料
pub struct KeyMaterial {
    pub private_key: Zeroizing<Vec<u8>>,
    pub public_key: Vec<u8>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// 密钥协作方 trait
pub trait KeyProvider: Send + Sync {
    /// 生成一对全新的随机密钥
    fn generate_keys(&self, key_size: u32) -> Option<KeyMaterial>;

    /// 从主种子派生第 `index` 个子密钥，对 `(master_seed, index)` 确定
    fn derive_key(
        &self,
        master_seed: &[u8],
        index: u32,
        key_size: u32,
        public_exponent: u64,
    ) -> Option<KeyMaterial>;

    /// 用已知明文做一次往返自检
    fn test_keys(&self, plaintext: &[u8], keys: &KeyMaterial) -> bool;
}

/// Ed25519 实现
///
/// `key_size` 和 `public_exponent` 属于 RSA 风格的接口参数，此实现不使用
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyProvider;

impl Ed25519KeyProvider {
    fn material(signing_key: &SigningKey) -> KeyMaterial {
        KeyMaterial {
            private_key: Zeroizing::new(signing_key.to_bytes().to_vec()),
            public_key: signing_key.verifying_key().to_bytes().to_vec(),
        }
    }

    fn signing_key(private_key: &[u8]) -> Option<SigningKey> {
        let bytes: [u8; 32] = private_key.try_into().ok()?;
        Some(SigningKey::from_bytes(&bytes))
    }
}

impl KeyProvider for Ed25519KeyProvider {
    fn generate_keys(&self, _key_size: u32) -> Option<KeyMaterial> {
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut secret[..]);
        Some(Self::material(&SigningKey::from_bytes(&secret)))
    }

    fn derive_key(
        &self,
        master_seed: &[u8],
        index: u32,
        _key_size: u32,
        _public_exponent: u64,
    ) -> Option<KeyMaterial> {
        if master_seed.is_empty() {
            return None;
        }

        let mut mac = Hmac::<Sha512>::new_from_slice(master_seed).ok()?;
        mac.update(b"walletstore child key");
        mac.update(&index.to_be_bytes());
        let output = Zeroizing::new(mac.finalize().into_bytes().to_vec());

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&output[..32]);
        Some(Self::material(&SigningKey::from_bytes(&secret)))
    }

    fn test_keys(&self, plaintext: &[u8], keys: &KeyMaterial) -> bool {
        let Some(signing_key) = Self::signing_key(&keys.private_key) else {
            return false;
        };
        let Ok(public) = <[u8; 32]>::try_from(keys.public_key.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&public) else {
            return false;
        };

        let signature = signing_key.sign(plaintext);
        verifying_key.verify(plaintext, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let provider = Ed25519KeyProvider;
        let seed = [42u8; 64];

        let a = provider
            .derive_key(&seed, 3, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT)
            .unwrap();
        let b = provider
            .derive_key(&seed, 3, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT)
            .unwrap();
        let c = provider
            .derive_key(&seed, 4, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT)
            .unwrap();

        assert_eq!(*a.private_key, *b.private_key);
        assert_eq!(a.public_key, b.public_key);
        assert_ne!(a.public_key, c.public_key);
        assert!(provider
            .derive_key(&[], 0, DEFAULT_KEY_SIZE, DEFAULT_PUBLIC_EXPONENT)
            .is_none());
    }

    #[test]
    fn test_self_test() {
        let provider = Ed25519KeyProvider;
        let keys = provider.generate_keys(DEFAULT_KEY_SIZE).unwrap();
        assert!(provider.test_keys(b"TEST TEST", &keys));

        let other = provider.generate_keys(DEFAULT_KEY_SIZE).unwrap();
        let mismatched = KeyMaterial {
            private_key: keys.private_key.clone(),
            public_key: other.public_key.clone(),
        };
        assert!(!provider.test_keys(b"TEST TEST", &mismatched));
    }
}
