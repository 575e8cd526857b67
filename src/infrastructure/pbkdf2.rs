//! PBKDF2 / Argon2id 密钥派生模块
//! 用于从钱包密码派生加密密钥

use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::config::CryptoConfig;
use crate::error::{WalletError, WalletResult};

pub const SALT_LENGTH: usize = 16; // 16字节盐值
pub const KEY_LENGTH: usize = 32; // 32字节密钥（AES-256）

/// 生成随机盐值
pub fn random_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// PBKDF2-HMAC-SHA256 派生密钥
pub fn derive_key_with_salt(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]);
    key
}

/// Argon2id 派生密钥（加强模式）
pub fn derive_strengthened_key(
    password: &str,
    salt: &[u8],
    config: &CryptoConfig,
) -> WalletResult<Zeroizing<[u8; KEY_LENGTH]>> {
    let params = Params::new(
        config.argon2_memory_kib,
        config.argon2_iterations,
        config.argon2_parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| WalletError::Encryption(format!("invalid argon2 params: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| WalletError::Encryption(format!("argon2 failed: {}", e)))?;

    Ok(key)
}
