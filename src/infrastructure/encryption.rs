//! AES-256-GCM 口令加密/解密模块
//! 钱包文件中每个秘密字段都单独加密
//!
//! 密文布局：`salt(16) || nonce(12) || ciphertext+tag`

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::config::CryptoConfig;
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::pbkdf2::{
    derive_key_with_salt, derive_strengthened_key, random_salt, SALT_LENGTH,
};

const NONCE_LENGTH: usize = 12;

/// 口令加密协作方
///
/// 解密返回 `None` 既可能是密码错误也可能是密文损坏，调用方无法区分
pub trait PasswordCipher: Send + Sync {
    fn encrypt_with_password(
        &self,
        plaintext: &[u8],
        password: &str,
        strengthened: bool,
    ) -> WalletResult<Vec<u8>>;

    fn decrypt_with_password(
        &self,
        ciphertext: &[u8],
        password: &str,
        strengthened: bool,
    ) -> Option<Vec<u8>>;
}

/// 加密数据
///
/// # Arguments
/// * `data` - 要加密的原始数据
/// * `key` - 32字节加密密钥
///
/// # Returns
/// 返回加密后的数据（nonce + ciphertext）
pub fn encrypt_data(data: &[u8], key: &[u8]) -> WalletResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| WalletError::Encryption(format!("invalid key: {}", e)))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// 解密数据（nonce + ciphertext），认证失败返回 `None`
pub fn decrypt_data(encrypted: &[u8], key: &[u8]) -> Option<Vec<u8>> {
    if encrypted.len() < NONCE_LENGTH {
        return None;
    }

    let cipher = Aes256Gcm::new_from_slice(key).ok()?;
    let nonce = Nonce::from_slice(&encrypted[..NONCE_LENGTH]);
    cipher.decrypt(nonce, &encrypted[NONCE_LENGTH..]).ok()
}

/// 默认实现：普通模式 PBKDF2，加强模式 Argon2id
#[derive(Debug, Clone)]
pub struct AesGcmPasswordCipher {
    config: CryptoConfig,
}

impl AesGcmPasswordCipher {
    pub fn new(config: CryptoConfig) -> Self {
        Self { config }
    }

    fn derive(&self, password: &str, salt: &[u8], strengthened: bool) -> WalletResult<Vec<u8>> {
        if strengthened {
            Ok(derive_strengthened_key(password, salt, &self.config)?.to_vec())
        } else {
            Ok(derive_key_with_salt(password, salt, self.config.pbkdf2_iterations).to_vec())
        }
    }
}

impl Default for AesGcmPasswordCipher {
    fn default() -> Self {
        Self::new(CryptoConfig::default())
    }
}

impl PasswordCipher for AesGcmPasswordCipher {
    fn encrypt_with_password(
        &self,
        plaintext: &[u8],
        password: &str,
        strengthened: bool,
    ) -> WalletResult<Vec<u8>> {
        let salt = random_salt();
        let key = zeroize::Zeroizing::new(self.derive(password, &salt, strengthened)?);
        let sealed = encrypt_data(plaintext, &key)?;

        let mut out = Vec::with_capacity(SALT_LENGTH + sealed.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt_with_password(
        &self,
        ciphertext: &[u8],
        password: &str,
        strengthened: bool,
    ) -> Option<Vec<u8>> {
        if ciphertext.len() < SALT_LENGTH + NONCE_LENGTH {
            return None;
        }
        let (salt, sealed) = ciphertext.split_at(SALT_LENGTH);
        let key = zeroize::Zeroizing::new(self.derive(password, salt, strengthened).ok()?);
        decrypt_data(sealed, &key)
    }
}
