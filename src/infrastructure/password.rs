//! 钱包密码持有者
//! 内存中的密码在释放时清零，比较使用常量时间

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::error::{WalletError, WalletResult};

/// 密码包装器（使用Zeroize保护）
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 写钱包前检查密码强度
    pub fn ensure_writable(&self, min_len: usize) -> WalletResult<()> {
        ensure_password_policy(&self.0, min_len)
    }

    /// 常量时间比较
    pub fn matches(&self, candidate: &str) -> bool {
        if candidate.is_empty() || self.0.is_empty() {
            return false;
        }
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// 密码长度策略，仅约束写操作
///
/// 配置值低于 [`MIN_PASSWORD_LENGTH`] 时按下限处理
pub fn ensure_password_policy(password: &str, min_len: usize) -> WalletResult<()> {
    let min = min_len.max(MIN_PASSWORD_LENGTH);
    if password.chars().count() < min {
        return Err(WalletError::WeakPassword { min });
    }
    Ok(())
}
