//! 钱包存储错误类型
//!
//! 所有公开操作统一返回 [`WalletResult`]，调用方可通过 [`WalletError::code`]
//! 获取稳定的错误码字符串

use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    /// 钱包已经加载（或已生成），不能再次加载
    #[error("wallet already loaded")]
    AlreadyLoaded,

    #[error("wallet not loaded")]
    NotLoaded,

    #[error("wallet file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported wallet version {0}")]
    UnsupportedVersion(i32),

    /// 解密没有产出明文
    ///
    /// 密码学协作方无法区分"密码错误"和"密文损坏"，两种情况都落在这里
    #[error("unable to decrypt wallet: wrong password or corrupted ciphertext")]
    WrongPassword,

    #[error("wallet file is corrupt: {0}")]
    CorruptFile(String),

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("key derivation failed: {0}")]
    DerivationFailure(String),

    /// 追赶派生链时在上限步数内没有遇到已保存的 nonce
    #[error("last nonce checkpoint not reached after {steps} steps")]
    CheckpointUnreachable { steps: usize },

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("operation not available on a viewing wallet: {0}")]
    ViewingWallet(&'static str),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("wallet file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    /// 稳定的 snake_case 错误码
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::AlreadyLoaded => "already_loaded",
            WalletError::NotLoaded => "not_loaded",
            WalletError::FileNotFound(_) => "file_not_found",
            WalletError::UnsupportedVersion(_) => "unsupported_version",
            WalletError::WrongPassword => "wrong_password",
            WalletError::CorruptFile(_) => "corrupt_file",
            WalletError::WeakPassword { .. } => "weak_password",
            WalletError::DerivationFailure(_) => "derivation_failure",
            WalletError::CheckpointUnreachable { .. } => "checkpoint_unreachable",
            WalletError::UnknownKey(_) => "unknown_key",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::ViewingWallet(_) => "viewing_wallet",
            WalletError::Encryption(_) => "encryption_failed",
            WalletError::Io(_) => "io_failure",
        }
    }

    /// 调用方是否应该重新提示输入密码
    pub fn should_reprompt(&self) -> bool {
        matches!(
            self,
            WalletError::WrongPassword | WalletError::WeakPassword { .. }
        )
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        WalletError::CorruptFile(msg.into())
    }
}
