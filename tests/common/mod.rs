//! 测试辅助模块
//! 提供临时钱包路径和低成本加密参数的存储实例

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use walletstore::config::{CryptoConfig, WalletConfig};
use walletstore::infrastructure::{AesGcmPasswordCipher, Ed25519KeyProvider};
use walletstore::WalletStorage;

pub const PASSWORD: &str = "correct horse battery";

/// 测试用钱包配置（不自动备份）
pub fn settings(path: &Path) -> WalletConfig {
    WalletConfig {
        path: path.to_path_buf(),
        min_password_length: 10,
        max_catch_up_steps: 1_000,
        scan_window: 100,
        backup_on_load: false,
    }
}

pub fn cipher() -> AesGcmPasswordCipher {
    AesGcmPasswordCipher::new(CryptoConfig::low_cost())
}

pub fn storage_with(settings: WalletConfig) -> WalletStorage {
    WalletStorage::new(settings, Arc::new(cipher()), Arc::new(Ed25519KeyProvider))
}

pub fn storage_at(path: &Path) -> WalletStorage {
    storage_with(settings(path))
}

pub fn wallet_path(dir: &TempDir) -> PathBuf {
    dir.path().join("wallet.ixi")
}

/// 目录下的 .bak 文件数
pub fn backup_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path())
        .expect("read temp dir")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .count()
}
