//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 写钱包文件时允许的最短密码长度
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wallet: WalletConfig,
    #[serde(default)]
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 钱包存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub path: PathBuf,
    pub min_password_length: usize,
    /// 加载时追赶派生链的最大步数
    pub max_catch_up_steps: usize,
    /// 扫描丢失地址时每条链向前预览的地址数
    pub scan_window: usize,
    /// 加载成功后自动创建 .bak 备份
    pub backup_on_load: bool,
}

/// 口令加密参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub pbkdf2_iterations: u32,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            path: std::env::var("WALLET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ixian.wal")),
            min_password_length: std::env::var("WALLET_MIN_PASSWORD_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MIN_PASSWORD_LENGTH),
            max_catch_up_steps: std::env::var("WALLET_MAX_CATCH_UP_STEPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100_000),
            scan_window: std::env::var("WALLET_SCAN_WINDOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            backup_on_load: std::env::var("WALLET_BACKUP_ON_LOAD")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(true),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: std::env::var("WALLET_PBKDF2_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100_000),
            argon2_memory_kib: std::env::var("WALLET_ARGON2_MEMORY_KIB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(19_456),
            argon2_iterations: std::env::var("WALLET_ARGON2_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            argon2_parallelism: std::env::var("WALLET_ARGON2_PARALLELISM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        }
    }
}

impl CryptoConfig {
    /// 低成本参数，仅用于测试和基准
    pub fn low_cost() -> Self {
        Self {
            pbkdf2_iterations: 1_000,
            argon2_memory_kib: 64,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            wallet: WalletConfig::default(),
            crypto: CryptoConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.wallet.min_password_length < MIN_PASSWORD_LENGTH {
            anyhow::bail!(
                "min_password_length must be at least {}",
                MIN_PASSWORD_LENGTH
            );
        }

        if self.wallet.max_catch_up_steps == 0 {
            anyhow::bail!("max_catch_up_steps must be greater than 0");
        }

        if self.crypto.pbkdf2_iterations == 0 {
            anyhow::bail!("pbkdf2_iterations must be greater than 0");
        }

        argon2::Params::new(
            self.crypto.argon2_memory_kib,
            self.crypto.argon2_iterations,
            self.crypto.argon2_parallelism,
            Some(32),
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
