//! `IXIHEX` 文本格式迁移
//!
//! 旧钱包以 `IXIHEX` 开头，后面是二进制文件的十六进制文本。
//! 每次读取前都先转换，已是二进制的文件原样返回。

use std::borrow::Cow;
use std::path::Path;

use crate::error::{WalletError, WalletResult};

pub const LEGACY_MARKER: &[u8] = b"IXIHEX";

pub fn is_legacy(bytes: &[u8]) -> bool {
    bytes.starts_with(LEGACY_MARKER)
}

/// 内存中转换为二进制，不触碰磁盘
pub fn normalize(bytes: &[u8]) -> WalletResult<Cow<'_, [u8]>> {
    if !is_legacy(bytes) {
        return Ok(Cow::Borrowed(bytes));
    }

    let payload = std::str::from_utf8(&bytes[LEGACY_MARKER.len()..])
        .map_err(|_| WalletError::corrupt("IXIHEX payload is not text"))?;
    let raw = hex::decode(payload.trim())
        .map_err(|e| WalletError::corrupt(format!("IXIHEX payload is not hex: {}", e)))?;

    Ok(Cow::Owned(raw))
}

/// 原地把旧格式文件改写为二进制，返回是否发生了转换
pub fn migrate_in_place(path: &Path) -> WalletResult<bool> {
    let bytes = std::fs::read(path)?;
    if !is_legacy(&bytes) {
        return Ok(false);
    }

    tracing::info!(path = %path.display(), "Converting wallet from IXIHEX to binary");
    let raw = normalize(&bytes)?;
    std::fs::write(path, raw.as_ref())?;
    Ok(true)
}
