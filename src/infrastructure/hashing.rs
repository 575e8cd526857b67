//! 截断 SHA-512 哈希
//!
//! 两种变体按钱包格式版本划分：
//! - `qu`：四轮 SHA-512（版本 < 2）
//! - `sq`：两轮 SHA-512（版本 >= 2）

use sha2::{Digest, Sha512};

/// SHA-512 输出长度
pub const SHA512_LEN: usize = 64;

/// 按格式版本选择的哈希变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashVariant {
    /// 四轮 SHA-512
    Quad,
    /// 两轮 SHA-512
    Square,
}

impl HashVariant {
    pub fn trunc(self, data: &[u8], offset: usize, count: usize, len: usize) -> Vec<u8> {
        match self {
            HashVariant::Quad => sha512_qu_trunc(data, offset, count, len),
            HashVariant::Square => sha512_sq_trunc(data, offset, count, len),
        }
    }
}

/// 取 `data[offset..offset + count]`，`count == 0` 表示到末尾，越界时截断
fn window(data: &[u8], offset: usize, count: usize) -> &[u8] {
    let start = offset.min(data.len());
    let end = if count == 0 {
        data.len()
    } else {
        start.saturating_add(count).min(data.len())
    };
    &data[start..end]
}

fn rounds(input: &[u8], n: usize) -> [u8; SHA512_LEN] {
    let mut digest = [0u8; SHA512_LEN];
    digest.copy_from_slice(&Sha512::digest(input));
    for _ in 1..n {
        let next = Sha512::digest(digest);
        digest.copy_from_slice(&next);
    }
    digest
}

/// 两轮 SHA-512，截断到 `len` 字节（最多 64）
pub fn sha512_sq_trunc(data: &[u8], offset: usize, count: usize, len: usize) -> Vec<u8> {
    let digest = rounds(window(data, offset, count), 2);
    digest[..len.min(SHA512_LEN)].to_vec()
}

/// 四轮 SHA-512，截断到 `len` 字节（最多 64）
pub fn sha512_qu_trunc(data: &[u8], offset: usize, count: usize, len: usize) -> Vec<u8> {
    let digest = rounds(window(data, offset, count), 4);
    digest[..len.min(SHA512_LEN)].to_vec()
}
