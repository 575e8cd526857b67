//! 钱包文件格式版本

use crate::error::{WalletError, WalletResult};
use crate::infrastructure::hashing::HashVariant;

/// 已知的钱包文件格式版本（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WalletVersion {
    /// 单密钥，四轮哈希
    V1,
    /// 单密钥，两轮哈希
    V2,
    /// 多密钥，主种子
    V3,
    /// 单密钥，带完整/只读标记
    V4,
}

/// 编解码布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SingleKey,
    MultiKey,
}

impl WalletVersion {
    pub fn as_i32(self) -> i32 {
        match self {
            WalletVersion::V1 => 1,
            WalletVersion::V2 => 2,
            WalletVersion::V3 => 3,
            WalletVersion::V4 => 4,
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            WalletVersion::V3 => Layout::MultiKey,
            WalletVersion::V1 | WalletVersion::V2 | WalletVersion::V4 => Layout::SingleKey,
        }
    }

    /// 链派生和 base nonce 使用的哈希变体：版本 < 2 用四轮，其余用两轮
    pub fn hash_variant(self) -> HashVariant {
        match self {
            WalletVersion::V1 => HashVariant::Quad,
            _ => HashVariant::Square,
        }
    }

    /// v3 的秘密字段使用加强口令加密
    pub fn strengthened_encryption(self) -> bool {
        self == WalletVersion::V3
    }

    /// 是否有单独的完整/只读标记字节
    pub fn has_kind_tag(self) -> bool {
        self == WalletVersion::V4
    }
}

impl TryFrom<i32> for WalletVersion {
    type Error = WalletError;

    fn try_from(value: i32) -> WalletResult<Self> {
        match value {
            1 => Ok(WalletVersion::V1),
            2 => Ok(WalletVersion::V2),
            3 => Ok(WalletVersion::V3),
            4 => Ok(WalletVersion::V4),
            other => Err(WalletError::UnsupportedVersion(other)),
        }
    }
}

impl std::fmt::Display for WalletVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.as_i32())
    }
}
