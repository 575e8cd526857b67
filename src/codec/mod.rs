//! 钱包文件编解码
//!
//! 文件以 `version:i32` 开头，按 [`WalletVersion::layout`] 分派到
//! 单密钥或多密钥布局。这里只处理密文字段，不做任何解密。

pub mod legacy_hex;
pub mod multi_key;
pub mod reader;
pub mod single_key;

pub use multi_key::{EncryptedKeyRecord, MultiKeyRecord};
pub use single_key::{KeySecret, SingleKeyRecord};

use crate::domain::wallet_version::{Layout, WalletVersion};
use crate::error::WalletResult;
use reader::ByteReader;

/// 解析后的钱包文件（字段仍为密文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletFile {
    SingleKey(SingleKeyRecord),
    MultiKey(MultiKeyRecord),
}

impl WalletFile {
    pub fn version(&self) -> WalletVersion {
        match self {
            WalletFile::SingleKey(record) => record.version,
            WalletFile::MultiKey(_) => WalletVersion::V3,
        }
    }
}

/// 读取版本号，未知版本返回 UnsupportedVersion
pub fn peek_version(bytes: &[u8]) -> WalletResult<WalletVersion> {
    let mut reader = ByteReader::new(bytes);
    WalletVersion::try_from(reader.read_i32()?)
}

pub fn decode(bytes: &[u8]) -> WalletResult<WalletFile> {
    let mut reader = ByteReader::new(bytes);
    let version = WalletVersion::try_from(reader.read_i32()?)?;

    match version.layout() {
        Layout::SingleKey => Ok(WalletFile::SingleKey(single_key::decode(
            &mut reader,
            version,
        )?)),
        Layout::MultiKey => Ok(WalletFile::MultiKey(multi_key::decode(&mut reader)?)),
    }
}

pub fn encode(file: &WalletFile) -> WalletResult<Vec<u8>> {
    match file {
        WalletFile::SingleKey(record) => single_key::encode(record),
        WalletFile::MultiKey(record) => multi_key::encode(record),
    }
}
