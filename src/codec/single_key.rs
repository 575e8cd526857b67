//! v1 / v2 / v4 单密钥布局
//!
//! ```text
//! v1/v2: version:i32 | privateKey | publicKey | [lastNonce]
//! v4:    version:i32 | 'f' privateKey | publicKey | [lastNonce]
//!        version:i32 | 'v' baseNonce  | publicKey | [lastNonce]
//! ```
//!
//! 最老的文件没有 lastNonce，只能靠是否到达文件末尾判断。

use crate::codec::reader::{ByteReader, ByteWriter};
use crate::domain::wallet_version::WalletVersion;
use crate::error::{WalletError, WalletResult};

const TAG_FULL: u8 = b'f';
const TAG_VIEWING: u8 = b'v';

/// 第一个秘密字段：完整钱包存私钥，只读钱包存 base nonce（均为密文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySecret {
    PrivateKey(Vec<u8>),
    BaseNonce(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleKeyRecord {
    pub version: WalletVersion,
    pub secret: KeySecret,
    pub public_key: Vec<u8>,
    pub last_nonce: Option<Vec<u8>>,
}

impl SingleKeyRecord {
    pub fn is_viewing(&self) -> bool {
        matches!(self.secret, KeySecret::BaseNonce(_))
    }
}

/// 版本号之后的部分
pub fn decode(reader: &mut ByteReader<'_>, version: WalletVersion) -> WalletResult<SingleKeyRecord> {
    let viewing = if version.has_kind_tag() {
        match reader.read_u8()? {
            TAG_VIEWING => true,
            TAG_FULL => false,
            other => {
                return Err(WalletError::corrupt(format!(
                    "unknown wallet kind tag 0x{:02x}",
                    other
                )))
            }
        }
    } else {
        false
    };

    let first = reader.read_field()?;
    let secret = if viewing {
        KeySecret::BaseNonce(first)
    } else {
        KeySecret::PrivateKey(first)
    };

    let public_key = reader.read_field()?;

    let last_nonce = if reader.is_eof() {
        None
    } else {
        Some(reader.read_field()?)
    };

    Ok(SingleKeyRecord {
        version,
        secret,
        public_key,
        last_nonce,
    })
}

pub fn encode(record: &SingleKeyRecord) -> WalletResult<Vec<u8>> {
    let mut writer = ByteWriter::new();
    writer.write_i32(record.version.as_i32());

    match (&record.secret, record.version.has_kind_tag()) {
        (KeySecret::PrivateKey(private_key), true) => {
            writer.write_u8(TAG_FULL);
            writer.write_field(private_key)?;
        }
        (KeySecret::BaseNonce(base_nonce), true) => {
            writer.write_u8(TAG_VIEWING);
            writer.write_field(base_nonce)?;
        }
        (KeySecret::PrivateKey(private_key), false) => {
            writer.write_field(private_key)?;
        }
        (KeySecret::BaseNonce(_), false) => {
            return Err(WalletError::ViewingWallet("only the v4 layout can store a viewing wallet"));
        }
    }

    writer.write_field(&record.public_key)?;

    if let Some(last_nonce) = &record.last_nonce {
        writer.write_field(last_nonce)?;
    }

    Ok(writer.into_bytes())
}
