//! v3 多密钥布局
//!
//! ```text
//! version:i32 | masterSeed | keyCount:i32
//!   { privateKey | publicKey | nonce (len 0 = 无) } * keyCount
//! | derivedMasterSeed
//! ```
//!
//! 密钥循环内的记录损坏只中止该条及之后的记录，已读出的密钥保留。

use crate::codec::reader::{ByteReader, ByteWriter};
use crate::domain::wallet_version::WalletVersion;
use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedKeyRecord {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
    pub nonce: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiKeyRecord {
    pub master_seed: Vec<u8>,
    pub keys: Vec<EncryptedKeyRecord>,
    /// 密钥循环被截断时无法定位，此时为 `None`
    pub derived_master_seed: Option<Vec<u8>>,
    /// 声明的密钥数量与实际读出的数量不一致
    pub truncated: bool,
}

fn read_key(reader: &mut ByteReader<'_>) -> WalletResult<EncryptedKeyRecord> {
    let private_key = reader.read_field()?;
    let public_key = reader.read_field()?;
    let nonce = reader.read_field()?;
    Ok(EncryptedKeyRecord {
        private_key,
        public_key,
        nonce: if nonce.is_empty() { None } else { Some(nonce) },
    })
}

/// 版本号之后的部分
pub fn decode(reader: &mut ByteReader<'_>) -> WalletResult<MultiKeyRecord> {
    let master_seed = reader.read_field()?;

    let key_count = reader.read_i32()?;
    let key_count = usize::try_from(key_count)
        .map_err(|_| WalletError::corrupt(format!("negative key count {}", key_count)))?;

    let mut keys = Vec::new();
    let mut truncated = false;
    for index in 0..key_count {
        match read_key(reader) {
            Ok(key) => keys.push(key),
            Err(e) => {
                tracing::error!(
                    index,
                    key_count,
                    error = %e,
                    "Wallet file is corrupt, expected more data than available"
                );
                truncated = true;
                break;
            }
        }
    }

    let derived_master_seed = if truncated {
        None
    } else {
        Some(reader.read_field()?)
    };

    Ok(MultiKeyRecord {
        master_seed,
        keys,
        derived_master_seed,
        truncated,
    })
}

pub fn encode(record: &MultiKeyRecord) -> WalletResult<Vec<u8>> {
    let derived_master_seed = record
        .derived_master_seed
        .as_ref()
        .ok_or_else(|| WalletError::corrupt("derived master seed missing"))?;

    let mut writer = ByteWriter::new();
    writer.write_i32(WalletVersion::V3.as_i32());
    writer.write_field(&record.master_seed)?;

    let key_count = i32::try_from(record.keys.len())
        .map_err(|_| WalletError::corrupt("too many keys"))?;
    writer.write_i32(key_count);

    for key in &record.keys {
        writer.write_field(&key.private_key)?;
        writer.write_field(&key.public_key)?;
        match &key.nonce {
            Some(nonce) => writer.write_field(nonce)?,
            None => writer.write_i32(0),
        }
    }

    writer.write_field(derived_master_seed)?;
    Ok(writer.into_bytes())
}
