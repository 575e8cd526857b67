//! 长度前缀字段的读写
//!
//! 整数均为小端 i32，字段为 `len:i32 || bytes[len]`

use crate::error::{WalletError, WalletResult};

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> WalletResult<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| WalletError::corrupt("unexpected end of file"))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_i32(&mut self) -> WalletResult<i32> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(raw))
    }

    /// 读取长度前缀字段，声明长度越过文件末尾时报 CorruptFile
    pub fn read_field(&mut self) -> WalletResult<Vec<u8>> {
        let len = self.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| WalletError::corrupt(format!("negative field length {}", len)))?;
        if len > self.remaining() {
            return Err(WalletError::corrupt(format!(
                "field declares {} bytes but only {} remain",
                len,
                self.remaining()
            )));
        }
        Ok(self.take(len)?.to_vec())
    }

    fn take(&mut self, n: usize) -> WalletResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(WalletError::corrupt("unexpected end of file"));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_field(&mut self, bytes: &[u8]) -> WalletResult<()> {
        let len = i32::try_from(bytes.len())
            .map_err(|_| WalletError::Encryption(format!("field too large: {}", bytes.len())))?;
        self.write_i32(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        let mut writer = ByteWriter::new();
        writer.write_i32(2);
        writer.write_field(b"abc").unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes, vec![2, 0, 0, 0, 3, 0, 0, 0, b'a', b'b', b'c']);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), 2);
        assert_eq!(reader.read_field().unwrap(), b"abc");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_overlong_field_is_corrupt() {
        let bytes = [10, 0, 0, 0, 1, 2, 3];
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            reader.read_field(),
            Err(WalletError::CorruptFile(_))
        ));

        let negative = (-1i32).to_le_bytes();
        let mut reader = ByteReader::new(&negative);
        assert!(matches!(
            reader.read_field(),
            Err(WalletError::CorruptFile(_))
        ));
    }
}
