//! Reading primitives from encoded data.

use crate::error::DecodeError;

/// A cursor over a slice of encoded data.
pub struct Buffer<'data> {
    data: &'data [u8],
    offset: usize,
}

impl<'data> From<&'data [u8]> for Buffer<'data> {
    fn from(data: &'data [u8]) -> Self {
        Buffer { data, offset: 0 }
    }
}

/// Generates a method that reads a base-128 variable-length integer, least
/// significant group first, with the high bit of each byte set when more
/// bytes follow.
macro_rules! read_varint {
    ($read_varint:ident, $T:ident) => {
        pub fn $read_varint(&mut self) -> Result<$T, DecodeError> {
            let start = self.offset;
            let mut value: $T = 0;
            let mut shift = 0;
            loop {
                let byte = self.read_byte()?;
                let bits = $T::from(byte & 0x7f);
                if shift >= $T::BITS || (bits << shift) >> shift != bits {
                    return Err(DecodeError::VarintOverflow { offset: start });
                }
                value |= bits << shift;
                if byte & 0x80 == 0 {
                    return Ok(value);
                }
                shift += 7;
            }
        }
    };
}

impl<'data> Buffer<'data> {
    /// The number of bytes read so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'data [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEndOfBuffer {
                offset: self.data.len(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.offset;
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBool { offset, byte }),
        }
    }

    pub fn read_f32le(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    read_varint!(read_var_u32, u32);
    read_varint!(read_var_u64, u64);

    pub fn read_var_i32(&mut self) -> Result<i32, DecodeError> {
        let value = self.read_var_u32()?;
        Ok((value >> 1) as i32 ^ -((value & 1) as i32))
    }

    pub fn read_var_i64(&mut self) -> Result<i64, DecodeError> {
        let value = self.read_var_u64()?;
        Ok((value >> 1) as i64 ^ -((value & 1) as i64))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_var_u32()? as usize;
        let offset = self.offset;
        let bytes = self.read_bytes(len)?;
        match std::str::from_utf8(bytes) {
            Ok(string) => Ok(string.to_owned()),
            Err(_) => Err(DecodeError::InvalidUtf8 { offset }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varints() {
        let mut buffer = Buffer::from(&[0x00, 0x7f, 0x80, 0x01, 0xac, 0x02][..]);
        assert_eq!(buffer.read_var_u32(), Ok(0));
        assert_eq!(buffer.read_var_u32(), Ok(127));
        assert_eq!(buffer.read_var_u32(), Ok(128));
        assert_eq!(buffer.read_var_u32(), Ok(300));
        assert!(buffer.is_empty());
    }

    #[test]
    fn zig_zag() {
        let mut buffer = Buffer::from(&[0x00, 0x01, 0x02, 0x03, 0xff, 0xff, 0xff, 0xff, 0x0f][..]);
        assert_eq!(buffer.read_var_i32(), Ok(0));
        assert_eq!(buffer.read_var_i32(), Ok(-1));
        assert_eq!(buffer.read_var_i32(), Ok(1));
        assert_eq!(buffer.read_var_i32(), Ok(-2));
        assert_eq!(buffer.read_var_i32(), Ok(i32::MIN));
    }

    #[test]
    fn varint_overflow() {
        let mut buffer = Buffer::from(&[0xff, 0xff, 0xff, 0xff, 0x1f][..]);
        assert_eq!(buffer.read_var_u32(), Err(DecodeError::VarintOverflow { offset: 0 }));

        let mut buffer = Buffer::from(&[0xff, 0xff, 0xff, 0xff, 0x0f][..]);
        assert_eq!(buffer.read_var_u64(), Ok(u64::from(u32::MAX)));
    }

    #[test]
    fn truncated_varint() {
        let mut buffer = Buffer::from(&[0x80, 0x80][..]);
        assert_eq!(
            buffer.read_var_u32(),
            Err(DecodeError::UnexpectedEndOfBuffer { offset: 2 }),
        );
    }

    #[test]
    fn floats_are_little_endian() {
        let mut buffer = Buffer::from(&[0x00, 0x00, 0xc0, 0x3f][..]);
        assert_eq!(buffer.read_f32le(), Ok(1.5));
    }

    #[test]
    fn strings() {
        let mut buffer = Buffer::from(&[0x02, b'h', b'i', 0x01, 0xff][..]);
        assert_eq!(buffer.read_string(), Ok("hi".to_owned()));
        assert_eq!(buffer.read_string(), Err(DecodeError::InvalidUtf8 { offset: 4 }));
    }

    #[test]
    fn bools() {
        let mut buffer = Buffer::from(&[0x01, 0x00, 0x02][..]);
        assert_eq!(buffer.read_bool(), Ok(true));
        assert_eq!(buffer.read_bool(), Ok(false));
        assert_eq!(buffer.read_bool(), Err(DecodeError::InvalidBool { offset: 2, byte: 2 }));
    }
}
