//! Writing primitives to encoded data.

/// Generates a method that writes a base-128 variable-length integer.
macro_rules! write_varint {
    ($write_varint:ident, $T:ident) => {
        pub fn $write_varint(&mut self, mut value: $T) {
            loop {
                let byte = (value & 0x7f) as u8;
                value >>= 7;
                if value == 0 {
                    self.bytes.push(byte);
                    return;
                }
                self.bytes.push(byte | 0x80);
            }
        }
    };
}

/// An append-only sink for encoded data.
#[derive(Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Writer {
        Writer::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(u8::from(value));
    }

    pub fn write_f32le(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    write_varint!(write_var_u32, u32);
    write_varint!(write_var_u64, u64);

    /// Write a signed integer, zig-zag encoded so that small negative numbers
    /// stay short.
    pub fn write_var_i32(&mut self, value: i32) {
        self.write_var_u32(((value << 1) ^ (value >> 31)) as u32);
    }

    pub fn write_var_i64(&mut self, value: i64) {
        self.write_var_u64(((value << 1) ^ (value >> 63)) as u64);
    }

    /// Write a string prefixed by its length in bytes.
    ///
    /// Strings longer than `u32::MAX` bytes cannot be represented, and must be
    /// rejected by the caller.
    pub fn write_string(&mut self, value: &str) {
        self.write_var_u32(value.len() as u32);
        self.bytes.extend_from_slice(value.as_bytes());
    }
}
