//! Cursor based reading and writing of metadata blobs.
//!
//! Custom attribute values are the only blobs the linker decodes itself. They are built from
//! little-endian primitives, ECMA-335 II.23.2 compressed lengths, and `SerString`s (a
//! compressed length followed by UTF-8, or the single byte `0xFF` for a null string).
//!
//! [`BlobReader`] is bounds-checked: every read past the end is reported as
//! [`crate::Error::Malformed`] rather than panicking.

use crate::Result;

/// Fixed size little-endian values that can be read from and written to a blob
pub trait BlobIO: Sized {
    /// Byte array backing the value
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Decodes a little-endian value
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encodes a little-endian value
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_blob_io {
    ($($ty:ty => $size:expr),* $(,)?) => {
        $(
            impl BlobIO for $ty {
                type Bytes = [u8; $size];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_blob_io! {
    u8 => 1, i8 => 1,
    u16 => 2, i16 => 2,
    u32 => 4, i32 => 4, f32 => 4,
    u64 => 8, i64 => 8, f64 => 8,
}

/// Bounds-checked cursor over a blob
pub struct BlobReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BlobReader<'a> {
    /// Creates a reader positioned at the start of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        BlobReader { data, position: 0 }
    }

    /// Current offset into the blob
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Returns true while unread bytes remain
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the next byte without consuming it
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] at the end of the blob.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or_else(|| malformed_error!("Unexpected end of blob at offset {}", self.position))
    }

    /// Reads `length` raw bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                malformed_error!(
                    "Reading {} bytes at offset {} exceeds blob length {}",
                    length,
                    self.position,
                    self.data.len()
                )
            })?;

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Reads a little-endian primitive
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value does not fit in the remaining bytes.
    pub fn read_le<T: BlobIO>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T::Bytes>();
        let bytes = self.read_bytes(size)?;
        let array = T::Bytes::try_from(bytes)
            .map_err(|_| malformed_error!("Invalid {} byte value", size))?;
        Ok(T::from_le_bytes(array))
    }

    /// Reads a compressed unsigned integer as defined in ECMA-335 II.23.2
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a truncated or invalid encoding.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            return Ok(((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            return Ok(((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Reads a `SerString`; `None` for the null string
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for truncated data or invalid UTF-8.
    pub fn read_ser_string(&mut self) -> Result<Option<String>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let start = self.position;
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| {
                malformed_error!(
                    "Invalid UTF-8 string at offset {}: {}",
                    start,
                    e.utf8_error()
                )
            })
    }
}

/// Growable blob buffer, the inverse of [`BlobReader`]
#[derive(Debug, Default, Clone)]
pub struct BlobWriter {
    data: Vec<u8>,
}

impl BlobWriter {
    /// Creates an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a little-endian primitive
    pub fn write_le<T: BlobIO>(&mut self, value: T) {
        self.data.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Appends raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends a compressed unsigned integer
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for values above `0x1FFF_FFFF`.
    pub fn write_compressed_uint(&mut self, value: u32) -> Result<()> {
        match value {
            0..=0x7F => self.data.push(value as u8),
            0x80..=0x3FFF => {
                self.data.push(0x80 | (value >> 8) as u8);
                self.data.push(value as u8);
            }
            0x4000..=0x1FFF_FFFF => {
                self.data.push(0xC0 | (value >> 24) as u8);
                self.data.push((value >> 16) as u8);
                self.data.push((value >> 8) as u8);
                self.data.push(value as u8);
            }
            _ => return Err(malformed_error!("Value {} too large to compress", value)),
        }
        Ok(())
    }

    /// Appends a `SerString`, `None` becomes the null marker
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string is too long to encode.
    pub fn write_ser_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.data.push(0xFF),
            Some(value) => {
                let length = u32::try_from(value.len())
                    .map_err(|_| malformed_error!("String of {} bytes", value.len()))?;
                self.write_compressed_uint(length)?;
                self.data.extend_from_slice(value.as_bytes());
            }
        }
        Ok(())
    }

    /// Consumes the writer and returns the encoded bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
