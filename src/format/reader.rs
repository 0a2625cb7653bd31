//! Little-endian byte-stream reader shared by both decoders.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{FormatError, FormatResult};

/// Cursor over an in-memory asset.
///
/// Every read of a fixed-size field fails with
/// [`FormatError::UnexpectedEof`] when the stream is too short; nothing is
/// ever zero-filled.
pub struct LeReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> LeReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Current byte offset from the start of the stream.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    pub fn read_u8(&mut self) -> FormatResult<u8> {
        self.cursor.read_u8().map_err(FormatError::UnexpectedEof)
    }

    pub fn read_i16(&mut self) -> FormatResult<i16> {
        self.cursor
            .read_i16::<LittleEndian>()
            .map_err(FormatError::UnexpectedEof)
    }

    pub fn read_i32(&mut self) -> FormatResult<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(FormatError::UnexpectedEof)
    }

    pub fn read_f32(&mut self) -> FormatResult<f32> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(FormatError::UnexpectedEof)
    }

    /// Read a fixed-length field holding a NUL-terminated ASCII string.
    ///
    /// The whole field is consumed; the string ends at the first NUL.
    /// Bytes outside the ASCII range decode to U+FFFD.
    pub fn read_c_string(&mut self, len: usize) -> FormatResult<String> {
        let mut buf = vec![0u8; len];
        self.cursor
            .read_exact(&mut buf)
            .map_err(FormatError::UnexpectedEof)?;

        let end = buf.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(buf[..end]
            .iter()
            .map(|&b| {
                if b.is_ascii() {
                    b as char
                } else {
                    char::REPLACEMENT_CHARACTER
                }
            })
            .collect())
    }
}
