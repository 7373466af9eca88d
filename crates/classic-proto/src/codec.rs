//! Wire encoding/decoding traits and field helpers.
//!
//! All multi-byte integers are big-endian. Strings are fixed 64 bytes,
//! ASCII, space-padded; level data chunks are fixed 1024 bytes,
//! zero-padded.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Fixed wire length of a Classic string field.
pub const STRING_LEN: usize = 64;

/// Fixed wire length of a level data chunk field.
pub const CHUNK_LEN: usize = 1024;

/// Encode a value onto a buffer.
pub trait ClassicEncode {
    fn encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ClassicDecode: Sized {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Write a Classic string: truncated to 64 bytes, space-padded.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let mut out = [b' '; STRING_LEN];
    for (slot, byte) in out.iter_mut().zip(s.bytes().filter(u8::is_ascii)) {
        *slot = byte;
    }
    buf.put_slice(&out);
}

/// Read a Classic string: exactly 64 bytes, padding trimmed.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    if buf.remaining() < STRING_LEN {
        return Err(ProtoError::BufferTooShort {
            needed: STRING_LEN,
            remaining: buf.remaining(),
        });
    }
    let mut raw = [0u8; STRING_LEN];
    buf.copy_to_slice(&mut raw);
    if let Some(&bad) = raw.iter().find(|b| !b.is_ascii()) {
        return Err(ProtoError::NonAsciiString(bad));
    }
    // Padding is spaces; classic clients also pad with NUL.
    let text: String = raw.iter().map(|&b| b as char).collect();
    Ok(text.trim_matches([' ', '\0']).to_string())
}

/// Write a level data chunk: truncated to 1024 bytes, zero-padded.
pub fn write_chunk(buf: &mut impl BufMut, data: &[u8]) {
    let len = data.len().min(CHUNK_LEN);
    buf.put_slice(&data[..len]);
    buf.put_bytes(0, CHUNK_LEN - len);
}

/// Read a level data chunk: exactly 1024 bytes.
pub fn read_chunk(buf: &mut impl Buf) -> Result<[u8; CHUNK_LEN], ProtoError> {
    if buf.remaining() < CHUNK_LEN {
        return Err(ProtoError::BufferTooShort {
            needed: CHUNK_LEN,
            remaining: buf.remaining(),
        });
    }
    let mut raw = [0u8; CHUNK_LEN];
    buf.copy_to_slice(&mut raw);
    Ok(raw)
}

/// Checked big-endian i16 read.
pub fn read_i16(buf: &mut impl Buf) -> Result<i16, ProtoError> {
    if buf.remaining() < 2 {
        return Err(ProtoError::BufferTooShort {
            needed: 2,
            remaining: buf.remaining(),
        });
    }
    Ok(buf.get_i16())
}

/// Checked u8 read.
pub fn read_u8(buf: &mut impl Buf) -> Result<u8, ProtoError> {
    if !buf.has_remaining() {
        return Err(ProtoError::BufferTooShort {
            needed: 1,
            remaining: 0,
        });
    }
    Ok(buf.get_u8())
}

/// Checked i8 read.
pub fn read_i8(buf: &mut impl Buf) -> Result<i8, ProtoError> {
    read_u8(buf).map(|b| b as i8)
}

/// Checked big-endian i32 read (CPE ExtEntry version field).
pub fn read_i32(buf: &mut impl Buf) -> Result<i32, ProtoError> {
    if buf.remaining() < 4 {
        return Err(ProtoError::BufferTooShort {
            needed: 4,
            remaining: buf.remaining(),
        });
    }
    Ok(buf.get_i32())
}
