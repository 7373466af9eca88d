//! Level transfer sequence (0x02, 0x03, 0x04) — Server → Client.
//!
//! LevelInitialize, then one LevelDataChunk per 1024 bytes of the
//! gzipped block snapshot, then LevelFinalize with the dimensions.

use bytes::{Buf, BufMut};

use crate::codec::{read_chunk, read_i16, read_u8, write_chunk, ClassicDecode, ClassicEncode, CHUNK_LEN};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelInitialize;

impl LevelInitialize {
    pub const ID: u8 = id::LEVEL_INITIALIZE;
}

impl ClassicEncode for LevelInitialize {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
    }
}

impl ClassicDecode for LevelInitialize {
    fn decode(_buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(LevelInitialize)
    }
}

/// One 1024-byte slice of the gzipped level snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct LevelDataChunk {
    /// Bytes of `data` that are meaningful.
    pub length: i16,
    pub data: [u8; CHUNK_LEN],
    /// Transfer progress, 0-100.
    pub percent: u8,
}

impl LevelDataChunk {
    pub const ID: u8 = id::LEVEL_DATA_CHUNK;
}

impl std::fmt::Debug for LevelDataChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelDataChunk")
            .field("length", &self.length)
            .field("percent", &self.percent)
            .finish()
    }
}

impl ClassicEncode for LevelDataChunk {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_i16(self.length);
        write_chunk(buf, &self.data);
        buf.put_u8(self.percent);
    }
}

impl ClassicDecode for LevelDataChunk {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let length = read_i16(buf)?;
        if !(0..=CHUNK_LEN as i16).contains(&length) {
            return Err(ProtoError::InvalidField {
                id: Self::ID,
                reason: format!("chunk length {length} out of range"),
            });
        }
        Ok(Self {
            length,
            data: read_chunk(buf)?,
            percent: read_u8(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelFinalize {
    pub width: i16,
    pub height: i16,
    pub depth: i16,
}

impl LevelFinalize {
    pub const ID: u8 = id::LEVEL_FINALIZE;
}

impl ClassicEncode for LevelFinalize {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_i16(self.width);
        buf.put_i16(self.height);
        buf.put_i16(self.depth);
    }
}

impl ClassicDecode for LevelFinalize {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            width: read_i16(buf)?,
            height: read_i16(buf)?,
            depth: read_i16(buf)?,
        })
    }
}
