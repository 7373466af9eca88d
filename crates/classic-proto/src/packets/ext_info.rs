//! CPE negotiation packets: ExtInfo (0x10) and ExtEntry (0x11), both
//! directions.
//!
//! Each side sends one ExtInfo carrying its software name and entry
//! count, followed by that many ExtEntry packets.

use bytes::{Buf, BufMut};

use crate::codec::{read_i16, read_i32, read_string, write_string, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtInfo {
    /// Software name and version of the sender.
    pub app_name: String,
    /// Number of ExtEntry packets that follow.
    pub extension_count: i16,
}

impl ExtInfo {
    pub const ID: u8 = id::EXT_INFO;
}

impl ClassicEncode for ExtInfo {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        write_string(buf, &self.app_name);
        buf.put_i16(self.extension_count);
    }
}

impl ClassicDecode for ExtInfo {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let app_name = read_string(buf)?;
        let extension_count = read_i16(buf)?;
        if extension_count < 0 {
            return Err(ProtoError::InvalidField {
                id: Self::ID,
                reason: format!("negative extension count {extension_count}"),
            });
        }
        Ok(Self {
            app_name,
            extension_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtEntry {
    pub name: String,
    pub version: i32,
}

impl ExtEntry {
    pub const ID: u8 = id::EXT_ENTRY;
}

impl ClassicEncode for ExtEntry {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        write_string(buf, &self.name);
        buf.put_i32(self.version);
    }
}

impl ClassicDecode for ExtEntry {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            name: read_string(buf)?,
            version: read_i32(buf)?,
        })
    }
}
