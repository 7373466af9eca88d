//! Identification (0x00) — both directions.
//!
//! First packet of every session. The client declares its protocol
//! version and name; the 0x42 pad byte signals CPE support. The server
//! answers with its name, MOTD, and the client's user type.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, read_u8, write_string, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::CPE_MAGIC;

/// Client → Server identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentification {
    pub protocol_version: u8,
    pub username: String,
    /// md5(salt + username) when name verification is on.
    pub verification_key: String,
    /// 0x42 when the client supports CPE negotiation.
    pub pad: u8,
}

impl PlayerIdentification {
    pub const ID: u8 = id::IDENTIFICATION;

    pub fn supports_cpe(&self) -> bool {
        self.pad == CPE_MAGIC
    }
}

impl ClassicEncode for PlayerIdentification {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.username);
        write_string(buf, &self.verification_key);
        buf.put_u8(self.pad);
    }
}

impl ClassicDecode for PlayerIdentification {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            protocol_version: read_u8(buf)?,
            username: read_string(buf)?,
            verification_key: read_string(buf)?,
            pad: read_u8(buf)?,
        })
    }
}

/// Server → Client identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentification {
    pub protocol_version: u8,
    pub server_name: String,
    pub motd: String,
    /// 0x64 for operators, 0x00 otherwise.
    pub user_type: u8,
}

impl ServerIdentification {
    pub const ID: u8 = id::IDENTIFICATION;
}

impl ClassicEncode for ServerIdentification {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.server_name);
        write_string(buf, &self.motd);
        buf.put_u8(self.user_type);
    }
}

impl ClassicDecode for ServerIdentification {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            protocol_version: read_u8(buf)?,
            server_name: read_string(buf)?,
            motd: read_string(buf)?,
            user_type: read_u8(buf)?,
        })
    }
}
