//! DisconnectPlayer (0x0E) — Server → Client. Final packet before the
//! socket closes, carrying a human-readable reason.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectPlayer {
    pub reason: String,
}

impl DisconnectPlayer {
    pub const ID: u8 = id::DISCONNECT;

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ClassicEncode for DisconnectPlayer {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        write_string(buf, &self.reason);
    }
}

impl ClassicDecode for DisconnectPlayer {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            reason: read_string(buf)?,
        })
    }
}
