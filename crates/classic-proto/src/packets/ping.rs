//! Ping (0x01) — Server → Client. Keep-alive probe for idle clients.

use bytes::{Buf, BufMut};

use crate::codec::{ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ping;

impl Ping {
    pub const ID: u8 = id::PING;
}

impl ClassicEncode for Ping {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
    }
}

impl ClassicDecode for Ping {
    fn decode(_buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Ping)
    }
}
