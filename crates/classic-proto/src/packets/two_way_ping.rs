//! TwoWayPing (0x2B) — both directions. TwoWayPing v1.
//!
//! Either side sends a probe with an opaque token; the other side
//! echoes it back with the direction flag preserved.

use bytes::{Buf, BufMut};

use crate::codec::{read_i16, read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// 0 when the exchange was started by the client, 1 by the server.
pub const DIRECTION_CLIENT: u8 = 0;
pub const DIRECTION_SERVER: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoWayPing {
    pub direction: u8,
    pub token: i16,
}

impl TwoWayPing {
    pub const ID: u8 = id::TWO_WAY_PING;
    pub const EXTENSION: &'static str = "TwoWayPing";
}

impl ClassicEncode for TwoWayPing {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.direction);
        buf.put_i16(self.token);
    }
}

impl ClassicDecode for TwoWayPing {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            direction: read_u8(buf)?,
            token: read_i16(buf)?,
        })
    }
}
