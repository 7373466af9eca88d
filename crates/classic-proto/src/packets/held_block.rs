//! HoldThis (0x14) — Server → Client. HeldBlock v1.
//!
//! Forces the client's held block, optionally locking it.

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldThis {
    pub block: u8,
    pub prevent_change: bool,
}

impl HoldThis {
    pub const ID: u8 = id::HOLD_THIS;
    pub const EXTENSION: &'static str = "HeldBlock";
}

impl ClassicEncode for HoldThis {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.block);
        buf.put_u8(self.prevent_change as u8);
    }
}

impl ClassicDecode for HoldThis {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            block: read_u8(buf)?,
            prevent_change: read_u8(buf)? != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = HoldThis {
            block: 41,
            prevent_change: true,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(&buf[..], &[0x14, 41, 1]);
        let mut body = buf.freeze();
        body.advance(1);
        assert_eq!(HoldThis::decode(&mut body).unwrap(), pkt);
    }
}
