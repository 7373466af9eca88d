//! DespawnPlayer (0x0C) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespawnPlayer {
    pub entity_id: u8,
}

impl DespawnPlayer {
    pub const ID: u8 = id::DESPAWN_PLAYER;
}

impl ClassicEncode for DespawnPlayer {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        buf.put_u8(self.entity_id);
    }
}

impl ClassicDecode for DespawnPlayer {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: read_u8(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = DespawnPlayer { entity_id: 7 };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(&buf[..], &[0x0C, 7]);
        let mut body = buf.freeze();
        body.advance(1);
        assert_eq!(DespawnPlayer::decode(&mut body).unwrap(), pkt);
    }
}
