//! Block updates: SetBlock client (0x05) and server (0x06).
//!
//! The client reports a create/destroy action; the server broadcasts
//! the resulting block value to everyone in the world.

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ClassicDecode, ClassicEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::BlockPos;

/// Client block action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockMode {
    Destroy = 0,
    Create = 1,
}

impl BlockMode {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(BlockMode::Destroy),
            1 => Ok(BlockMode::Create),
            _ => Err(ProtoError::InvalidField {
                id: SetBlockClient::ID,
                reason: format!("unknown block mode {v}"),
            }),
        }
    }
}

/// Client → Server block change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockClient {
    pub pos: BlockPos,
    pub mode: BlockMode,
    pub block: u8,
}

impl SetBlockClient {
    pub const ID: u8 = id::SET_BLOCK_CLIENT;

    /// Block value the world should end up holding: air on destroy,
    /// the held block on create.
    pub fn effective_block(&self) -> u8 {
        match self.mode {
            BlockMode::Destroy => 0,
            BlockMode::Create => self.block,
        }
    }
}

impl ClassicEncode for SetBlockClient {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        self.pos.encode(buf);
        buf.put_u8(self.mode as u8);
        buf.put_u8(self.block);
    }
}

impl ClassicDecode for SetBlockClient {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            pos: BlockPos::decode(buf)?,
            mode: BlockMode::from_u8(read_u8(buf)?)?,
            block: read_u8(buf)?,
        })
    }
}

/// Server → Client block update broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockServer {
    pub pos: BlockPos,
    pub block: u8,
}

impl SetBlockServer {
    pub const ID: u8 = id::SET_BLOCK_SERVER;
}

impl ClassicEncode for SetBlockServer {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(Self::ID);
        self.pos.encode(buf);
        buf.put_u8(self.block);
    }
}

impl ClassicDecode for SetBlockServer {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            pos: BlockPos::decode(buf)?,
            block: read_u8(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn client_roundtrip() {
        let pkt = SetBlockClient {
            pos: BlockPos::new(5, 5, 5),
            mode: BlockMode::Create,
            block: 4,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), 9);
        let mut body = buf.freeze();
        body.advance(1);
        assert_eq!(SetBlockClient::decode(&mut body).unwrap(), pkt);
    }

    #[test]
    fn destroy_yields_air() {
        let pkt = SetBlockClient {
            pos: BlockPos::new(1, 2, 3),
            mode: BlockMode::Destroy,
            block: 4,
        };
        assert_eq!(pkt.effective_block(), 0);
    }

    #[test]
    fn create_yields_held_block() {
        let pkt = SetBlockClient {
            pos: BlockPos::new(1, 2, 3),
            mode: BlockMode::Create,
            block: 17,
        };
        assert_eq!(pkt.effective_block(), 17);
    }

    #[test]
    fn bad_mode_rejected() {
        let raw = [0u8, 5, 0, 5, 0, 5, 9, 4];
        assert!(matches!(
            SetBlockClient::decode(&mut &raw[..]),
            Err(ProtoError::InvalidField { id: 0x05, .. })
        ));
    }

    #[test]
    fn server_roundtrip() {
        let pkt = SetBlockServer {
            pos: BlockPos::new(5, 5, 5),
            block: 4,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(&buf[..], &[0x06, 0, 5, 0, 5, 0, 5, 4]);
        let mut body = buf.freeze();
        body.advance(1);
        assert_eq!(SetBlockServer::decode(&mut body).unwrap(), pkt);
    }
}
