//! World events and their per-recipient wire encoding.
//!
//! One event is produced per world mutation and encoded once per
//! recipient, so capability differences (e.g. MessageTypes) translate
//! at the broadcast boundary rather than in world logic.

use bytes::BytesMut;

use classic_proto::codec::ClassicEncode;
use classic_proto::cpe::NegotiatedCaps;
use classic_proto::packets::{
    DespawnPlayer, Message, MessageType, PositionOrientation, SetBlockServer, SpawnPlayer,
};
use classic_proto::types::{BlockPos, PlayerPos, SELF_ENTITY_ID};

use crate::queue::QueuedPacket;

/// A state change every member of a world must observe.
#[derive(Clone, Debug)]
pub enum WorldEvent {
    BlockChanged {
        pos: BlockPos,
        block: u8,
    },
    Spawned {
        entity_id: u8,
        name: String,
        pos: PlayerPos,
    },
    Despawned {
        entity_id: u8,
    },
    Moved {
        entity_id: u8,
        pos: PlayerPos,
    },
    Chat {
        /// Entity id of the speaker, or `None` for server messages.
        speaker: Option<u8>,
        kind: MessageType,
        text: String,
    },
}

impl WorldEvent {
    /// Encode for one recipient, translating for its capability set.
    /// `recipient_id` is the recipient's own entity id, so spawn and
    /// movement events about itself use the self sentinel.
    pub fn encode_for(&self, recipient_id: u8, caps: &NegotiatedCaps) -> QueuedPacket {
        let mut buf = BytesMut::new();
        match self {
            WorldEvent::BlockChanged { pos, block } => {
                SetBlockServer {
                    pos: *pos,
                    block: *block,
                }
                .encode(&mut buf);
                QueuedPacket::droppable(buf.freeze())
            }
            WorldEvent::Spawned {
                entity_id,
                name,
                pos,
            } => {
                SpawnPlayer {
                    entity_id: wire_id(*entity_id, recipient_id),
                    name: name.clone(),
                    pos: *pos,
                }
                .encode(&mut buf);
                QueuedPacket::critical(buf.freeze())
            }
            WorldEvent::Despawned { entity_id } => {
                DespawnPlayer {
                    entity_id: wire_id(*entity_id, recipient_id),
                }
                .encode(&mut buf);
                QueuedPacket::critical(buf.freeze())
            }
            WorldEvent::Moved { entity_id, pos } => {
                PositionOrientation {
                    entity_id: wire_id(*entity_id, recipient_id),
                    pos: *pos,
                }
                .encode(&mut buf);
                QueuedPacket::droppable(buf.freeze())
            }
            WorldEvent::Chat {
                speaker,
                kind,
                text,
            } => {
                let tag = match speaker {
                    Some(id) => *id,
                    // Non-chat routing codes only mean something to
                    // clients that negotiated MessageTypes.
                    None if caps.supports("MessageTypes", 1) => *kind as u8,
                    None => MessageType::Chat as u8,
                };
                Message {
                    tag,
                    text: text.clone(),
                }
                .encode(&mut buf);
                QueuedPacket::droppable(buf.freeze())
            }
        }
    }
}

fn wire_id(entity_id: u8, recipient_id: u8) -> u8 {
    if entity_id == recipient_id {
        SELF_ENTITY_ID
    } else {
        entity_id
    }
}

/// Encode a standalone packet into a queue entry.
pub fn encoded(packet: &impl ClassicEncode, critical: bool) -> QueuedPacket {
    let mut buf = BytesMut::new();
    packet.encode(&mut buf);
    QueuedPacket {
        critical,
        bytes: buf.freeze(),
    }
}
