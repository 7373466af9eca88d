//! Packet layout declarations and per-connection packet tables.
//!
//! A [`PacketSpec`] describes the fixed field layout of one packet id.
//! Extensions can add new ids or replace a base layout; the effective
//! inbound table for a connection is resolved once from its negotiated
//! capability set and is a pure lookup afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{CHUNK_LEN, STRING_LEN};
use crate::cpe::{CapabilityRegistry, NegotiatedCaps};
use crate::error::ProtoError;

/// Wire field kinds a Classic packet can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    SByte,
    Short,
    Int,
    String,
    ByteArray,
}

impl FieldType {
    pub fn wire_size(&self) -> usize {
        match self {
            FieldType::Byte | FieldType::SByte => 1,
            FieldType::Short => 2,
            FieldType::Int => 4,
            FieldType::String => STRING_LEN,
            FieldType::ByteArray => CHUNK_LEN,
        }
    }
}

/// Which side sends a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    Both,
}

impl Direction {
    pub fn inbound(&self) -> bool {
        matches!(self, Direction::ClientToServer | Direction::Both)
    }
}

/// Declared layout of one packet id. Immutable after registration.
#[derive(Clone, Debug)]
pub struct PacketSpec {
    pub id: u8,
    pub name: &'static str,
    pub direction: Direction,
    pub fields: Vec<FieldType>,
    /// Name of the capability this spec belongs to; `None` for the
    /// base protocol.
    pub extension: Option<&'static str>,
}

impl PacketSpec {
    pub fn base(id: u8, name: &'static str, direction: Direction, fields: Vec<FieldType>) -> Self {
        Self {
            id,
            name,
            direction,
            fields,
            extension: None,
        }
    }

    pub fn extension(
        id: u8,
        name: &'static str,
        direction: Direction,
        fields: Vec<FieldType>,
        capability: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            direction,
            fields,
            extension: Some(capability),
        }
    }

    /// Total wire size including the id byte.
    pub fn wire_size(&self) -> usize {
        1 + self.body_size()
    }

    /// Wire size of everything after the id byte.
    pub fn body_size(&self) -> usize {
        self.fields.iter().map(FieldType::wire_size).sum()
    }
}

/// Base-protocol packets the server accepts during the play loop.
pub fn base_play_specs() -> Vec<Arc<PacketSpec>> {
    use FieldType::*;
    vec![
        Arc::new(PacketSpec::base(
            crate::packets::id::SET_BLOCK_CLIENT,
            "SetBlock",
            Direction::ClientToServer,
            vec![Short, Short, Short, Byte, Byte],
        )),
        Arc::new(PacketSpec::base(
            crate::packets::id::POSITION_ORIENTATION,
            "PositionOrientation",
            Direction::Both,
            vec![SByte, Short, Short, Short, Byte, Byte],
        )),
        Arc::new(PacketSpec::base(
            crate::packets::id::MESSAGE,
            "Message",
            Direction::Both,
            vec![Byte, String],
        )),
    ]
}

enum TableEntry {
    /// Decodable on this connection.
    Active(Arc<PacketSpec>),
    /// Id belongs to a registered capability this connection did not
    /// negotiate; receiving it would desynchronize the stream.
    Gated(&'static str),
}

/// Effective inbound packet table for one connection.
pub struct PacketTable {
    entries: HashMap<u8, TableEntry>,
}

impl PacketTable {
    /// Resolve the table from the frozen registry and the capability
    /// set agreed with this connection.
    pub fn resolve(registry: &CapabilityRegistry, caps: &NegotiatedCaps) -> Self {
        let mut entries = HashMap::new();
        for spec in base_play_specs() {
            entries.insert(spec.id, TableEntry::Active(spec));
        }
        for cap in registry.list() {
            let active = caps.supports(cap.name, cap.version);
            for spec in &cap.packets {
                if !spec.direction.inbound() {
                    continue;
                }
                if active {
                    entries.insert(spec.id, TableEntry::Active(spec.clone()));
                } else {
                    // Never shadow a base packet just because an
                    // extension that re-shapes it was not negotiated.
                    entries
                        .entry(spec.id)
                        .or_insert(TableEntry::Gated(cap.name));
                }
            }
        }
        Self { entries }
    }

    /// Look up the spec for an inbound packet id.
    pub fn lookup(&self, id: u8) -> Result<&Arc<PacketSpec>, ProtoError> {
        match self.entries.get(&id) {
            Some(TableEntry::Active(spec)) => Ok(spec),
            Some(TableEntry::Gated(extension)) => Err(ProtoError::RequiresExtension {
                id,
                extension: (*extension).to_string(),
            }),
            None => Err(ProtoError::UnknownPacketId(id)),
        }
    }
}
