//! Classic packet definitions.
//!
//! Convention: `encode` emits the full wire form including the id
//! byte; `decode` consumes the body only, the dispatcher having
//! already read and routed on the id.

pub mod click_distance;
pub mod despawn;
pub mod disconnect;
pub mod ext_info;
pub mod held_block;
pub mod identification;
pub mod level;
pub mod message;
pub mod ping;
pub mod position;
pub mod set_block;
pub mod spawn_player;
pub mod two_way_ping;
pub mod user_type;

pub use click_distance::SetClickDistance;
pub use despawn::DespawnPlayer;
pub use disconnect::DisconnectPlayer;
pub use ext_info::{ExtEntry, ExtInfo};
pub use held_block::HoldThis;
pub use identification::{PlayerIdentification, ServerIdentification};
pub use level::{LevelDataChunk, LevelFinalize, LevelInitialize};
pub use message::{Message, MessageType};
pub use ping::Ping;
pub use position::PositionOrientation;
pub use set_block::{BlockMode, SetBlockClient, SetBlockServer};
pub use spawn_player::SpawnPlayer;
pub use two_way_ping::TwoWayPing;
pub use user_type::UpdateUserType;

/// Packet ids. 0x00-0x0F are the base protocol; higher ids belong to
/// negotiated extensions.
pub mod id {
    pub const IDENTIFICATION: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK_CLIENT: u8 = 0x05;
    pub const SET_BLOCK_SERVER: u8 = 0x06;
    pub const SPAWN_PLAYER: u8 = 0x07;
    pub const POSITION_ORIENTATION: u8 = 0x08;
    pub const DESPAWN_PLAYER: u8 = 0x0C;
    pub const MESSAGE: u8 = 0x0D;
    pub const DISCONNECT: u8 = 0x0E;
    pub const UPDATE_USER_TYPE: u8 = 0x0F;
    pub const EXT_INFO: u8 = 0x10;
    pub const EXT_ENTRY: u8 = 0x11;
    pub const SET_CLICK_DISTANCE: u8 = 0x12;
    pub const HOLD_THIS: u8 = 0x14;
    pub const TWO_WAY_PING: u8 = 0x2B;
}
