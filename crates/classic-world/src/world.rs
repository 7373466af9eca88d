//! One voxel map, its entities, and the serialization point that
//! orders every mutation and broadcast.
//!
//! All state lives behind a single mutex per world; mutation and
//! fan-out happen in one locked step, so every member observes the
//! same order of changes. Queue pushes never block, keeping the
//! critical sections short. Different worlds lock independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use classic_proto::cpe::NegotiatedCaps;
use classic_proto::level;
use classic_proto::packets::{LevelFinalize, LevelInitialize, MessageType, SpawnPlayer};
use classic_proto::types::{BlockPos, PlayerPos, SELF_ENTITY_ID};

use crate::error::WorldError;
use crate::events::{encoded, WorldEvent};
use crate::queue::SendQueue;

/// Entity id space per world: 0..=127, with 255 reserved for "self".
pub const MAX_ENTITIES: usize = 128;

/// A connection's projection into a world.
struct Member {
    name: String,
    pos: PlayerPos,
    caps: NegotiatedCaps,
    queue: Arc<SendQueue>,
}

struct WorldState {
    blocks: Vec<u8>,
    members: HashMap<u8, Member>,
}

/// Result of joining a world.
#[derive(Debug, Clone, Copy)]
pub struct JoinInfo {
    pub entity_id: u8,
    pub spawn: PlayerPos,
}

pub struct World {
    name: String,
    width: i16,
    height: i16,
    depth: i16,
    spawn: PlayerPos,
    state: Mutex<WorldState>,
}

impl World {
    pub fn new(
        name: impl Into<String>,
        width: i16,
        height: i16,
        depth: i16,
        blocks: Vec<u8>,
        spawn: PlayerPos,
    ) -> Result<Self, WorldError> {
        let volume = width as usize * height as usize * depth as usize;
        if width <= 0 || height <= 0 || depth <= 0 || blocks.len() != volume {
            return Err(WorldError::DimensionMismatch {
                width,
                height,
                depth,
                len: blocks.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            depth,
            spawn,
            state: Mutex::new(WorldState {
                blocks,
                members: HashMap::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (i16, i16, i16) {
        (self.width, self.height, self.depth)
    }

    pub fn spawn(&self) -> PlayerPos {
        self.spawn
    }

    /// Block index for in-bounds coordinates, `(y * depth + z) * width + x`.
    fn index(&self, pos: BlockPos) -> Option<usize> {
        let in_bounds = (0..self.width).contains(&pos.x)
            && (0..self.height).contains(&pos.y)
            && (0..self.depth).contains(&pos.z);
        in_bounds.then(|| {
            (pos.y as usize * self.depth as usize + pos.z as usize) * self.width as usize
                + pos.x as usize
        })
    }

    fn out_of_bounds(&self, pos: BlockPos) -> WorldError {
        WorldError::OutOfBounds {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    pub fn block_at(&self, pos: BlockPos) -> Result<u8, WorldError> {
        let idx = self.index(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        let state = self.state.lock().expect("world lock poisoned");
        Ok(state.blocks[idx])
    }

    /// Validate, apply, and broadcast one block mutation. Out-of-range
    /// writes are rejected before any state is touched; the broadcast
    /// includes the originator so mis-predicted client edits re-sync.
    pub fn apply_block_change(&self, pos: BlockPos, block: u8) -> Result<(), WorldError> {
        let idx = self.index(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        let mut state = self.state.lock().expect("world lock poisoned");
        state.blocks[idx] = block;
        self.broadcast_locked(&state, &WorldEvent::BlockChanged { pos, block }, None);
        Ok(())
    }

    /// Place a new entity in the world: allocate an id, stream the
    /// level snapshot and current entities to the joiner, and announce
    /// the newcomer to everyone else — all in one ordered step.
    pub fn join(
        &self,
        name: impl Into<String>,
        caps: NegotiatedCaps,
        queue: Arc<SendQueue>,
    ) -> Result<JoinInfo, WorldError> {
        let name = name.into();
        let mut state = self.state.lock().expect("world lock poisoned");

        let entity_id = (0..MAX_ENTITIES as u8)
            .find(|id| !state.members.contains_key(id))
            .ok_or(WorldError::WorldFull)?;

        // Level transfer.
        let compressed = level::compress_blocks(&state.blocks)
            .map_err(|e| WorldError::Snapshot(e.to_string()))?;
        queue.push(encoded(&LevelInitialize, true));
        for chunk in level::chunk_snapshot(&compressed) {
            queue.push(encoded(&chunk, true));
        }
        queue.push(encoded(
            &LevelFinalize {
                width: self.width,
                height: self.height,
                depth: self.depth,
            },
            true,
        ));

        // Entities already present, then the joiner's own spawn.
        for (id, member) in &state.members {
            queue.push(encoded(
                &SpawnPlayer {
                    entity_id: *id,
                    name: member.name.clone(),
                    pos: member.pos,
                },
                true,
            ));
        }
        queue.push(encoded(
            &SpawnPlayer {
                entity_id: SELF_ENTITY_ID,
                name: name.clone(),
                pos: self.spawn,
            },
            true,
        ));

        state.members.insert(
            entity_id,
            Member {
                name: name.clone(),
                pos: self.spawn,
                caps,
                queue,
            },
        );
        self.broadcast_locked(
            &state,
            &WorldEvent::Spawned {
                entity_id,
                name: name.clone(),
                pos: self.spawn,
            },
            Some(entity_id),
        );

        info!(world = %self.name, name = %name, entity_id, "entity joined world");
        Ok(JoinInfo {
            entity_id,
            spawn: self.spawn,
        })
    }

    /// Remove an entity and broadcast its despawn. Releasing the id
    /// makes it available to the next joiner.
    pub fn leave(&self, entity_id: u8) {
        let mut state = self.state.lock().expect("world lock poisoned");
        if let Some(member) = state.members.remove(&entity_id) {
            self.broadcast_locked(&state, &WorldEvent::Despawned { entity_id }, None);
            debug!(world = %self.name, name = %member.name, entity_id, "entity left world");
        }
    }

    /// Record a movement update and broadcast it. When `echo_to_self`
    /// is off the mover is excluded instead of re-synchronized.
    pub fn move_entity(&self, entity_id: u8, pos: PlayerPos, echo_to_self: bool) {
        let mut state = self.state.lock().expect("world lock poisoned");
        let Some(member) = state.members.get_mut(&entity_id) else {
            return;
        };
        member.pos = pos;
        let exclude = (!echo_to_self).then_some(entity_id);
        self.broadcast_locked(&state, &WorldEvent::Moved { entity_id, pos }, exclude);
    }

    /// Deliver a chat line to every member.
    pub fn chat(&self, speaker: Option<u8>, kind: MessageType, text: impl Into<String>) {
        let state = self.state.lock().expect("world lock poisoned");
        self.broadcast_locked(
            &state,
            &WorldEvent::Chat {
                speaker,
                kind,
                text: text.into(),
            },
            None,
        );
    }

    fn broadcast_locked(&self, state: &WorldState, event: &WorldEvent, exclude: Option<u8>) {
        for (id, member) in &state.members {
            if Some(*id) == exclude {
                continue;
            }
            member.queue.push(event.encode_for(*id, &member.caps));
        }
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().expect("world lock poisoned").members.len()
    }

    pub fn member_names(&self) -> Vec<String> {
        let state = self.state.lock().expect("world lock poisoned");
        state.members.values().map(|m| m.name.clone()).collect()
    }

    /// Copy of the block array for persistence. Never called from
    /// inside the mutation path.
    pub fn blocks_snapshot(&self) -> Vec<u8> {
        self.state.lock().expect("world lock poisoned").blocks.clone()
    }
}
