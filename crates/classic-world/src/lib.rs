//! World state: block storage, entity records, the per-world
//! serialization point, and broadcast fan-out.

pub mod blocks;
pub mod error;
pub mod events;
pub mod mapgen;
pub mod queue;
pub mod registry;
pub mod world;

pub use error::WorldError;
pub use events::WorldEvent;
pub use queue::{Drained, OverflowPolicy, QueuedPacket, SendQueue};
pub use registry::WorldRegistry;
pub use world::{JoinInfo, World, MAX_ENTITIES};
