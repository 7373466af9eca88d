//! Registry of loaded worlds.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::world::World;

/// All worlds hosted by the server, keyed by name. The set is fixed
/// after startup; worlds themselves are internally synchronized.
#[derive(Default)]
pub struct WorldRegistry {
    worlds: BTreeMap<String, Arc<World>>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, world: World) -> Arc<World> {
        let world = Arc::new(world);
        self.worlds.insert(world.name().to_string(), world.clone());
        world
    }

    pub fn get(&self, name: &str) -> Option<Arc<World>> {
        self.worlds.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.worlds.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<World>> {
        self.worlds.values()
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}
