//! World persistence: per-world directory holding meta.json and a
//! gzip block payload.
//!
//! Called at load and explicit save points only, never while holding a
//! world's lock; saves work from a block snapshot.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::info;

use classic_proto::types::PlayerPos;
use classic_world::World;

/// World metadata stored in meta.json.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorldMeta {
    pub name: String,
    pub width: i16,
    pub height: i16,
    pub depth: i16,
    pub spawn: PlayerPos,
}

const META_FILE: &str = "meta.json";
const BLOCKS_FILE: &str = "blocks.gz";

/// Save a world under `data_dir/<name>/`.
pub fn save_world(data_dir: &Path, world: &World) -> std::io::Result<()> {
    let dir = data_dir.join(world.name());
    std::fs::create_dir_all(&dir)?;

    let (width, height, depth) = world.dimensions();
    let meta = WorldMeta {
        name: world.name().to_string(),
        width,
        height,
        depth,
        spawn: world.spawn(),
    };
    let json = serde_json::to_string_pretty(&meta).map_err(std::io::Error::other)?;
    std::fs::write(dir.join(META_FILE), json)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&world.blocks_snapshot())?;
    std::fs::write(dir.join(BLOCKS_FILE), encoder.finish()?)?;

    info!(world = world.name(), "world saved");
    Ok(())
}

/// Load a world from `data_dir/<name>/`, or `None` if it was never
/// saved.
pub fn load_world(data_dir: &Path, name: &str) -> std::io::Result<Option<World>> {
    let dir = data_dir.join(name);
    let meta_path = dir.join(META_FILE);
    if !meta_path.exists() {
        return Ok(None);
    }

    let meta: WorldMeta = serde_json::from_str(&std::fs::read_to_string(&meta_path)?)
        .map_err(std::io::Error::other)?;

    let compressed = std::fs::read(dir.join(BLOCKS_FILE))?;
    let mut blocks = Vec::new();
    GzDecoder::new(&compressed[..]).read_to_end(&mut blocks)?;

    let world = World::new(
        meta.name,
        meta.width,
        meta.height,
        meta.depth,
        blocks,
        meta.spawn,
    )
    .map_err(|e| std::io::Error::other(e.to_string()))?;
    info!(world = name, "world loaded");
    Ok(Some(world))
}

/// Names of every world saved under `data_dir`.
pub fn saved_worlds(data_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    if !data_dir.exists() {
        return Ok(names);
    }
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if entry.path().join(META_FILE).exists() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
