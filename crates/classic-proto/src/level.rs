//! Level snapshot encoding for the world transfer sequence.
//!
//! The full block array is prefixed with a big-endian block count,
//! gzip-compressed, and streamed to the client in 1024-byte chunks
//! between LevelInitialize and LevelFinalize.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::codec::CHUNK_LEN;
use crate::error::ProtoError;
use crate::packets::LevelDataChunk;

/// Gzip a block array with its 4-byte count header.
pub fn compress_blocks(blocks: &[u8]) -> Result<Vec<u8>, ProtoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&(blocks.len() as u32).to_be_bytes())
        .and_then(|_| encoder.write_all(blocks))
        .map_err(|e| ProtoError::Compress(e.to_string()))?;
    encoder.finish().map_err(|e| ProtoError::Compress(e.to_string()))
}

/// Split a compressed snapshot into LevelDataChunk packets with a
/// percent-complete per chunk.
pub fn chunk_snapshot(compressed: &[u8]) -> Vec<LevelDataChunk> {
    let total = compressed.chunks(CHUNK_LEN).count().max(1);
    compressed
        .chunks(CHUNK_LEN)
        .enumerate()
        .map(|(i, chunk)| LevelDataChunk {
            length: chunk.len() as i16,
            data: {
                let mut data = [0u8; CHUNK_LEN];
                data[..chunk.len()].copy_from_slice(chunk);
                data
            },
            percent: (100 * (i + 1) / total) as u8,
        })
        .collect()
}
