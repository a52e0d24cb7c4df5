//! Export/import for the Aquifer simulation.
//!
//! A world is captured into a [`SaveData`] snapshot, encoded with bitcode,
//! lz4-compressed, and wrapped in a checksummed header. Import runs the whole
//! pipeline in reverse and is **atomic**: every structural invariant is
//! validated against the decoded snapshot before any engine state is built,
//! so a malformed payload can never leave a half-restored world behind.

use bevy::prelude::*;

use simulation::basin::capacity_of;
use simulation::config::MAX_DEPTH;
use simulation::{
    Basin, BasinId, BasinManager, HeightMap, Pump, PumpManager, Reservoir, ReservoirManager,
};

pub mod codec;
pub mod file_header;
pub mod save_error;
pub mod save_types;

#[cfg(test)]
mod fuzz_tests;

pub use save_error::SaveError;
pub use save_types::{BasinRecord, PumpRecord, ReservoirRecord, SaveData, SAVE_VERSION};

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Snapshot a world's state. Highlight and reservoir selection are UI state
/// and deliberately not captured.
pub fn capture(
    heights: &HeightMap,
    basins: &BasinManager,
    reservoirs: &ReservoirManager,
    pumps: &PumpManager,
) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        width: heights.width as u32,
        height: heights.height as u32,
        heights: heights.depths().to_vec(),
        basins: basins
            .basins()
            .values()
            .map(|b| BasinRecord {
                id: b.id,
                depth: b.depth,
                tiles: b.tiles.iter().map(|&(x, y)| (x as u32, y as u32)).collect(),
                volume: b.volume,
                outlets: b.outlets.clone(),
            })
            .collect(),
        reservoirs: reservoirs
            .all()
            .map(|r| ReservoirRecord {
                id: r.id,
                volume: r.volume,
            })
            .collect(),
        pumps: pumps
            .pumps()
            .iter()
            .map(|p| PumpRecord {
                x: p.x as u32,
                y: p.y as u32,
                mode: p.mode,
                reservoir_id: p.reservoir_id,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// A fully reconstructed simulation world, ready to insert as resources.
#[derive(Debug)]
pub struct RestoredWorld {
    pub heights: HeightMap,
    pub basins: BasinManager,
    pub reservoirs: ReservoirManager,
    pub pumps: PumpManager,
}

fn invalid(msg: impl Into<String>) -> SaveError {
    SaveError::Validation(msg.into())
}

/// Validate a snapshot and build a fresh world from it.
///
/// All checks run against the snapshot alone; nothing is constructed until
/// every one has passed.
pub fn restore(data: &SaveData) -> Result<RestoredWorld, SaveError> {
    let width = data.width as usize;
    let height = data.height as usize;
    if data.heights.len() != width * height {
        return Err(invalid(format!(
            "heightmap has {} entries for a {width}x{height} grid",
            data.heights.len()
        )));
    }
    if let Some(bad) = data.heights.iter().find(|&&d| d > MAX_DEPTH) {
        return Err(invalid(format!("depth {bad} exceeds MAX_DEPTH {MAX_DEPTH}")));
    }

    // Pass 1: the id set, for outlet resolution.
    let mut ids = std::collections::BTreeSet::new();
    for record in &data.basins {
        if !ids.insert(record.id) {
            return Err(invalid(format!("duplicate basin id {}", record.id)));
        }
    }

    // Pass 2: per-basin structure, plus exclusive tile ownership.
    let mut claimed: Vec<Option<BasinId>> = vec![None; width * height];
    for record in &data.basins {
        let id = record.id;
        if record.depth != id.depth {
            return Err(invalid(format!(
                "basin {id} claims depth {} but its id encodes {}",
                record.depth, id.depth
            )));
        }
        if record.depth == 0 {
            return Err(invalid(format!("basin {id} sits at surface depth 0")));
        }
        if record.tiles.is_empty() {
            return Err(invalid(format!("basin {id} has no tiles")));
        }
        for &(x, y) in &record.tiles {
            let (x, y) = (x as usize, y as usize);
            if x >= width || y >= height {
                return Err(invalid(format!("basin {id} tile ({x},{y}) is off-map")));
            }
            if data.heights[y * width + x] != record.depth {
                return Err(invalid(format!(
                    "basin {id} tile ({x},{y}) has depth {} in the heightmap",
                    data.heights[y * width + x]
                )));
            }
            if let Some(other) = claimed[y * width + x] {
                return Err(invalid(format!(
                    "tile ({x},{y}) claimed by both {other} and {id}"
                )));
            }
            claimed[y * width + x] = Some(id);
        }
        let capacity = capacity_of(record.tiles.len(), record.depth);
        if record.volume < 0.0 || record.volume > capacity + 1e-3 {
            return Err(invalid(format!(
                "basin {id} volume {} outside [0, {capacity}]",
                record.volume
            )));
        }
        for outlet in &record.outlets {
            if !ids.contains(outlet) {
                return Err(invalid(format!(
                    "basin {id} outlet {outlet} does not exist"
                )));
            }
            if outlet.depth >= id.depth {
                return Err(invalid(format!(
                    "basin {id} outlet {outlet} is not shallower"
                )));
            }
        }
    }

    // Every dug tile must belong to a basin (the partition is total).
    for y in 0..height {
        for x in 0..width {
            if data.heights[y * width + x] > 0 && claimed[y * width + x].is_none() {
                return Err(invalid(format!("dug tile ({x},{y}) belongs to no basin")));
            }
        }
    }

    let mut reservoir_ids = std::collections::BTreeSet::new();
    for record in &data.reservoirs {
        if record.id == 0 {
            return Err(invalid("reservoir id 0 is reserved"));
        }
        if !reservoir_ids.insert(record.id) {
            return Err(invalid(format!("duplicate reservoir id {}", record.id)));
        }
        if record.volume < 0.0 {
            return Err(invalid(format!(
                "reservoir {} has negative volume {}",
                record.id, record.volume
            )));
        }
    }

    // Pumps may reference reservoirs absent from the records; those spring
    // into being empty (implicit creation on first reference).
    let mut implicit = Vec::new();
    for record in &data.pumps {
        if record.reservoir_id == 0 {
            return Err(invalid("pump wired to reserved reservoir id 0"));
        }
        let (x, y) = (record.x as usize, record.y as usize);
        if x >= width || y >= height {
            return Err(invalid(format!("pump at ({x},{y}) is off-map")));
        }
        if reservoir_ids.insert(record.reservoir_id) {
            implicit.push(record.reservoir_id);
        }
    }

    // Validation is complete: build the world.
    let heights = HeightMap::from_depths(width, height, data.heights.clone())
        .ok_or_else(|| invalid("heightmap rejected its own validated input"))?;
    let basins = BasinManager::from_parts(
        width,
        height,
        data.basins
            .iter()
            .map(|r| Basin {
                id: r.id,
                depth: r.depth,
                tiles: r
                    .tiles
                    .iter()
                    .map(|&(x, y)| (x as usize, y as usize))
                    .collect(),
                volume: r.volume,
                capacity: capacity_of(r.tiles.len(), r.depth),
                outlets: r.outlets.clone(),
            })
            .collect(),
    );
    let reservoirs = ReservoirManager::from_parts(
        data.reservoirs
            .iter()
            .map(|r| Reservoir {
                id: r.id,
                volume: r.volume,
            })
            .chain(implicit.into_iter().map(|id| Reservoir { id, volume: 0.0 }))
            .collect(),
    );
    let pumps = PumpManager::from_parts(
        data.pumps
            .iter()
            .map(|p| Pump {
                x: p.x as usize,
                y: p.y as usize,
                mode: p.mode,
                reservoir_id: p.reservoir_id,
            })
            .collect(),
    );

    Ok(RestoredWorld {
        heights,
        basins,
        reservoirs,
        pumps,
    })
}

// ---------------------------------------------------------------------------
// World-level helpers
// ---------------------------------------------------------------------------

/// Snapshot the simulation resources of an ECS world.
pub fn capture_world(world: &World) -> SaveData {
    capture(
        world.resource::<HeightMap>(),
        world.resource::<BasinManager>(),
        world.resource::<ReservoirManager>(),
        world.resource::<PumpManager>(),
    )
}

/// Capture and encode to the on-disk byte format.
pub fn export_world(world: &World) -> Vec<u8> {
    codec::encode(&capture_world(world))
}

/// Decode, validate, and swap the restored resources into the world. On any
/// error the world is left exactly as it was.
pub fn import_world(world: &mut World, bytes: &[u8]) -> Result<(), SaveError> {
    let data = codec::decode(bytes)?;
    let restored = restore(&data)?;
    world.insert_resource(restored.heights);
    world.insert_resource(restored.basins);
    world.insert_resource(restored.reservoirs);
    world.insert_resource(restored.pumps);
    info!("imported world: {} basins, {} pumps", data.basins.len(), data.pumps.len());
    Ok(())
}
