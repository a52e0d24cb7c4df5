//! # Aquifer simulation core
//!
//! Terrain-sculpting and water-basin engine: a player digs depth into a grid,
//! the engine partitions the dug terrain into a hierarchy of basins with an
//! acyclic overflow graph, and pumps move water between basins and external
//! reservoirs on discrete fixed-update ticks.
//!
//! The engine is headless and single-threaded: rendering, UI, and terrain
//! generation live elsewhere and talk to it through the resources, the
//! [`TerrainEditEvent`], and read-only queries. All core logic is plain
//! methods on the resource types, so everything is callable without an `App`.

use bevy::prelude::*;

pub mod basin;
pub mod basins;
pub mod config;
pub mod depth_queue;
pub mod heightmap;
pub mod pumps;
pub mod reservoirs;

#[cfg(test)]
pub mod test_harness;

pub use basin::{Basin, BasinId};
pub use basins::{BasinAnalysis, BasinManager};
pub use heightmap::HeightMap;
pub use pumps::{Pump, PumpManager, PumpMode};
pub use reservoirs::{Reservoir, ReservoirManager};

/// Global tick counter, incremented once per simulation step.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Request to set the dug depth of one tile. Senders batch a whole brush
/// stroke as a burst of these; the engine recomputes basins once per burst,
/// not once per tile.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainEditEvent {
    pub x: usize,
    pub y: usize,
    pub depth: u8,
}

/// Apply all queued terrain edits to the heightmap, then rebuild the basin
/// registry once if anything actually changed. Recompute is O(tiles) and the
/// dominant cost, which is why edits are batched per step.
pub fn apply_terrain_edits(
    mut edits: EventReader<TerrainEditEvent>,
    mut heights: ResMut<HeightMap>,
    mut basins: ResMut<BasinManager>,
) {
    let mut changed = false;
    for edit in edits.read() {
        changed |= heights.set_depth(edit.x, edit.y, edit.depth);
    }
    if changed {
        basins.compute_basins(&heights);
    }
}

/// One simulation tick: every pump attempts one transfer.
pub fn tick_pumps(
    mut ticks: ResMut<TickCounter>,
    pumps: Res<PumpManager>,
    mut basins: ResMut<BasinManager>,
    mut reservoirs: ResMut<ReservoirManager>,
) {
    ticks.0 += 1;
    pumps.tick(&mut basins, &mut reservoirs);
}

/// Registers the simulation resources, the terrain edit event, and the
/// fixed-update step (edits land before pumps run within the same step).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeightMap>()
            .init_resource::<BasinManager>()
            .init_resource::<ReservoirManager>()
            .init_resource::<PumpManager>()
            .init_resource::<TickCounter>()
            .add_event::<TerrainEditEvent>()
            .add_systems(FixedUpdate, (apply_terrain_edits, tick_pumps).chain());
    }
}
