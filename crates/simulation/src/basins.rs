//! Watershed partitioning and the basin registry.
//!
//! [`BasinManager`] owns the whole partition of a heightmap into basins: the
//! registry itself, the per-tile basin index, the directed overflow (outlet)
//! graph, and the cascade that moves excess water toward shallower ground.
//! The registry is an arena that is rebuilt wholesale by
//! [`BasinManager::compute_basins`] on every terrain edit and never partially
//! mutated afterward; water transfers change volumes, not topology.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::*;

use crate::basin::{capacity_of, Basin, BasinId};
use crate::config::VOLUME_EPSILON;
use crate::depth_queue::DepthBucketQueue;
use crate::heightmap::HeightMap;

/// Read-only outlet-graph diagnostics for the debug panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasinAnalysis {
    /// Total basins in the registry.
    pub basin_count: usize,
    /// Largest outlet fan-out of any single basin.
    pub max_degree: usize,
    /// Longest chain of outlet hops, in edges.
    pub max_depth: usize,
}

/// Basin registry plus the derived per-tile index.
#[derive(Resource, Debug, Default)]
pub struct BasinManager {
    basins: BTreeMap<BasinId, Basin>,
    /// Row-major tile -> basin mapping. Rebuilt with the registry; `None` on
    /// undug tiles.
    index: Vec<Option<BasinId>>,
    width: usize,
    height: usize,
    /// Pure UI selection state; not simulation state and not persisted.
    highlighted: Option<BasinId>,
}

impl BasinManager {
    // -----------------------------------------------------------------------
    // Partitioning
    // -----------------------------------------------------------------------

    /// Rebuild the registry and tile index from the full heightmap.
    ///
    /// Every dug tile is seeded into the depth bucket queue in row-major
    /// order and popped in increasing depth order, so by the time a region at
    /// depth `d` is flooded, all shallower regions already carry their final
    /// ids, which is what lets outlet edges resolve during the flood itself.
    /// Within one depth level, regions are labeled A, B, .. in row-major
    /// order of their first tile, making the whole partition deterministic
    /// and idempotent.
    pub fn compute_basins(&mut self, heights: &HeightMap) {
        self.width = heights.width;
        self.height = heights.height;
        self.basins = BTreeMap::new();
        self.index = vec![None; self.width * self.height];

        let mut queue = DepthBucketQueue::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let depth = heights.depth_at(x, y);
                if depth > 0 {
                    queue.push(depth, (x, y));
                }
            }
        }

        let mut next_ordinal: BTreeMap<u8, u32> = BTreeMap::new();
        let mut frontier = VecDeque::new();

        while let Some((depth, (seed_x, seed_y))) = queue.pop() {
            if self.index[seed_y * self.width + seed_x].is_some() {
                continue;
            }
            let ordinal = next_ordinal.entry(depth).or_insert(0);
            let id = BasinId::new(depth, *ordinal);
            *ordinal += 1;

            // Flood the maximal same-depth 4-connected region around the
            // seed, collecting outlet edges at the boundary as we go.
            let mut tiles = Vec::new();
            let mut outlets: Vec<BasinId> = Vec::new();
            frontier.clear();
            frontier.push_back((seed_x, seed_y));
            self.index[seed_y * self.width + seed_x] = Some(id);

            while let Some((x, y)) = frontier.pop_front() {
                tiles.push((x, y));
                for (nx, ny) in heights.neighbors4(x, y) {
                    let neighbor_depth = heights.depth_at(nx, ny);
                    if neighbor_depth == depth {
                        let idx = ny * self.width + nx;
                        if self.index[idx].is_none() {
                            self.index[idx] = Some(id);
                            frontier.push_back((nx, ny));
                        }
                    } else if neighbor_depth > 0 && neighbor_depth < depth {
                        // Shallower dug ground: its basin was delineated in an
                        // earlier pass of the queue. Depth-0 neighbors are the
                        // open surface and record no outlet.
                        if let Some(outlet) = self.index[ny * self.width + nx] {
                            if !outlets.contains(&outlet) {
                                outlets.push(outlet);
                            }
                        }
                    }
                }
            }

            debug_assert!(
                outlets.iter().all(|o| o.depth < depth),
                "outlet of {id} must point at strictly shallower ground"
            );
            let capacity = capacity_of(tiles.len(), depth);
            self.basins.insert(
                id,
                Basin {
                    id,
                    depth,
                    tiles,
                    volume: 0.0,
                    capacity,
                    outlets,
                },
            );
        }

        // The highlighted basin may have been dug away.
        if let Some(h) = self.highlighted {
            if !self.basins.contains_key(&h) {
                self.highlighted = None;
            }
        }

        debug!(
            "computed {} basins over {}x{} tiles",
            self.basins.len(),
            self.width,
            self.height
        );
    }

    /// Rebuild a manager from persisted basins, reconstructing the tile
    /// index. The caller (the save crate) validates tile exclusivity and
    /// outlet references before handing basins over.
    pub fn from_parts(width: usize, height: usize, basins: Vec<Basin>) -> Self {
        let mut index = vec![None; width * height];
        let mut registry = BTreeMap::new();
        for basin in basins {
            for &(x, y) in &basin.tiles {
                let slot = &mut index[y * width + x];
                debug_assert!(slot.is_none(), "tile ({x},{y}) claimed by two basins");
                *slot = Some(basin.id);
            }
            registry.insert(basin.id, basin);
        }
        Self {
            basins: registry,
            index,
            width,
            height,
            highlighted: None,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// O(1) tile lookup. `None` off-map and on undug tiles.
    pub fn basin_id_at(&self, x: usize, y: usize) -> Option<BasinId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.index[y * self.width + x]
    }

    pub fn basin(&self, id: BasinId) -> Option<&Basin> {
        self.basins.get(&id)
    }

    pub(crate) fn basin_mut(&mut self, id: BasinId) -> Option<&mut Basin> {
        self.basins.get_mut(&id)
    }

    pub fn basin_at(&self, x: usize, y: usize) -> Option<&Basin> {
        self.basin_id_at(x, y).and_then(|id| self.basin(id))
    }

    /// Immutable view of the whole registry, shallowest basins first.
    pub fn basins(&self) -> &BTreeMap<BasinId, Basin> {
        &self.basins
    }

    pub fn len(&self) -> usize {
        self.basins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basins.is_empty()
    }

    /// Summed water volume across all basins.
    pub fn total_volume(&self) -> f32 {
        self.basins.values().map(|b| b.volume).sum()
    }

    // -----------------------------------------------------------------------
    // Highlight (UI selection)
    // -----------------------------------------------------------------------

    pub fn highlighted(&self) -> Option<BasinId> {
        self.highlighted
    }

    pub fn set_highlighted(&mut self, id: Option<BasinId>) {
        self.highlighted = id;
    }

    // -----------------------------------------------------------------------
    // Water accounting
    // -----------------------------------------------------------------------

    /// Manual override: set the basin containing `(x, y)` to full capacity or
    /// drain it to zero. Touches exactly that one basin: filling *to*
    /// capacity leaves no excess, so no cascade runs. Returns whether a basin
    /// was found under the tile.
    pub fn flood_fill(&mut self, x: usize, y: usize, fill: bool) -> bool {
        let Some(id) = self.basin_id_at(x, y) else {
            return false;
        };
        let Some(basin) = self.basins.get_mut(&id) else {
            return false;
        };
        basin.volume = if fill { basin.capacity } else { 0.0 };
        true
    }

    /// Add water to a basin, cascading overflow through the outlet graph.
    ///
    /// Explicit worklist rather than recursion. Each parcel fills its target
    /// up to capacity; excess is offered to the target's outlets in list
    /// order, each taking up to its current free capacity, with the remainder
    /// handed to the last outlet to keep cascading toward shallower ground.
    /// Excess arriving at a terminal basin drains away into open ground and
    /// is dropped. Terminates because every outlet hop strictly decreases
    /// depth.
    ///
    /// Returns the total volume discarded at terminal sinks.
    pub fn spill(&mut self, id: BasinId, amount: f32) -> f32 {
        let mut worklist: VecDeque<(BasinId, f32)> = VecDeque::new();
        worklist.push_back((id, amount));
        let mut discarded = 0.0;

        while let Some((target, parcel)) = worklist.pop_front() {
            if parcel <= 0.0 {
                continue;
            }
            let (excess, outlets) = match self.basins.get_mut(&target) {
                Some(basin) => {
                    let stored = parcel.min(basin.free_capacity());
                    basin.volume += stored;
                    (parcel - stored, basin.outlets.clone())
                }
                // Dangling reference: behaves like a terminal sink.
                None => (parcel, Vec::new()),
            };
            if excess <= VOLUME_EPSILON {
                continue;
            }
            if outlets.is_empty() {
                discarded += excess;
                continue;
            }

            let mut remaining = excess;
            let last = outlets.len() - 1;
            for (i, outlet) in outlets.iter().enumerate() {
                if remaining <= VOLUME_EPSILON {
                    break;
                }
                let give = if i == last {
                    remaining
                } else {
                    let free = self
                        .basins
                        .get(outlet)
                        .map(|b| b.free_capacity())
                        .unwrap_or(0.0);
                    remaining.min(free)
                };
                if give > 0.0 {
                    worklist.push_back((*outlet, give));
                    remaining -= give;
                }
            }
        }

        if discarded > 0.0 {
            debug!("spill into {id}: {discarded} units lost at terminal sinks");
        }
        discarded
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Aggregate outlet-graph shape. Read-only; never mutates the registry.
    pub fn analysis(&self) -> BasinAnalysis {
        let basin_count = self.basins.len();
        let max_degree = self
            .basins
            .values()
            .map(|b| b.outlets.len())
            .max()
            .unwrap_or(0);

        // Longest outlet chain. Iterating the registry shallowest-first means
        // every outlet of the current basin is already memoized.
        let mut chain: BTreeMap<BasinId, usize> = BTreeMap::new();
        for (id, basin) in &self.basins {
            let longest = basin
                .outlets
                .iter()
                .map(|o| chain.get(o).map_or(0, |l| l + 1))
                .max()
                .unwrap_or(0);
            chain.insert(*id, longest);
        }
        let max_depth = chain.values().copied().max().unwrap_or(0);

        BasinAnalysis {
            basin_count,
            max_degree,
            max_depth,
        }
    }
}
