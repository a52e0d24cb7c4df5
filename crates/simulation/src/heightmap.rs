//! Dug-depth terrain grid.
//!
//! The heightmap is the engine's only terrain input: a row-major grid of
//! small integers where 0 means undug surface and `1..=MAX_DEPTH` is how far
//! down a tile has been excavated. Who produces it (procedural generator,
//! brush strokes, imported save) is not the engine's concern.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{GRID_HEIGHT, GRID_WIDTH, MAX_DEPTH};

/// Row-major grid of dug depths.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightMap {
    pub width: usize,
    pub height: usize,
    depths: Vec<u8>,
}

impl Default for HeightMap {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

impl HeightMap {
    /// An undug (all-zero) map of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depths: vec![0; width * height],
        }
    }

    /// Build a map from raw depth values. Returns `None` when the vector
    /// length does not match the dimensions or any depth exceeds `MAX_DEPTH`.
    pub fn from_depths(width: usize, height: usize, depths: Vec<u8>) -> Option<Self> {
        if depths.len() != width * height || depths.iter().any(|&d| d > MAX_DEPTH) {
            return None;
        }
        Some(Self {
            width,
            height,
            depths,
        })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Depth at a tile. Off-map coordinates read as depth 0, matching the
    /// open-surface behavior at map edges (UI hover probes off-map constantly).
    #[inline]
    pub fn depth_at(&self, x: usize, y: usize) -> u8 {
        if self.in_bounds(x, y) {
            self.depths[self.index(x, y)]
        } else {
            0
        }
    }

    /// Set the dug depth at a tile, clamping to `MAX_DEPTH`. Returns whether
    /// the map changed; off-map edits are ignored.
    pub fn set_depth(&mut self, x: usize, y: usize, depth: u8) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        let clamped = depth.min(MAX_DEPTH);
        if self.depths[idx] == clamped {
            return false;
        }
        self.depths[idx] = clamped;
        true
    }

    /// Raw depth values, row-major.
    pub fn depths(&self) -> &[u8] {
        &self.depths
    }

    /// In-bounds 4-connected neighbors of a tile, in a fixed west/east/north/
    /// south order so every traversal over the map is deterministic.
    pub fn neighbors4(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        const OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            self.in_bounds(nx, ny).then_some((nx, ny))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_map_is_undug() {
        let map = HeightMap::new(4, 3);
        assert_eq!(map.depths().len(), 12);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(map.depth_at(x, y), 0);
            }
        }
    }

    #[test]
    fn set_depth_clamps_to_max() {
        let mut map = HeightMap::new(4, 4);
        assert!(map.set_depth(1, 1, MAX_DEPTH + 3));
        assert_eq!(map.depth_at(1, 1), MAX_DEPTH);
    }

    #[test]
    fn set_depth_reports_no_change() {
        let mut map = HeightMap::new(4, 4);
        assert!(map.set_depth(2, 2, 2));
        assert!(!map.set_depth(2, 2, 2), "same depth should not report change");
    }

    #[test]
    fn off_map_reads_as_surface() {
        let map = HeightMap::new(4, 4);
        assert_eq!(map.depth_at(4, 0), 0);
        assert_eq!(map.depth_at(0, 100), 0);
    }

    #[test]
    fn off_map_edit_is_ignored() {
        let mut map = HeightMap::new(4, 4);
        assert!(!map.set_depth(9, 9, 3));
        assert!(map.depths().iter().all(|&d| d == 0));
    }

    #[test]
    fn from_depths_rejects_bad_input() {
        assert!(HeightMap::from_depths(2, 2, vec![0; 3]).is_none());
        assert!(HeightMap::from_depths(2, 2, vec![0, 1, 2, MAX_DEPTH + 1]).is_none());
        assert!(HeightMap::from_depths(2, 2, vec![0, 1, 2, MAX_DEPTH]).is_some());
    }

    #[test]
    fn neighbors_of_corner_and_interior() {
        let map = HeightMap::new(3, 3);
        let corner: Vec<_> = map.neighbors4(0, 0).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);
        let interior: Vec<_> = map.neighbors4(1, 1).collect();
        assert_eq!(interior, vec![(0, 1), (2, 1), (1, 0), (1, 2)]);
    }
}
