//! External water stores ("pipe systems") that pumps connect terrain to.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// An off-map water store, identified by a positive integer id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    pub id: u32,
    /// Stored volume, never negative. Reservoirs have no capacity limit.
    pub volume: f32,
}

/// Registry of reservoirs. Persists across terrain edits; mutated only by
/// explicit operations and the pump tick.
#[derive(Resource, Debug, Default)]
pub struct ReservoirManager {
    reservoirs: BTreeMap<u32, Reservoir>,
    /// UI convenience: the reservoir new linked pumps attach to. Not
    /// simulation state.
    selected: Option<u32>,
}

impl ReservoirManager {
    /// Create a reservoir with the given id. Idempotent: an existing
    /// reservoir keeps its volume.
    pub fn create(&mut self, id: u32) {
        self.reservoirs
            .entry(id)
            .or_insert(Reservoir { id, volume: 0.0 });
    }

    /// Allocate and create a fresh reservoir with the lowest unused positive
    /// id.
    pub fn create_next(&mut self) -> u32 {
        let id = (1..).find(|id| !self.reservoirs.contains_key(id)).unwrap_or(u32::MAX);
        self.create(id);
        id
    }

    /// Remove a reservoir. A no-op on unknown ids. Does NOT remove dependent
    /// pumps; callers pair this with `PumpManager::remove_pumps_by_reservoir`.
    pub fn remove(&mut self, id: u32) -> bool {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.reservoirs.remove(&id).is_some()
    }

    /// Add water. A no-op on unknown ids (pumps create their reservoir on
    /// first reference before calling this).
    pub fn add_water(&mut self, id: u32, amount: f32) {
        if let Some(reservoir) = self.reservoirs.get_mut(&id) {
            reservoir.volume += amount.max(0.0);
        }
    }

    /// Remove up to `amount` of water, clamping at zero. Returns the volume
    /// actually removed (0.0 for unknown ids).
    pub fn take_water(&mut self, id: u32, amount: f32) -> f32 {
        let Some(reservoir) = self.reservoirs.get_mut(&id) else {
            return 0.0;
        };
        let taken = amount.clamp(0.0, reservoir.volume);
        reservoir.volume -= taken;
        taken
    }

    /// Current volume; 0.0 for unknown ids.
    pub fn volume(&self, id: u32) -> f32 {
        self.reservoirs.get(&id).map_or(0.0, |r| r.volume)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.reservoirs.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Reservoir> {
        self.reservoirs.get(&id)
    }

    /// All reservoirs in ascending id order.
    pub fn all(&self) -> impl Iterator<Item = &Reservoir> {
        self.reservoirs.values()
    }

    pub fn len(&self) -> usize {
        self.reservoirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservoirs.is_empty()
    }

    pub fn total_volume(&self) -> f32 {
        self.reservoirs.values().map(|r| r.volume).sum()
    }

    pub fn selected(&self) -> Option<u32> {
        self.selected
    }

    pub fn set_selected(&mut self, id: Option<u32>) {
        self.selected = id;
    }

    /// Rebuild from persisted reservoirs (pre-validated by the save crate).
    pub fn from_parts(reservoirs: Vec<Reservoir>) -> Self {
        Self {
            reservoirs: reservoirs.into_iter().map(|r| (r.id, r)).collect(),
            selected: None,
        }
    }
}
