//! Pumps: tile-anchored couplings between basins and reservoirs.
//!
//! Each tick, every pump in registration order attempts to move up to
//! `PUMP_RATE` volume units in its fixed direction. A pump keeps its tile
//! across terrain edits; whichever basin currently owns that tile (if any)
//! is the one it couples to.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::basins::BasinManager;
use crate::config::{PUMP_RATE, VOLUME_EPSILON};
use crate::reservoirs::ReservoirManager;

/// Fixed transfer direction of a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum PumpMode {
    /// Drains the basin under the pump into its reservoir.
    Inlet,
    /// Pushes from the reservoir into the basin under the pump.
    Outlet,
}

/// A pump anchored to one terrain tile and wired to one reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pump {
    pub x: usize,
    pub y: usize,
    pub mode: PumpMode,
    pub reservoir_id: u32,
}

/// Registry of pumps in stable registration order (tick order is the order
/// pumps were added).
#[derive(Resource, Debug, Default)]
pub struct PumpManager {
    pumps: Vec<Pump>,
}

impl PumpManager {
    /// Create a pump at a tile. With `link_to_existing` the pump attaches to
    /// the currently selected reservoir (falling back to a fresh one when
    /// nothing is selected); otherwise a fresh reservoir is created for it.
    /// Returns the reservoir id the pump ended up wired to.
    pub fn add_pump_at(
        &mut self,
        x: usize,
        y: usize,
        mode: PumpMode,
        link_to_existing: bool,
        reservoirs: &mut ReservoirManager,
    ) -> u32 {
        let reservoir_id = match reservoirs.selected().filter(|_| link_to_existing) {
            Some(id) => {
                reservoirs.create(id);
                id
            }
            None => reservoirs.create_next(),
        };
        self.pumps.push(Pump {
            x,
            y,
            mode,
            reservoir_id,
        });
        reservoir_id
    }

    /// If a pump sits at the tile, make its reservoir the selected one for
    /// subsequent pump creation. Returns whether a pump was found.
    pub fn link_pump_to_reservoir(
        &self,
        x: usize,
        y: usize,
        reservoirs: &mut ReservoirManager,
    ) -> bool {
        match self.pump_at(x, y) {
            Some(pump) => {
                reservoirs.set_selected(Some(pump.reservoir_id));
                true
            }
            None => false,
        }
    }

    /// First pump registered at a tile, if any.
    pub fn pump_at(&self, x: usize, y: usize) -> Option<&Pump> {
        self.pumps.iter().find(|p| p.x == x && p.y == y)
    }

    /// Remove by registration index. A no-op past the end.
    pub fn remove_pump(&mut self, index: usize) -> Option<Pump> {
        if index < self.pumps.len() {
            Some(self.pumps.remove(index))
        } else {
            None
        }
    }

    /// Remove every pump wired to a reservoir (used when the reservoir itself
    /// is removed). Returns how many were dropped; zero for unknown ids.
    pub fn remove_pumps_by_reservoir(&mut self, reservoir_id: u32) -> usize {
        let before = self.pumps.len();
        self.pumps.retain(|p| p.reservoir_id != reservoir_id);
        before - self.pumps.len()
    }

    /// All pumps in registration order.
    pub fn pumps(&self) -> &[Pump] {
        &self.pumps
    }

    pub fn len(&self) -> usize {
        self.pumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pumps.is_empty()
    }

    /// Rebuild from persisted pumps (pre-validated by the save crate).
    pub fn from_parts(pumps: Vec<Pump>) -> Self {
        Self { pumps }
    }

    /// One simulation step: every pump, in registration order, moves up to
    /// `PUMP_RATE` units between its basin and its reservoir. Pumps anchored
    /// on undug tiles are a no-op this tick.
    pub fn tick(&self, basins: &mut BasinManager, reservoirs: &mut ReservoirManager) {
        for pump in &self.pumps {
            let Some(basin_id) = basins.basin_id_at(pump.x, pump.y) else {
                continue;
            };
            // Reservoirs spring into being on first pump reference.
            reservoirs.create(pump.reservoir_id);

            match pump.mode {
                PumpMode::Inlet => {
                    let Some(basin) = basins.basin_mut(basin_id) else {
                        continue;
                    };
                    let amount = PUMP_RATE.min(basin.volume);
                    if amount <= 0.0 {
                        continue;
                    }
                    basin.volume -= amount;
                    reservoirs.add_water(pump.reservoir_id, amount);
                }
                PumpMode::Outlet => {
                    let free = basins
                        .basin(basin_id)
                        .map(|b| b.free_capacity())
                        .unwrap_or(0.0);
                    let amount = PUMP_RATE
                        .min(reservoirs.volume(pump.reservoir_id))
                        .min(free);
                    if amount <= 0.0 {
                        continue;
                    }
                    let taken = reservoirs.take_water(pump.reservoir_id, amount);
                    let discarded = basins.spill(basin_id, taken);
                    debug_assert!(
                        discarded <= VOLUME_EPSILON,
                        "outlet transfer was clamped to free capacity, nothing to discard"
                    );
                }
            }
        }
    }
}
