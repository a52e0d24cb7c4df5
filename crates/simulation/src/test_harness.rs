//! Headless integration-test harness.
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + [`SimulationPlugin`] and
//! drives the `FixedUpdate` schedule directly, so tests advance the
//! simulation deterministically without a window, renderer, or wall clock.

use bevy::app::App;
use bevy::prelude::*;

use crate::basins::BasinManager;
use crate::heightmap::HeightMap;
use crate::pumps::{PumpManager, PumpMode};
use crate::reservoirs::ReservoirManager;
use crate::{SimulationPlugin, TerrainEditEvent, TickCounter};

/// A headless simulation world for integration tests.
pub struct TestWorld {
    app: App,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Driving the simulation
    // -----------------------------------------------------------------------

    /// Advance `n` simulation steps. Queued terrain edits apply at the start
    /// of the first step; every step also runs one pump tick.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Queue a depth edit for one tile (applied on the next `tick`).
    pub fn dig(&mut self, x: usize, y: usize, depth: u8) {
        self.app
            .world_mut()
            .send_event(TerrainEditEvent { x, y, depth });
    }

    /// Queue edits for a whole rectangle, like one brush stroke.
    pub fn dig_rect(&mut self, x0: usize, y0: usize, width: usize, height: usize, depth: u8) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                self.dig(x, y, depth);
            }
        }
    }

    /// Queue edits and immediately run one step so they take effect.
    pub fn dig_rect_now(&mut self, x0: usize, y0: usize, width: usize, height: usize, depth: u8) {
        self.dig_rect(x0, y0, width, height, depth);
        self.tick(1);
    }

    pub fn add_pump(&mut self, x: usize, y: usize, mode: PumpMode, link_to_existing: bool) -> u32 {
        self.app
            .world_mut()
            .resource_scope(|world, mut pumps: Mut<PumpManager>| {
                let mut reservoirs = world.resource_mut::<ReservoirManager>();
                pumps.add_pump_at(x, y, mode, link_to_existing, &mut reservoirs)
            })
    }

    /// Select the reservoir of the pump at a tile for subsequent linked pump
    /// creation. Returns whether a pump was found there.
    pub fn link_pump(&mut self, x: usize, y: usize) -> bool {
        self.app
            .world_mut()
            .resource_scope(|world, pumps: Mut<PumpManager>| {
                let mut reservoirs = world.resource_mut::<ReservoirManager>();
                pumps.link_pump_to_reservoir(x, y, &mut reservoirs)
            })
    }

    pub fn flood_fill(&mut self, x: usize, y: usize, fill: bool) -> bool {
        self.app
            .world_mut()
            .resource_mut::<BasinManager>()
            .flood_fill(x, y, fill)
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    pub fn heights(&self) -> &HeightMap {
        self.app.world().resource::<HeightMap>()
    }

    pub fn basins(&self) -> &BasinManager {
        self.app.world().resource::<BasinManager>()
    }

    pub fn basins_mut(&mut self) -> Mut<'_, BasinManager> {
        self.app.world_mut().resource_mut::<BasinManager>()
    }

    pub fn reservoirs(&self) -> &ReservoirManager {
        self.app.world().resource::<ReservoirManager>()
    }

    pub fn reservoirs_mut(&mut self) -> Mut<'_, ReservoirManager> {
        self.app.world_mut().resource_mut::<ReservoirManager>()
    }

    pub fn pumps(&self) -> &PumpManager {
        self.app.world().resource::<PumpManager>()
    }

    pub fn tick_count(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    /// Total water everywhere: basins plus reservoirs.
    pub fn total_water(&self) -> f32 {
        self.basins().total_volume() + self.reservoirs().total_volume()
    }
}
