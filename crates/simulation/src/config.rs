//! Engine-wide tuning constants.

/// Default grid width in tiles.
pub const GRID_WIDTH: usize = 64;
/// Default grid height in tiles.
pub const GRID_HEIGHT: usize = 64;

/// Deepest diggable terrain level. Depth 0 is undug surface.
pub const MAX_DEPTH: u8 = 5;

/// Water capacity contributed by one tile of depth 1. A basin's capacity is
/// `tile_count * VOLUME_UNIT * depth`.
pub const VOLUME_UNIT: f32 = 10.0;

/// Volume a pump attempts to move per simulation tick.
pub const PUMP_RATE: f32 = 1.0;

/// Residual volumes below this are treated as zero when cascading overflow,
/// so float dust never keeps a cascade alive.
pub const VOLUME_EPSILON: f32 = 1e-4;
