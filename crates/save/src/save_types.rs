//! Persisted snapshot of one simulation world.
//!
//! Records keep only what cannot be derived: basin capacity, for instance, is
//! a pure function of tile count and depth and is recomputed on import.
//! Coordinates are stored as `u32` so the on-disk layout does not depend on
//! the platform's pointer width.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use simulation::{BasinId, PumpMode};

/// Current save schema version (distinct from the file header's format
/// version, which tracks the header layout).
pub const SAVE_VERSION: u32 = 1;

/// Everything needed to reconstruct a simulation world.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major dug depths, `width * height` entries.
    pub heights: Vec<u8>,
    pub basins: Vec<BasinRecord>,
    pub reservoirs: Vec<ReservoirRecord>,
    pub pumps: Vec<PumpRecord>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct BasinRecord {
    pub id: BasinId,
    pub depth: u8,
    pub tiles: Vec<(u32, u32)>,
    pub volume: f32,
    pub outlets: Vec<BasinId>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct ReservoirRecord {
    pub id: u32,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct PumpRecord {
    pub x: u32,
    pub y: u32,
    pub mode: PumpMode,
    pub reservoir_id: u32,
}
