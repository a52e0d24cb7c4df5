//! Basin entity and its identifier.

use std::fmt;
use std::str::FromStr;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::VOLUME_UNIT;

/// Identifier of one basin: the depth level it sits at plus its per-depth
/// discovery ordinal. Renders as `"<depth>#<letters>"` where the letters run
/// A, B, .., Z, AA, AB, .. in discovery order, so `3#A` is the first basin
/// found at depth 3.
///
/// Ordering is depth-major (derive order of the fields), which makes a
/// `BTreeMap<BasinId, _>` iterate shallowest-first; several traversals rely
/// on that.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct BasinId {
    pub depth: u8,
    pub ordinal: u32,
}

impl BasinId {
    pub fn new(depth: u8, ordinal: u32) -> Self {
        Self { depth, ordinal }
    }
}

/// Bijective base-26 rendering of a discovery ordinal: 0 -> "A", 25 -> "Z",
/// 26 -> "AA", 27 -> "AB", ..
pub fn ordinal_letters(ordinal: u32) -> String {
    let mut digits = Vec::new();
    let mut n = ordinal;
    loop {
        digits.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    digits.iter().rev().map(|&b| b as char).collect()
}

/// Inverse of [`ordinal_letters`]. `None` for anything but `A..Z` sequences.
pub fn letters_ordinal(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        n = n.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
    }
    Some(n - 1)
}

impl fmt::Display for BasinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.depth, ordinal_letters(self.ordinal))
    }
}

impl FromStr for BasinId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (depth, letters) = s
            .split_once('#')
            .ok_or_else(|| format!("basin id '{s}' is missing the '#' separator"))?;
        let depth: u8 = depth
            .parse()
            .map_err(|_| format!("basin id '{s}' has a non-numeric depth"))?;
        let ordinal = letters_ordinal(letters)
            .ok_or_else(|| format!("basin id '{s}' has an invalid letter sequence"))?;
        Ok(Self { depth, ordinal })
    }
}

/// Water capacity of a basin: every tile contributes `VOLUME_UNIT` per level
/// of depth. The single home of the capacity formula.
pub fn capacity_of(tile_count: usize, depth: u8) -> f32 {
    tile_count as f32 * VOLUME_UNIT * depth as f32
}

/// A maximal 4-connected region of equal-depth dug tiles, holding water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basin {
    pub id: BasinId,
    /// Heightmap value shared by every tile of the basin.
    pub depth: u8,
    /// Member tiles in flood discovery order. Mutually exclusive across
    /// basins; membership lookups go through the manager's tile index.
    pub tiles: Vec<(usize, usize)>,
    /// Current water volume. Never negative; at most `capacity` except
    /// transiently inside a cascade step.
    pub volume: f32,
    pub capacity: f32,
    /// Basins this one overflows into, in boundary discovery order. Each
    /// outlet sits at strictly shallower depth; empty means terminal sink.
    pub outlets: Vec<BasinId>,
}

impl Basin {
    pub fn free_capacity(&self) -> f32 {
        (self.capacity - self.volume).max(0.0)
    }

    pub fn is_full(&self) -> bool {
        self.volume >= self.capacity
    }

    /// A basin with no path to shallower ground discards its overflow.
    pub fn is_terminal(&self) -> bool {
        self.outlets.is_empty()
    }
}
