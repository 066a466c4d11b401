//! Shared value types for the control loop.
//!
//! These are plain snapshots of environment objects. They carry no handle back
//! into the environment, so any number of copies can be held across ticks
//! without observing a half-updated object.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer world coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Offset this tile on the same plane.
    pub const fn derive(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.plane)
    }

    /// Offset this tile, returning `None` on coordinate overflow.
    pub fn checked_derive(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.plane,
        ))
    }

    /// Euclidean distance on the `(x, y)` plane.
    ///
    /// Tiles on different planes are infinitely far apart.
    pub fn distance_to(self, other: Tile) -> f64 {
        if self.plane != other.plane {
            return f64::INFINITY;
        }
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// Opaque environment identifier for a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Inventory item identifier (item definition id, not slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that has a display name.
pub trait Nameable {
    /// Resolved name, or `None` when the environment reports no usable name.
    fn name(&self) -> Option<&str>;
}

/// Something with a position in the world.
pub trait Locatable {
    fn tile(&self) -> Tile;
}

/// Snapshot of a world object as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    /// Raw name. Empty and the literal `"null"` both mean "no name".
    pub raw_name: String,
    pub tile: Tile,
}

impl Entity {
    pub fn new(id: u64, raw_name: impl Into<String>, tile: Tile) -> Self {
        Self {
            id: EntityId(id),
            raw_name: raw_name.into(),
            tile,
        }
    }
}

impl Nameable for Entity {
    fn name(&self) -> Option<&str> {
        let name = self.raw_name.trim();
        if name.is_empty() || name == "null" {
            None
        } else {
            Some(name)
        }
    }
}

impl Locatable for Entity {
    fn tile(&self) -> Tile {
        self.tile
    }
}

/// One inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub slot: usize,
}
