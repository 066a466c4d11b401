//! Patch snapshots and the working set.

use std::fmt;
use std::sync::Arc;

use crate::core::data::EMPTY_PATCH_NAME;
use crate::core::types::{Entity, Locatable, Nameable, Tile};

/// Growth state derived from the name of the object occupying a patch tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchState {
    /// Nothing bound to the tile (object not loaded or not found).
    Absent,
    /// Unplanted.
    Empty,
    /// Growing and waiting to be watered.
    Dry,
    /// Growing, already watered for this stage.
    Watered,
    /// Fully grown and ready to harvest.
    Grown,
    /// Dead; must be cleared before replanting.
    Blighted,
}

impl PatchState {
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::Absent;
        };
        let lower = name.to_lowercase();
        if lower == EMPTY_PATCH_NAME.to_lowercase() {
            Self::Empty
        } else if lower.contains("blighted") {
            Self::Blighted
        } else if lower.starts_with("grown") {
            Self::Grown
        } else if lower.starts_with("watered") {
            Self::Watered
        } else {
            Self::Dry
        }
    }

    /// Still occupied by a crop (living or dead).
    pub const fn is_growing(self) -> bool {
        matches!(self, Self::Dry | Self::Watered | Self::Grown | Self::Blighted)
    }
}

/// One farmable plot, bound to whatever object occupied its tile at refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub identity: Option<Entity>,
    pub tile: Tile,
    pub index: usize,
}

impl Patch {
    pub fn state(&self) -> PatchState {
        PatchState::from_name(self.identity.as_ref().and_then(Nameable::name))
    }
}

impl Locatable for Patch {
    fn tile(&self) -> Tile {
        self.tile
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .identity
            .as_ref()
            .and_then(Nameable::name)
            .unwrap_or("<absent>");
        write!(f, "Patch#{} {} at {}", self.index, name, self.tile)
    }
}

/// Immutable working set. Cloning shares the underlying patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Arc<[Patch]>,
}

impl PatchSet {
    /// Bind each layout tile to the first named entity standing on it.
    ///
    /// The result has one patch per tile, indexed in layout order. Duplicate
    /// tiles in `tiles` are an error in the caller's layout and are not
    /// deduplicated here.
    pub fn bind(tiles: &[Tile], entities: &[Entity]) -> Self {
        let patches: Vec<Patch> = tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| Patch {
                identity: entities
                    .iter()
                    .find(|entity| entity.tile == *tile && entity.name().is_some())
                    .cloned(),
                tile: *tile,
                index,
            })
            .collect();
        Self {
            patches: patches.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Patch> {
        self.patches.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    pub fn at(&self, tile: Tile) -> Option<&Patch> {
        self.patches.iter().find(|patch| patch.tile == tile)
    }

    /// True if any patch still carries a crop.
    pub fn any_growing(&self) -> bool {
        self.patches.iter().any(|patch| patch.state().is_growing())
    }

    /// Patches in cyclic order starting just after `after` (or at index 0).
    pub fn cycle_after(&self, after: Option<usize>) -> impl Iterator<Item = &Patch> {
        let len = self.patches.len();
        let start = after.map_or(0, |index| index + 1);
        (0..len).map(move |offset| &self.patches[(start + offset) % len])
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a Patch;
    type IntoIter = std::slice::Iter<'a, Patch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
