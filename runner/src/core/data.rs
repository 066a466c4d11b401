//! Fixed game data for the Tithe Farm minigame.

use serde::{Deserialize, Serialize};

use crate::core::types::ItemId;

/// Entity name fragments that identify farm patches (matched case-insensitively).
pub const PATCH_NAMES: [&str; 4] = ["Tithe patch", "Golovanova", "Bologano", "Logavano"];

/// Name of an unplanted patch.
pub const EMPTY_PATCH_NAME: &str = "Tithe patch";

/// Seed item ids, in seed-table order.
pub const SEEDS: [ItemId; 3] = [ItemId(13423), ItemId(13424), ItemId(13425)];

/// Harvested fruit item ids.
pub const FRUITS: [ItemId; 3] = [ItemId(13426), ItemId(13427), ItemId(13428)];

/// Watering cans holding one to eight units of water.
pub const WATER_CANS: [ItemId; 8] = [
    ItemId(5333),
    ItemId(5334),
    ItemId(5335),
    ItemId(5336),
    ItemId(5337),
    ItemId(5338),
    ItemId(5339),
    ItemId(5340),
];

/// Watering can with no water left.
pub const EMPTY_WATER_CAN: ItemId = ItemId(5331);

/// A watering can holds `id - WATER_CAN_BASE` units.
pub const WATER_CAN_BASE: u32 = 5332;

/// Units held by a full watering can.
pub const WATER_CAN_CAPACITY: u32 = 8;

/// Water needed per patch for a full growth cycle.
pub const WATER_PER_PATCH: u32 = 3;

/// Widget group that shows the minigame points counter.
pub const POINTS_WIDGET: u32 = 241;

pub const FARM_DOOR: &str = "Farm door";
pub const SEED_TABLE: &str = "Seed table";
pub const WATER_BARREL: &str = "Water barrel";
pub const SACK: &str = "Sack";

/// Search radius when locating the patch grid's corner.
pub const CORNER_SEARCH_RADIUS: u32 = 30;
/// Search radius when rebinding patch tiles to objects.
pub const REFRESH_RADIUS: u32 = 35;
/// Search radius for the door, seed table, barrel and sack.
pub const FACILITY_RADIUS: u32 = 40;

/// Seed variety handed out by the seed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    #[default]
    Golovanova,
    Bologano,
    Logavano,
}

impl SeedKind {
    pub const fn seed(self) -> ItemId {
        match self {
            Self::Golovanova => SEEDS[0],
            Self::Bologano => SEEDS[1],
            Self::Logavano => SEEDS[2],
        }
    }

    /// Dialogue option text offered by the seed table.
    pub const fn option(self) -> &'static str {
        match self {
            Self::Golovanova => "Golovanova",
            Self::Bologano => "Bologano",
            Self::Logavano => "Logavano",
        }
    }
}

/// True if `name` contains any allow-list fragment, ignoring case.
pub fn matches_any(name: &str, allow_list: &[String]) -> bool {
    let name = name.to_lowercase();
    allow_list
        .iter()
        .any(|fragment| name.contains(&fragment.to_lowercase()))
}

pub fn default_patch_names() -> Vec<String> {
    PATCH_NAMES.iter().map(|name| (*name).to_string()).collect()
}
