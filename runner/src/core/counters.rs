//! Counters derived from widget text and inventory contents.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::data::{
    EMPTY_WATER_CAN, FRUITS, WATER_CAN_BASE, WATER_CAN_CAPACITY, WATER_CANS, WATER_PER_PATCH,
};
use crate::core::types::{Item, ItemId};

static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Points:\s*(\d+)").unwrap());

/// Parse the points counter from the widget lines that make up the counter.
///
/// Returns `None` when the widget is absent or no line carries a readable count.
pub fn parse_points(lines: Option<&[String]>) -> Option<u32> {
    lines?.iter().find_map(|line| {
        POINTS_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|count| count.as_str().parse().ok())
    })
}

/// Total water units across all watering cans.
pub fn water_count(items: &[Item]) -> u32 {
    items
        .iter()
        .filter(|item| WATER_CANS.contains(&item.id))
        .map(|item| item.id.0 - WATER_CAN_BASE)
        .sum()
}

pub fn is_water_can(id: ItemId) -> bool {
    id == EMPTY_WATER_CAN || WATER_CANS.contains(&id)
}

/// Water units the held cans (empty ones included) can carry when full.
pub fn water_capacity(items: &[Item]) -> u32 {
    let cans = items.iter().filter(|item| is_water_can(item.id)).count();
    u32::try_from(cans)
        .unwrap_or(u32::MAX)
        .saturating_mul(WATER_CAN_CAPACITY)
}

/// First seed of any variety in the inventory.
pub fn held_seed(items: &[Item], seeds: &[ItemId]) -> Option<ItemId> {
    items
        .iter()
        .map(|item| item.id)
        .find(|id| seeds.contains(id))
}

pub fn fruit_count(items: &[Item]) -> u32 {
    let count = items
        .iter()
        .filter(|item| FRUITS.contains(&item.id))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Enough water to take every patch through a full growth cycle.
pub fn has_enough_water(water: u32, patch_count: usize) -> bool {
    let needed = u64::try_from(patch_count)
        .unwrap_or(u64::MAX)
        .saturating_mul(u64::from(WATER_PER_PATCH));
    u64::from(water) >= needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::SEEDS;

    fn items(ids: &[u32]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(slot, id)| Item {
                id: ItemId(*id),
                slot,
            })
            .collect()
    }

    #[test]
    fn points_parse_from_counter_text() {
        let lines = vec!["Tithe Farm".to_string(), "Points: 1234".to_string()];
        assert_eq!(parse_points(Some(lines.as_slice())), Some(1234));
    }

    #[test]
    fn points_absent_widget_is_none() {
        assert_eq!(parse_points(None), None);
        let lines = vec!["Fruit: 0".to_string()];
        assert_eq!(parse_points(Some(lines.as_slice())), None);
    }

    #[test]
    fn water_sums_can_units() {
        // Two full cans, one with a single unit and one empty; the seed is ignored.
        let inventory = items(&[5340, 5340, 5333, 5331, 13423]);
        assert_eq!(water_count(&inventory), 17);
        assert_eq!(water_capacity(&inventory), 32);
    }

    #[test]
    fn enough_water_requires_three_per_patch() {
        assert!(has_enough_water(48, 16));
        assert!(!has_enough_water(47, 16));
        assert!(has_enough_water(0, 0));
    }

    #[test]
    fn held_seed_finds_first_seed() {
        let inventory = items(&[5340, 13424, 13423]);
        assert_eq!(held_seed(&inventory, &SEEDS), Some(ItemId(13424)));
        assert_eq!(held_seed(&items(&[5340]), &SEEDS), None);
    }

    #[test]
    fn fruit_counts_every_variety() {
        assert_eq!(fruit_count(&items(&[13426, 13427, 13428, 5340])), 3);
    }
}
