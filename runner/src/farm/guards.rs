//! Guards for the farm tree. Each is a pure predicate over the world model.

use crate::core::patch::PatchState;
use crate::world::WorldModel;

pub fn inside(world: &WorldModel) -> bool {
    world.in_game()
}

pub fn outside(world: &WorldModel) -> bool {
    !world.in_game()
}

/// Left the farm after the final round.
pub fn finished(world: &WorldModel) -> bool {
    !world.in_game() && world.final_round()
}

/// Patch tiles not computed yet.
pub fn layout_missing(world: &WorldModel) -> bool {
    world.layout().is_none()
}

pub fn no_seeds(world: &WorldModel) -> bool {
    !world.has_seeds()
}

/// Round over with fruit still in the inventory.
pub fn should_deposit(world: &WorldModel) -> bool {
    world.fruit_count() > 0 && !world.any_growing()
}

/// Top up between rounds, or mid-round once the cans run dry.
pub fn should_refill(world: &WorldModel) -> bool {
    !world.has_enough_water()
        && world.can_refill()
        && (!world.any_growing() || world.water_count() == 0)
}

/// Round over with nothing to deposit, and either winding down or out of seeds.
pub fn should_leave(world: &WorldModel) -> bool {
    !world.any_growing()
        && world.fruit_count() == 0
        && (world.final_round() || !world.has_seeds())
}

pub fn next_blighted(world: &WorldModel) -> bool {
    world.next_patch_state() == Some(PatchState::Blighted)
}

pub fn next_grown(world: &WorldModel) -> bool {
    world.next_patch_state() == Some(PatchState::Grown)
}

pub fn next_dry(world: &WorldModel) -> bool {
    world.next_patch_state() == Some(PatchState::Dry)
}

pub fn next_empty(world: &WorldModel) -> bool {
    world.next_patch_state() == Some(PatchState::Empty)
}

pub fn cooldown_elapsed(world: &WorldModel) -> bool {
    world.cooldown().elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patch::PatchSet;
    use crate::core::types::{Entity, ItemId, Tile};
    use crate::world::Observation;

    fn world(names: &[&str], water: u32, fruit: u32, seed: bool) -> WorldModel {
        let tiles: Vec<Tile> = (0..names.len())
            .map(|i| Tile::new(i32::try_from(i).unwrap() * 5, 0, 0))
            .collect();
        let entities: Vec<Entity> = names
            .iter()
            .zip(&tiles)
            .enumerate()
            .map(|(i, (name, tile))| Entity::new(i as u64, *name, *tile))
            .collect();
        let mut world = WorldModel::new(names.len());
        world.commit_observation(Observation {
            points: Some(0),
            seed: seed.then_some(ItemId(13423)),
            water,
            water_capacity: 64,
            fruit,
            patches: PatchSet::bind(&tiles, &entities),
        });
        world
    }

    #[test]
    fn deposit_waits_for_round_to_finish() {
        assert!(should_deposit(&world(&["Tithe patch", "Tithe patch"], 64, 3, false)));
        assert!(!should_deposit(&world(&["Tithe patch", "Golovanova plant"], 64, 3, false)));
        assert!(!should_deposit(&world(&["Tithe patch"], 64, 0, false)));
    }

    #[test]
    fn refill_between_rounds_or_when_dry() {
        let empty = ["Tithe patch"; 4];
        assert!(should_refill(&world(&empty, 11, 0, true)));
        assert!(!should_refill(&world(&empty, 12, 0, true)));

        let growing = ["Golovanova plant"; 4];
        assert!(!should_refill(&world(&growing, 5, 0, true)));
        assert!(should_refill(&world(&growing, 0, 0, true)));
    }

    #[test]
    fn refill_skipped_when_cans_are_full() {
        // Two full cans cannot cover twenty patches; refilling would never settle.
        let mut w = world(&["Tithe patch"; 20], 16, 0, true);
        w.commit_observation(Observation {
            water_capacity: 16,
            ..(*w.observation()).clone()
        });
        assert!(!w.has_enough_water());
        assert!(!should_refill(&w));
    }

    #[test]
    fn leave_when_out_of_seeds_or_final_round() {
        assert!(should_leave(&world(&["Tithe patch"], 64, 0, false)));
        assert!(!should_leave(&world(&["Tithe patch"], 64, 0, true)));

        let mut w = world(&["Tithe patch"], 64, 0, true);
        w.set_final_round(true);
        assert!(should_leave(&w));
    }

    #[test]
    fn patch_guards_follow_next_patch() {
        assert!(next_blighted(&world(&["Blighted golovanova plant"], 64, 0, false)));
        assert!(next_grown(&world(&["Grown golovanova plant"], 64, 0, false)));
        assert!(next_dry(&world(&["Golovanova seedling"], 64, 0, false)));
        assert!(next_empty(&world(&["Tithe patch"], 64, 0, true)));
        assert!(!next_empty(&world(&["Tithe patch"], 64, 0, false)));
    }
}
