//! Per-tick environment sampling.

use tracing::trace;

use crate::core::counters::{fruit_count, held_seed, parse_points, water_capacity, water_count};
use crate::core::data::{POINTS_WIDGET, REFRESH_RADIUS, SEEDS};
use crate::core::patch::PatchSet;
use crate::core::types::Tile;
use crate::io::environment::{Environment, EntityFilter};
use crate::world::Observation;

/// Read the points counter. `None` while the counter widget is not shown.
pub fn read_points<E: Environment + ?Sized>(env: &E) -> Option<u32> {
    parse_points(env.widget_texts(POINTS_WIDGET).as_deref())
}

/// Rebind every layout tile to the object currently standing on it.
pub fn refresh_patches<E: Environment + ?Sized>(env: &E, layout: &[Tile]) -> PatchSet {
    let entities = env.query_entities(&EntityFilter::within(REFRESH_RADIUS));
    PatchSet::bind(layout, &entities)
}

/// Sample counters, inventory and (once a layout exists) the patch set.
pub fn observe<E: Environment + ?Sized>(env: &E, layout: Option<&[Tile]>) -> Observation {
    let items = env.inventory();
    let observation = Observation {
        points: read_points(env),
        seed: held_seed(&items, &SEEDS),
        water: water_count(&items),
        water_capacity: water_capacity(&items),
        fruit: fruit_count(&items),
        patches: layout
            .map(|tiles| refresh_patches(env, tiles))
            .unwrap_or_default(),
    };
    trace!(
        points = ?observation.points,
        water = observation.water,
        fruit = observation.fruit,
        "observed"
    );
    observation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patch::PatchState;
    use crate::core::types::ItemId;
    use crate::test_support::FakeEnv;

    #[test]
    fn observe_samples_counters_and_patches() {
        let mut env = FakeEnv::new();
        env.in_game = true;
        env.points = 1234;
        env.add_item(ItemId(5340));
        env.add_item(ItemId(13425));
        env.add_item(ItemId(13426));
        let tile = Tile::new(5, 5, 0);
        env.add_entity("Logavano seedling", tile);

        let layout = [tile, Tile::new(9, 9, 0)];
        let observation = observe(&env, Some(&layout[..]));
        assert_eq!(observation.points, Some(1234));
        assert_eq!(observation.seed, Some(ItemId(13425)));
        assert_eq!(observation.water, 8);
        assert_eq!(observation.water_capacity, 8);
        assert_eq!(observation.fruit, 1);
        assert_eq!(observation.patches.len(), 2);
        assert_eq!(observation.patches.get(0).map(|p| p.state()), Some(PatchState::Dry));
        assert_eq!(observation.patches.get(1).map(|p| p.state()), Some(PatchState::Absent));
    }

    #[test]
    fn points_unavailable_outside_the_farm() {
        let env = FakeEnv::new();
        assert_eq!(read_points(&env), None);
        assert!(observe(&env, None).patches.is_empty());
    }
}
