//! The Tithe Farm behavior tree.
//!
//! ```text
//! root
//! ├── finish                       (outside, final round)
//! ├── outside
//! │   ├── take-seeds               (no seeds)
//! │   └── enter
//! └── inside
//!     ├── setup-patches            (layout missing)
//!     ├── deposit | refill | leave
//!     ├── clear | harvest | water | plant   (state of the next patch)
//!     └── idle                     (cooldown elapsed)
//! ```

pub mod guards;
pub mod leaves;

use std::time::Duration;

use anyhow::Result;

use crate::core::data::{SeedKind, default_patch_names};
use crate::io::environment::Environment;
use crate::tree::{Node, Tree, always};

use leaves::{Deposit, Enter, Finish, Idle, Leave, Refill, SetupPatches, TakeSeeds, Tend, Tending};

/// Default idle heartbeat.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Default wait for an action's effect to show up.
pub const DEFAULT_LEAF_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmSettings {
    pub seed: SeedKind,
    pub cooldown: Duration,
    pub leaf_wait: Duration,
    /// Entity name fragments that identify patches.
    pub patch_names: Vec<String>,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            seed: SeedKind::default(),
            cooldown: DEFAULT_COOLDOWN,
            leaf_wait: DEFAULT_LEAF_WAIT,
            patch_names: default_patch_names(),
        }
    }
}

/// Assemble the farm tree.
pub fn build_tree<E: Environment + ?Sized + 'static>(settings: &FarmSettings) -> Result<Tree<E>> {
    let wait = settings.leaf_wait;
    let tend = |tending| Tend::new(tending, wait);
    Tree::new(Node::branch(
        "root",
        always,
        vec![
            Node::leaf(guards::finished, Finish),
            Node::branch(
                "outside",
                guards::outside,
                vec![
                    Node::leaf(guards::no_seeds, TakeSeeds::new(settings.seed, wait)),
                    Node::leaf(always, Enter::new(wait)),
                ],
            ),
            Node::branch(
                "inside",
                guards::inside,
                vec![
                    Node::leaf(
                        guards::layout_missing,
                        SetupPatches::new(settings.patch_names.clone()),
                    ),
                    Node::leaf(guards::should_deposit, Deposit::new(wait)),
                    Node::leaf(guards::should_refill, Refill::new(wait)),
                    Node::leaf(guards::should_leave, Leave::new(wait)),
                    Node::leaf(guards::next_blighted, tend(Tending::Clear)),
                    Node::leaf(guards::next_grown, tend(Tending::Harvest)),
                    Node::leaf(guards::next_dry, tend(Tending::Water)),
                    Node::leaf(guards::next_empty, tend(Tending::Plant)),
                    Node::leaf(guards::cooldown_elapsed, Idle::new(settings.cooldown)),
                ],
            ),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patch::PatchSet;
    use crate::core::types::{Entity, ItemId, Tile};
    use crate::select::SelectOutcome;
    use crate::test_support::FakeEnv;
    use crate::world::{Observation, WorldModel};

    fn selected(tree: &Tree<FakeEnv>, world: &WorldModel) -> Option<String> {
        match tree.select(world) {
            SelectOutcome::Leaf(leaf) => Some(leaf.path),
            SelectOutcome::NoAction => None,
        }
    }

    fn inside(names: &[&str], seed: bool, water: u32) -> WorldModel {
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
        world.commit_layout(tiles.clone());
        world.commit_observation(Observation {
            points: Some(0),
            seed: seed.then_some(ItemId(13423)),
            water,
            water_capacity: 64,
            fruit: 0,
            patches: PatchSet::bind(&tiles, &entities),
        });
        world
    }

    #[test]
    fn tree_passes_structural_checks() {
        let tree: Tree<FakeEnv> = build_tree(&FarmSettings::default()).expect("tree");
        let names: Vec<&str> = tree.root().children().iter().map(|n| n.name()).collect();
        assert_eq!(names, ["finish", "outside", "inside"]);
    }

    #[test]
    fn outside_without_seeds_takes_seeds_first() {
        let tree: Tree<FakeEnv> = build_tree(&FarmSettings::default()).expect("tree");
        let mut world = WorldModel::new(16);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/outside/take-seeds"));

        world.commit_observation(Observation {
            seed: Some(ItemId(13423)),
            ..Observation::default()
        });
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/outside/enter"));

        world.set_final_round(true);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/finish"));
    }

    #[test]
    fn inside_priorities_follow_declared_order() {
        let tree: Tree<FakeEnv> = build_tree(&FarmSettings::default()).expect("tree");

        let mut world = WorldModel::new(2);
        world.commit_observation(Observation {
            points: Some(0),
            ..Observation::default()
        });
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/setup-patches"));

        let world = inside(&["Tithe patch", "Tithe patch"], true, 64);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/plant"));

        let world = inside(&["Tithe patch", "Tithe patch"], true, 2);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/refill"));

        let world = inside(&["Tithe patch", "Tithe patch"], false, 64);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/leave"));

        let world = inside(&["Blighted golovanova plant", "Grown golovanova plant"], true, 64);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/clear"));

        let world = inside(&["Watered golovanova plant", "Golovanova plant"], true, 64);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/water"));

        let world = inside(&["Watered golovanova plant"], true, 64);
        assert_eq!(selected(&tree, &world).as_deref(), Some("root/inside/idle"));
    }
}
