//! Deterministic selection logic for the behavior tree.

use crate::io::environment::Environment;
use crate::tree::Node;
use crate::world::WorldModel;

/// Child indices from the root to the leaf that applies to `world`.
///
/// Each branch descends into its first applicable child. There is no
/// backtracking: a branch whose children all decline makes the whole tick
/// inapplicable, and `None` is returned. Guards are pure, so the same world
/// always yields the same path.
pub fn select_path<E: Environment + ?Sized>(
    root: &Node<E>,
    world: &WorldModel,
) -> Option<Vec<usize>> {
    if !root.applies(world) {
        return None;
    }
    let mut indices = Vec::new();
    let mut node = root;
    loop {
        match node {
            Node::Leaf { .. } => return Some(indices),
            Node::Branch { children, .. } => {
                let (index, child) = children
                    .iter()
                    .enumerate()
                    .find(|(_, child)| child.applies(world))?;
                indices.push(index);
                node = child;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patch::PatchSet;
    use crate::core::types::{Entity, ItemId, Tile};
    use crate::test_support::{FakeEnv, RecordingLeaf};
    use crate::tree::{LeafStatus, always};
    use crate::world::Observation;

    fn has_seeds(world: &WorldModel) -> bool {
        world.has_seeds()
    }

    fn in_game(world: &WorldModel) -> bool {
        world.in_game()
    }

    fn tree() -> Node<FakeEnv> {
        let leaf = |name: &str| RecordingLeaf::new(name, LeafStatus::Success).0;
        Node::branch(
            "root",
            always,
            vec![
                Node::branch(
                    "inside",
                    in_game,
                    vec![
                        Node::leaf(has_seeds, leaf("plant")),
                        Node::leaf(always, leaf("idle")),
                    ],
                ),
                Node::leaf(always, leaf("enter")),
            ],
        )
    }

    fn world(points: Option<u32>, seed: Option<ItemId>) -> WorldModel {
        let tile = Tile::new(0, 0, 0);
        let mut world = WorldModel::new(1);
        world.commit_observation(Observation {
            points,
            seed,
            patches: PatchSet::bind(&[tile], &[Entity::new(1, "Tithe patch", tile)]),
            ..Observation::default()
        });
        world
    }

    #[test]
    fn descends_into_first_applicable_child() {
        let root = tree();
        assert_eq!(select_path(&root, &world(Some(5), Some(ItemId(13423)))), Some(vec![0, 0]));
        assert_eq!(select_path(&root, &world(Some(5), None)), Some(vec![0, 1]));
        assert_eq!(select_path(&root, &world(None, None)), Some(vec![1]));
    }

    #[test]
    fn selection_is_deterministic_for_a_snapshot() {
        let root = tree();
        let snapshot = world(Some(5), None);
        let first = select_path(&root, &snapshot);
        let second = select_path(&root, &snapshot);
        assert_eq!(first, second);
    }
}
