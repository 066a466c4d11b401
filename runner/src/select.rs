//! Selection reporting for the behavior tree.

use crate::core::path::node_path;
use crate::core::selector::select_path;
use crate::io::environment::Environment;
use crate::tree::Node;
use crate::world::WorldModel;

/// Structured selection outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// No leaf applies to the current world.
    NoAction,
    /// Leaf that would run this tick.
    Leaf(SelectedLeaf),
}

/// Minimal selected leaf metadata for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedLeaf {
    pub name: String,
    pub path: String,
    pub indices: Vec<usize>,
}

/// Select the leaf for `world` without executing anything.
pub fn select_leaf<E: Environment + ?Sized>(root: &Node<E>, world: &WorldModel) -> SelectOutcome {
    let Some(indices) = select_path(root, world) else {
        return SelectOutcome::NoAction;
    };
    let Some(path) = node_path(root, &indices) else {
        return SelectOutcome::NoAction;
    };
    let name = path.rsplit('/').next().unwrap_or_default().to_string();
    SelectOutcome::Leaf(SelectedLeaf {
        name,
        path,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEnv, RecordingLeaf};
    use crate::tree::{LeafStatus, always};

    fn never(_: &WorldModel) -> bool {
        false
    }

    #[test]
    fn select_reports_leaf_path() {
        let (leaf, runs) = RecordingLeaf::new("idle", LeafStatus::Success);
        let root: Node<FakeEnv> = Node::branch("root", always, vec![Node::leaf(always, leaf)]);
        let outcome = select_leaf(&root, &WorldModel::new(16));
        assert_eq!(
            outcome,
            SelectOutcome::Leaf(SelectedLeaf {
                name: "idle".to_string(),
                path: "root/idle".to_string(),
                indices: vec![0],
            })
        );
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn select_returns_no_action_when_nothing_applies() {
        let (leaf, _) = RecordingLeaf::new("idle", LeafStatus::Success);
        let root: Node<FakeEnv> = Node::branch("root", always, vec![Node::leaf(never, leaf)]);
        assert_eq!(select_leaf(&root, &WorldModel::new(16)), SelectOutcome::NoAction);
    }
}
