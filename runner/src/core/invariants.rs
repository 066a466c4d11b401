//! Structural invariants of a behavior tree.

use std::collections::HashSet;

use crate::io::environment::Environment;
use crate::tree::Node;

/// Check invariants the type system does not enforce:
/// - No duplicate node names (paths must identify nodes unambiguously)
/// - Every branch has at least one child
pub fn validate_invariants<E: Environment + ?Sized>(root: &Node<E>) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    validate_node(root, &mut seen, &mut errors, root.name());
    errors
}

fn validate_node<E: Environment + ?Sized>(
    node: &Node<E>,
    seen: &mut HashSet<String>,
    errors: &mut Vec<String>,
    path: &str,
) {
    if !seen.insert(node.name().to_string()) {
        errors.push(format!("duplicate name '{}' at {}", node.name(), path));
    }

    if matches!(node, Node::Branch { children, .. } if children.is_empty()) {
        errors.push(format!("{}: branch has no children", path));
    }

    for child in node.children() {
        let child_path = format!("{}/{}", path, child.name());
        validate_node(child, seen, errors, &child_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEnv, RecordingLeaf};
    use crate::tree::{LeafStatus, always};

    fn leaf(name: &str) -> Node<FakeEnv> {
        Node::leaf(always, RecordingLeaf::new(name, LeafStatus::Success).0)
    }

    #[test]
    fn valid_tree_has_no_errors() {
        let root = Node::branch(
            "root",
            always,
            vec![Node::branch("inside", always, vec![leaf("water")]), leaf("idle")],
        );
        assert!(validate_invariants(&root).is_empty());
    }

    #[test]
    fn duplicate_names_are_reported_with_path() {
        let root = Node::branch(
            "root",
            always,
            vec![Node::branch("inside", always, vec![leaf("idle")]), leaf("idle")],
        );
        assert_eq!(
            validate_invariants(&root),
            ["duplicate name 'idle' at root/idle"]
        );
    }

    #[test]
    fn empty_branch_is_reported() {
        let root: Node<FakeEnv> =
            Node::branch("root", always, vec![Node::branch("outside", always, Vec::new())]);
        assert_eq!(
            validate_invariants(&root),
            ["root/outside: branch has no children"]
        );
    }
}
