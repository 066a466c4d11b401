//! Helpers for rendering deterministic node paths.

use crate::io::environment::Environment;
use crate::tree::Node;

/// Return the `/`-separated name path reached by following child `indices`
/// from `root`, or `None` if an index does not exist.
pub fn node_path<E: Environment + ?Sized>(root: &Node<E>, indices: &[usize]) -> Option<String> {
    let mut names = vec![root.name()];
    let mut node = root;
    for &index in indices {
        node = node.children().get(index)?;
        names.push(node.name());
    }
    Some(names.join("/"))
}
