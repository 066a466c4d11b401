//! Behavior tree types.
//!
//! A tree is a [`Node`] owning its children, so it is acyclic with a single
//! root by construction. Branch guards are plain `fn` pointers over the world
//! model and cannot capture state; a leaf may additionally gate itself on its
//! own fields through [`Leaf::ready`].

use std::fmt;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::core::invariants::validate_invariants;
use crate::core::selector::select_path;
use crate::io::environment::Environment;
use crate::io::executor::ActionExecutor;
use crate::select::{SelectOutcome, select_leaf};
use crate::world::WorldModel;

/// Pure applicability predicate.
pub type Guard = fn(&WorldModel) -> bool;

/// Guard that always passes.
pub fn always(_: &WorldModel) -> bool {
    true
}

/// Outcome of a leaf that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafStatus {
    Success,
    /// Transient failure; the next tick re-evaluates from the root.
    Failure,
}

/// Unrecoverable condition raised by a leaf. Ends the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalError {
    pub leaf: String,
    pub reason: String,
}

impl TerminalError {
    pub fn new(leaf: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            leaf: leaf.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.leaf, self.reason)
    }
}

impl std::error::Error for TerminalError {}

/// Everything a leaf may touch while executing.
pub struct LeafContext<'a, E: ?Sized> {
    pub env: &'a mut E,
    pub executor: &'a mut ActionExecutor,
    /// Leaves commit to the world model only after their action completes.
    pub world: &'a mut WorldModel,
}

/// Terminal tree node.
pub trait Leaf<E: Environment + ?Sized> {
    fn name(&self) -> &str;

    /// Extra applicability check over the leaf's own state.
    fn ready(&self, _world: &WorldModel) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError>;
}

pub enum Node<E: Environment + ?Sized> {
    Branch {
        name: String,
        guard: Guard,
        children: Vec<Node<E>>,
    },
    Leaf {
        guard: Guard,
        leaf: Box<dyn Leaf<E>>,
    },
}

impl<E: Environment + ?Sized> Node<E> {
    pub fn branch(name: impl Into<String>, guard: Guard, children: Vec<Node<E>>) -> Self {
        Self::Branch {
            name: name.into(),
            guard,
            children,
        }
    }

    pub fn leaf<L: Leaf<E> + 'static>(guard: Guard, leaf: L) -> Self {
        Self::Leaf {
            guard,
            leaf: Box::new(leaf),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Branch { name, .. } => name,
            Self::Leaf { leaf, .. } => leaf.name(),
        }
    }

    pub fn children(&self) -> &[Node<E>] {
        match self {
            Self::Branch { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }

    /// Whether this node applies to `world`.
    pub fn applies(&self, world: &WorldModel) -> bool {
        match self {
            Self::Branch { guard, .. } => guard(world),
            Self::Leaf { guard, leaf } => guard(world) && leaf.ready(world),
        }
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut Node<E>> {
        match self {
            Self::Branch { children, .. } => children.get_mut(index),
            Self::Leaf { .. } => None,
        }
    }
}

impl<E: Environment + ?Sized> fmt::Debug for Node<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch { name, children, .. } => f
                .debug_struct("Branch")
                .field("name", name)
                .field("children", children)
                .finish(),
            Self::Leaf { leaf, .. } => f.debug_struct("Leaf").field("name", &leaf.name()).finish(),
        }
    }
}

/// What one tick of the tree did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A leaf ran.
    Executed {
        leaf: String,
        path: String,
        status: LeafStatus,
    },
    /// No leaf applied this tick.
    NoAction,
}

/// Validated behavior tree.
#[derive(Debug)]
pub struct Tree<E: Environment + ?Sized> {
    root: Node<E>,
}

impl<E: Environment + ?Sized> Tree<E> {
    /// Wrap `root`, rejecting trees that break structural invariants.
    pub fn new(root: Node<E>) -> Result<Self> {
        let errors = validate_invariants(&root);
        if !errors.is_empty() {
            bail!("invalid behavior tree:\n- {}", errors.join("\n- "));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Node<E> {
        &self.root
    }

    /// Select the leaf that would run for `world`, without running it.
    pub fn select(&self, world: &WorldModel) -> SelectOutcome {
        select_leaf(&self.root, world)
    }

    /// Select and run at most one leaf.
    pub fn tick(
        &mut self,
        env: &mut E,
        executor: &mut ActionExecutor,
        world: &mut WorldModel,
    ) -> Result<TickOutcome, TerminalError> {
        let Some(indices) = select_path(&self.root, world) else {
            debug!("no applicable leaf");
            return Ok(TickOutcome::NoAction);
        };
        let mut path = vec![self.root.name().to_string()];
        let mut node = &mut self.root;
        for index in indices {
            match node.child_mut(index) {
                Some(child) => {
                    path.push(child.name().to_string());
                    node = child;
                }
                None => return Ok(TickOutcome::NoAction),
            }
        }
        let Node::Leaf { leaf, .. } = node else {
            return Ok(TickOutcome::NoAction);
        };

        let path = path.join("/");
        info!(%path, "executing leaf");
        let mut ctx = LeafContext {
            env,
            executor,
            world,
        };
        let status = leaf.execute(&mut ctx)?;
        debug!(%path, ?status, "leaf finished");
        Ok(TickOutcome::Executed {
            leaf: leaf.name().to_string(),
            path,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEnv, RecordingLeaf, fast_executor};

    fn in_game(world: &WorldModel) -> bool {
        world.in_game()
    }

    fn outside(world: &WorldModel) -> bool {
        !world.in_game()
    }

    fn never(_: &WorldModel) -> bool {
        false
    }

    #[test]
    fn tick_runs_first_applicable_leaf_only() {
        let (first, first_runs) = RecordingLeaf::new("first", LeafStatus::Success);
        let (second, second_runs) = RecordingLeaf::new("second", LeafStatus::Success);
        let mut tree = Tree::new(Node::branch(
            "root",
            always,
            vec![Node::leaf(outside, first), Node::leaf(always, second)],
        ))
        .expect("tree");

        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        let outcome = tree.tick(&mut env, &mut executor, &mut world).expect("tick");

        assert_eq!(
            outcome,
            TickOutcome::Executed {
                leaf: "first".to_string(),
                path: "root/first".to_string(),
                status: LeafStatus::Success,
            }
        );
        assert_eq!(first_runs.get(), 1);
        assert_eq!(second_runs.get(), 0);
    }

    #[test]
    fn branch_without_applicable_child_is_a_no_op_tick() {
        let (inner, inner_runs) = RecordingLeaf::new("inner", LeafStatus::Success);
        let (sibling, sibling_runs) = RecordingLeaf::new("sibling", LeafStatus::Success);
        let mut tree = Tree::new(Node::branch(
            "root",
            always,
            vec![
                Node::branch("outer", always, vec![Node::leaf(in_game, inner)]),
                Node::leaf(always, sibling),
            ],
        ))
        .expect("tree");

        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        let outcome = tree.tick(&mut env, &mut executor, &mut world).expect("tick");

        assert_eq!(outcome, TickOutcome::NoAction);
        assert_eq!(inner_runs.get(), 0);
        assert_eq!(sibling_runs.get(), 0);
    }

    /// Runs once per session, tracked by the leaf itself.
    struct Once {
        done: bool,
        runs: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl Leaf<FakeEnv> for Once {
        fn name(&self) -> &str {
            "once"
        }

        fn ready(&self, _world: &WorldModel) -> bool {
            !self.done
        }

        fn execute(
            &mut self,
            _ctx: &mut LeafContext<'_, FakeEnv>,
        ) -> Result<LeafStatus, TerminalError> {
            self.runs.set(self.runs.get() + 1);
            self.done = true;
            Ok(LeafStatus::Success)
        }
    }

    #[test]
    fn leaf_state_can_refuse_selection() {
        let once_runs = std::rc::Rc::new(std::cell::Cell::new(0));
        let once = Once {
            done: false,
            runs: once_runs.clone(),
        };
        let (sibling, sibling_runs) = RecordingLeaf::new("sibling", LeafStatus::Success);
        let mut tree = Tree::new(Node::branch(
            "root",
            always,
            vec![Node::leaf(always, once), Node::leaf(always, sibling)],
        ))
        .expect("tree");

        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        let first = tree.tick(&mut env, &mut executor, &mut world).expect("tick");
        assert!(matches!(first, TickOutcome::Executed { ref leaf, .. } if leaf == "once"));

        let second = tree.tick(&mut env, &mut executor, &mut world).expect("tick");
        assert_eq!(
            second,
            TickOutcome::Executed {
                leaf: "sibling".to_string(),
                path: "root/sibling".to_string(),
                status: LeafStatus::Success,
            }
        );
        assert_eq!(once_runs.get(), 1);
        assert_eq!(sibling_runs.get(), 1);
    }

    #[test]
    fn leaf_that_is_not_ready_never_runs() {
        let once_runs = std::rc::Rc::new(std::cell::Cell::new(0));
        let once = Once {
            done: true,
            runs: once_runs.clone(),
        };
        let mut tree =
            Tree::new(Node::branch("root", always, vec![Node::leaf(always, once)])).expect("tree");
        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        assert_eq!(
            tree.tick(&mut env, &mut executor, &mut world).expect("tick"),
            TickOutcome::NoAction
        );
        assert_eq!(once_runs.get(), 0);
    }

    #[test]
    fn root_guard_gates_everything() {
        let (leaf, runs) = RecordingLeaf::new("leaf", LeafStatus::Success);
        let mut tree =
            Tree::new(Node::branch("root", never, vec![Node::leaf(always, leaf)])).expect("tree");
        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        assert_eq!(
            tree.tick(&mut env, &mut executor, &mut world).expect("tick"),
            TickOutcome::NoAction
        );
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn terminal_error_propagates() {
        let (leaf, _) = RecordingLeaf::terminal("finish", "session over");
        let mut tree =
            Tree::new(Node::branch("root", always, vec![Node::leaf(always, leaf)])).expect("tree");
        let mut env = FakeEnv::new();
        let mut executor = fast_executor();
        let mut world = WorldModel::new(16);
        let err = tree
            .tick(&mut env, &mut executor, &mut world)
            .expect_err("terminal");
        assert_eq!(err, TerminalError::new("finish", "session over"));
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let (a, _) = RecordingLeaf::new("dup", LeafStatus::Success);
        let (b, _) = RecordingLeaf::new("dup", LeafStatus::Success);
        let err = Tree::<FakeEnv>::new(Node::branch(
            "root",
            always,
            vec![
                Node::leaf(always, a),
                Node::leaf(always, b),
                Node::branch("empty", always, Vec::new()),
            ],
        ))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate name 'dup'"));
        assert!(message.contains("root/empty: branch has no children"));
    }
}
