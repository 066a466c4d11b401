//! Behavior-tree control loop for the Tithe Farm minigame.
//!
//! Every tick the loop applies queued game events to the world model, samples
//! the game into a fresh observation, and runs at most one leaf of the farm
//! tree. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (layout, counters, patch states,
//!   selection). No I/O, fully testable in isolation.
//! - **[`io`]**: The [`io::environment::Environment`] seam to the game client,
//!   event ingestion, the action executor and config files.
//!
//! [`tree`] and [`world`] hold the engine types, [`farm`] the concrete tree,
//! and [`step`] / [`looping`] orchestrate ticks.

pub mod core;
pub mod exit_codes;
pub mod farm;
pub mod io;
pub mod logging;
pub mod looping;
pub mod select;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;
pub mod world;
