//! Orchestration for a single control-loop tick.
//!
//! One tick applies queued events, checks that the game is still ticking,
//! samples the environment into a fresh observation, then lets the tree run at
//! most one leaf.

use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::io::environment::Environment;
use crate::io::events::EventIngestor;
use crate::io::executor::ActionExecutor;
use crate::io::observe::observe;
use crate::tree::{LeafStatus, TerminalError, TickOutcome, Tree};
use crate::world::WorldModel;

/// Configuration for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepConfig {
    /// Skip traversal when no game tick arrived for this long. `None`
    /// disables stall detection.
    pub stall_timeout: Option<Duration>,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Executed {
        leaf: String,
        path: String,
        status: LeafStatus,
    },
    /// No leaf applied.
    NoAction,
    /// The game has not ticked for `since`; nothing was observed or run.
    Stalled { since: Duration },
}

impl From<TickOutcome> for StepOutcome {
    fn from(outcome: TickOutcome) -> Self {
        match outcome {
            TickOutcome::Executed { leaf, path, status } => Self::Executed { leaf, path, status },
            TickOutcome::NoAction => Self::NoAction,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Tick number (1-indexed).
    pub tick: u64,
    /// Events applied at the top of the tick.
    pub events: usize,
    pub outcome: StepOutcome,
}

/// Mutable state one tick operates on.
pub struct StepParts<'a, E: Environment + ?Sized> {
    pub env: &'a mut E,
    pub tree: &'a mut Tree<E>,
    pub executor: &'a mut ActionExecutor,
    pub world: &'a mut WorldModel,
    pub ingestor: &'a EventIngestor,
}

/// Run one tick.
///
/// `started` is the stall reference until the first game tick arrives.
/// A [`TerminalError`] from the selected leaf is passed through unchanged.
#[instrument(skip_all, fields(tick = tick))]
pub fn run_step<E: Environment + ?Sized>(
    parts: StepParts<'_, E>,
    config: &StepConfig,
    tick: u64,
    started: Instant,
) -> Result<StepReport, TerminalError> {
    let StepParts {
        env,
        tree,
        executor,
        world,
        ingestor,
    } = parts;

    let events = ingestor.drain(world, &*env);

    if let Some(timeout) = config.stall_timeout {
        let since = world.last_tick().unwrap_or(started).elapsed();
        if since > timeout {
            warn!(since_ms = since.as_millis(), "no game tick; skipping traversal");
            return Ok(StepReport {
                tick,
                events,
                outcome: StepOutcome::Stalled { since },
            });
        }
    }

    let observation = observe(&*env, world.layout());
    world.commit_observation(observation);

    let outcome = tree.tick(env, executor, world)?;
    debug!(events, ?outcome, "tick finished");
    Ok(StepReport {
        tick,
        events,
        outcome: outcome.into(),
    })
}
