//! Action executor.
//!
//! [`ActionExecutor::interact`] turns "do `action` on `target`" into the
//! sequence the game needs: toggle run, walk closer if needed, fix the
//! inventory selection, click, then wait for the selection to settle. All
//! failures are reported as `false`; the calling leaf decides whether the next
//! tick should try again. The executor never writes to the world model.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, instrument};

use crate::core::types::{Entity, ItemId, Locatable, Nameable};
use crate::io::environment::Environment;
use crate::io::wait::{WaitConfig, wait_until};

/// Distance beyond which the player walks toward a target before interacting.
pub const DEFAULT_PROXIMITY: f64 = 12.0;

/// Run is enabled once energy reaches a threshold drawn from this range.
const RUN_THRESHOLD: std::ops::Range<u32> = 1..5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorConfig {
    pub proximity: f64,
    /// Post-interaction selection wait.
    pub wait: WaitConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            proximity: DEFAULT_PROXIMITY,
            wait: WaitConfig::default(),
        }
    }
}

pub struct ActionExecutor {
    config: ExecutorConfig,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ActionExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Executor with a fixed random source, e.g. `StdRng::seed_from_u64`.
    pub fn with_rng<R: RngCore + Send + 'static>(config: ExecutorConfig, rng: R) -> Self {
        Self {
            config,
            rng: Box::new(rng),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Interact with `target`, first making sure the inventory selection is
    /// `select` (`None` means nothing selected).
    ///
    /// Returns `true` only if the interaction was accepted and the selection
    /// settled afterwards. Returns within the wait timeout plus one movement
    /// command.
    #[instrument(skip_all, fields(action = %action, select = ?select, use_menu = use_menu))]
    pub fn interact<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        target: Option<&Entity>,
        action: &str,
        select: Option<ItemId>,
        use_menu: bool,
    ) -> bool {
        let Some(target) = target else {
            debug!("no target");
            return false;
        };
        if !env.exists(target) {
            debug!(tile = %target.tile, "target no longer present");
            return false;
        }
        let name = target.name();
        let tile = target.tile();

        self.ensure_run(env);
        self.approach(env, target);

        let selected = env.selected_item();
        if selected != select {
            match select {
                Some(id) => {
                    if let Some(item) = env.find_item(id) {
                        debug!(item = %id, "selecting item");
                        env.use_item(&item);
                    }
                }
                None => {
                    if let Some(item) = selected.and_then(|id| env.find_item(id)) {
                        debug!(item = %item.id, "deselecting item");
                        env.click_item(&item);
                    }
                }
            }
        }

        let accepted = env.interact(target, action, name, use_menu);
        let settled = {
            let env: &E = env;
            wait_until(&self.config.wait, || {
                let current = env.selected_item();
                current.is_none() || current == select
            })
        };
        debug!(%tile, accepted, settled, "interaction finished");
        settled && accepted
    }

    /// Enable run if it is off and energy clears a randomized threshold.
    pub fn ensure_run<E: Environment + ?Sized>(&mut self, env: &mut E) -> bool {
        if env.run_enabled() {
            return true;
        }
        let threshold = self.rng.gen_range(RUN_THRESHOLD);
        if env.energy() >= threshold {
            return env.enable_run();
        }
        false
    }

    /// Walk toward `target` unless it is visible and the current (or planned)
    /// position is close enough. Best-effort: the result is not checked.
    fn approach<E: Environment + ?Sized>(&mut self, env: &mut E, target: &Entity) {
        let tile = target.tile();
        let destination = env.destination();
        let reference = destination.unwrap_or_else(|| env.player_tile());
        let visible = env.in_viewport(target);
        let too_far =
            destination != Some(tile) && tile.distance_to(reference) > self.config.proximity;
        if visible && !too_far {
            return;
        }
        info!(%tile, visible, "walking before interacting");
        if env.on_map(tile) {
            env.step_to(tile);
        } else {
            env.traverse_path(tile);
        }
    }

    /// Wait on an arbitrary condition using the executor's poll cadence.
    pub fn wait_for<F: FnMut() -> bool>(&self, timeout: Duration, condition: F) -> bool {
        wait_until(&self.config.wait.with_timeout(timeout), condition)
    }
}
