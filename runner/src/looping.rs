//! The control loop: repeated ticks with pacing, backoff and stop conditions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::farm::build_tree;
use crate::io::config::BotConfig;
use crate::io::environment::Environment;
use crate::io::events::{EventIngestor, EventSender};
use crate::io::executor::ActionExecutor;
use crate::step::{StepConfig, StepOutcome, StepParts, StepReport, run_step};
use crate::tree::{LeafStatus, TerminalError, Tree};
use crate::world::WorldModel;

/// Longest single sleep before the stop flag is checked again.
const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Minimum time between the starts of two ticks.
    pub tick_interval: Duration,
    /// Ceiling for the delay after consecutive leaf failures.
    pub backoff_max: Duration,
    pub max_ticks: Option<u64>,
    pub step: StepConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(600),
            backoff_max: Duration::from_secs(5),
            max_ticks: None,
            step: StepConfig::default(),
        }
    }
}

/// Reason why [`ControlLoop::run`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// [`StopHandle::stop`] was called.
    Stopped,
    /// A leaf reported an unrecoverable condition.
    Terminal { leaf: String, reason: String },
    /// The configured tick limit was reached.
    MaxTicks { max_ticks: u64 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub ticks: u64,
    /// Points gained during the run; kept on every stop reason.
    pub gained_points: u32,
    pub stop: LoopStop,
}

/// Cloneable cancellation flag, checked between ticks.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Delay before the next tick after `failures` consecutive leaf failures.
pub fn backoff_delay(interval: Duration, failures: u32, max: Duration) -> Duration {
    if failures == 0 {
        return interval;
    }
    interval
        .saturating_mul(2u32.saturating_pow(failures.min(16)))
        .min(max.max(interval))
}

/// Owns everything a run needs and drives it tick by tick.
pub struct ControlLoop<E: Environment> {
    env: E,
    tree: Tree<E>,
    executor: ActionExecutor,
    world: WorldModel,
    ingestor: EventIngestor,
    config: LoopConfig,
    stop: StopHandle,
    started: Instant,
    ticks: u64,
    failures: u32,
}

impl<E: Environment> ControlLoop<E> {
    pub fn new(
        env: E,
        tree: Tree<E>,
        executor: ActionExecutor,
        ingestor: EventIngestor,
        patch_count: usize,
        config: LoopConfig,
    ) -> Self {
        Self {
            env,
            tree,
            executor,
            world: WorldModel::new(patch_count),
            ingestor,
            config,
            stop: StopHandle::default(),
            started: Instant::now(),
            ticks: 0,
            failures: 0,
        }
    }

    /// Build the farm loop described by `config`. The returned sender feeds
    /// game events into the loop.
    pub fn from_config(env: E, config: &BotConfig) -> Result<(Self, EventSender)>
    where
        E: 'static,
    {
        config.validate()?;
        let tree = build_tree(&config.farm_settings())?;
        let (sender, ingestor) = EventIngestor::new(config.patch_names.clone());
        let executor = ActionExecutor::new(config.executor_config());
        let control = Self::new(
            env,
            tree,
            executor,
            ingestor,
            config.patch_count(),
            config.loop_config(),
        );
        Ok((control, sender))
    }

    /// Replace the executor, e.g. with a seeded one.
    pub fn with_executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn tree(&self) -> &Tree<E> {
        &self.tree
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Consecutive ticks whose leaf failed.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Run one tick now, without pacing.
    pub fn tick(&mut self) -> Result<StepReport, TerminalError> {
        self.ticks += 1;
        let report = run_step(
            StepParts {
                env: &mut self.env,
                tree: &mut self.tree,
                executor: &mut self.executor,
                world: &mut self.world,
                ingestor: &self.ingestor,
            },
            &self.config.step,
            self.ticks,
            self.started,
        )?;
        match &report.outcome {
            StepOutcome::Executed {
                status: LeafStatus::Failure,
                ..
            } => self.failures = self.failures.saturating_add(1),
            StepOutcome::Executed {
                status: LeafStatus::Success,
                ..
            } => self.failures = 0,
            StepOutcome::NoAction | StepOutcome::Stalled { .. } => {}
        }
        Ok(report)
    }

    /// Tick until stopped, a leaf fails terminally, or the tick limit is hit.
    #[instrument(skip_all)]
    pub fn run<F: FnMut(&StepReport)>(&mut self, mut on_tick: F) -> LoopOutcome {
        info!(
            patches = self.world.patch_count(),
            interval_ms = self.config.tick_interval.as_millis(),
            "control loop starting"
        );
        loop {
            if self.stop.is_stopped() {
                return self.finish(LoopStop::Stopped);
            }
            if let Some(max_ticks) = self.config.max_ticks.filter(|max| self.ticks >= *max) {
                return self.finish(LoopStop::MaxTicks { max_ticks });
            }

            let tick_started = Instant::now();
            match self.tick() {
                Ok(report) => on_tick(&report),
                Err(err) => {
                    warn!(leaf = %err.leaf, reason = %err.reason, "terminal leaf condition");
                    return self.finish(LoopStop::Terminal {
                        leaf: err.leaf,
                        reason: err.reason,
                    });
                }
            }

            let delay = backoff_delay(
                self.config.tick_interval,
                self.failures,
                self.config.backoff_max,
            );
            self.sleep(delay.saturating_sub(tick_started.elapsed()));
        }
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline || self.stop.is_stopped() {
                return;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }

    fn finish(&self, stop: LoopStop) -> LoopOutcome {
        let outcome = LoopOutcome {
            ticks: self.ticks,
            gained_points: self.world.gained_points(),
            stop,
        };
        info!(
            ticks = outcome.ticks,
            gained = outcome.gained_points,
            stop = ?outcome.stop,
            "control loop stopped"
        );
        outcome
    }
}
