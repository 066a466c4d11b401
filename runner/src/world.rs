//! World model: the control loop's belief about the farm.
//!
//! Values sampled from the environment at the top of a tick live in one
//! [`Observation`] that is replaced whole, so points, inventory counters and
//! the patch set are always read as a consistent set. Event-driven scalars
//! (`last_patch`, `final_round`, `last_tick`) are written only by the event
//! ingestor; the layout, planting flag and cooldown only by leaves after an
//! action completes.
//!
//! Everything outside this crate gets getters only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::core::counters::has_enough_water;
use crate::core::layout::clamp_patch_count;
use crate::core::patch::{Patch, PatchSet, PatchState};
use crate::core::timer::Timer;
use crate::core::types::{ItemId, Tile};

/// Environment sample taken once per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Minigame points; `None` while the counter is not visible (outside the farm).
    pub points: Option<u32>,
    pub seed: Option<ItemId>,
    pub water: u32,
    /// Water the held cans carry when full.
    pub water_capacity: u32,
    pub fruit: u32,
    pub patches: PatchSet,
}

#[derive(Debug, Clone)]
pub struct WorldModel {
    patch_count: usize,
    observation: Arc<Observation>,
    layout: Option<Arc<[Tile]>>,
    last_patch: Option<Patch>,
    final_round: bool,
    last_tick: Option<Instant>,
    planting: bool,
    last_points: Option<u32>,
    start_points: Option<u32>,
    gained_points: u32,
    cooldown: Timer,
}

impl WorldModel {
    pub fn new(patch_count: usize) -> Self {
        Self {
            patch_count: clamp_patch_count(patch_count),
            observation: Arc::default(),
            layout: None,
            last_patch: None,
            final_round: false,
            last_tick: None,
            planting: false,
            last_points: None,
            start_points: None,
            gained_points: 0,
            cooldown: Timer::elapsed_now(),
        }
    }

    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    /// Latest consistent environment sample.
    pub fn observation(&self) -> Arc<Observation> {
        Arc::clone(&self.observation)
    }

    pub fn points(&self) -> Option<u32> {
        self.observation.points
    }

    /// Inside the minigame area (points counter readable).
    pub fn in_game(&self) -> bool {
        self.observation.points.is_some()
    }

    pub fn seed(&self) -> Option<ItemId> {
        self.observation.seed
    }

    pub fn has_seeds(&self) -> bool {
        self.observation.seed.is_some()
    }

    pub fn water_count(&self) -> u32 {
        self.observation.water
    }

    /// Some held can is not full.
    pub fn can_refill(&self) -> bool {
        self.observation.water < self.observation.water_capacity
    }

    pub fn has_enough_water(&self) -> bool {
        has_enough_water(self.observation.water, self.patch_count)
    }

    pub fn fruit_count(&self) -> u32 {
        self.observation.fruit
    }

    pub fn patches(&self) -> &PatchSet {
        &self.observation.patches
    }

    pub fn layout(&self) -> Option<&[Tile]> {
        self.layout.as_deref()
    }

    pub fn last_patch(&self) -> Option<&Patch> {
        self.last_patch.as_ref()
    }

    pub fn final_round(&self) -> bool {
        self.final_round
    }

    pub fn last_tick(&self) -> Option<Instant> {
        self.last_tick
    }

    pub fn planting(&self) -> bool {
        self.planting
    }

    pub fn start_points(&self) -> Option<u32> {
        self.start_points
    }

    pub fn gained_points(&self) -> u32 {
        self.gained_points
    }

    pub fn cooldown(&self) -> &Timer {
        &self.cooldown
    }

    /// Any patch still carrying a crop.
    pub fn any_growing(&self) -> bool {
        self.observation.patches.any_growing()
    }

    /// A new round may be planted: seeds at hand, not winding down, and either
    /// mid-planting or every patch is clear.
    pub fn can_plant(&self) -> bool {
        self.has_seeds() && !self.final_round && (self.planting || !self.any_growing())
    }

    /// Next patch that needs an action.
    ///
    /// While planting, the patch just planted is watered before moving on.
    /// Otherwise patches are scanned cyclically after the last interacted one;
    /// a fresh round (nothing growing) always starts from index 0.
    pub fn next_patch(&self) -> Option<&Patch> {
        let patches = &self.observation.patches;
        let just_planted = self
            .last_patch
            .as_ref()
            .filter(|_| self.planting)
            .and_then(|last| patches.get(last.index))
            .filter(|current| current.state() == PatchState::Dry);
        if just_planted.is_some() {
            return just_planted;
        }

        let can_plant = self.can_plant();
        let after = if patches.any_growing() {
            self.last_patch.as_ref().map(|patch| patch.index)
        } else {
            None
        };
        patches.cycle_after(after).find(|patch| match patch.state() {
            PatchState::Blighted | PatchState::Grown | PatchState::Dry => true,
            PatchState::Empty => can_plant,
            PatchState::Absent | PatchState::Watered => false,
        })
    }

    /// State of the patch [`next_patch`](Self::next_patch) would pick.
    pub fn next_patch_state(&self) -> Option<PatchState> {
        self.next_patch().map(Patch::state)
    }

    pub(crate) fn commit_observation(&mut self, observation: Observation) {
        if let Some(points) = observation.points {
            if self.start_points.is_none() {
                info!(points, "starting points");
                self.start_points = Some(points);
            }
            match self.last_points {
                Some(previous) if points > previous => {
                    self.gained_points = self.gained_points.saturating_add(points - previous);
                    debug!(gained = self.gained_points, "points increased");
                }
                _ => {}
            }
            self.last_points = Some(points);
        }
        self.observation = Arc::new(observation);
    }

    pub(crate) fn commit_layout(&mut self, tiles: Vec<Tile>) {
        self.layout = Some(tiles.into());
    }

    pub(crate) fn set_last_patch(&mut self, patch: Patch) {
        self.last_patch = Some(patch);
    }

    pub(crate) fn set_final_round(&mut self, final_round: bool) {
        self.final_round = final_round;
    }

    pub(crate) fn record_tick(&mut self, at: Instant) {
        self.last_tick = Some(at);
    }

    pub(crate) fn set_planting(&mut self, planting: bool) {
        self.planting = planting;
    }

    pub(crate) fn reset_cooldown(&mut self, duration: Duration) {
        self.cooldown.reset(duration);
    }
}
