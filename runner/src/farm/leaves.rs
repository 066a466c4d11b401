//! Farm actions.
//!
//! Each leaf issues one interaction through the executor, waits for the
//! environment to confirm the effect, and only then commits to the world
//! model. Every failure is transient and reported as [`LeafStatus::Failure`];
//! only [`Finish`] ends the run.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::counters::{fruit_count, held_seed, is_water_can, water_capacity, water_count};
use crate::core::data::{
    CORNER_SEARCH_RADIUS, FACILITY_RADIUS, FARM_DOOR, SACK, SEED_TABLE, SEEDS, SeedKind,
    WATER_BARREL, WATER_CANS, matches_any,
};
use crate::core::layout::{corner_tile, patch_tiles};
use crate::core::patch::{Patch, PatchState};
use crate::core::types::{Entity, ItemId, Locatable, Nameable};
use crate::io::environment::{EntityFilter, Environment};
use crate::io::observe::{read_points, refresh_patches};
use crate::tree::{Leaf, LeafContext, LeafStatus, TerminalError};

fn status(ok: bool) -> LeafStatus {
    if ok {
        LeafStatus::Success
    } else {
        LeafStatus::Failure
    }
}

fn facility<E: Environment + ?Sized>(env: &E, name: &str) -> Option<Entity> {
    env.nearest(&EntityFilter::within(FACILITY_RADIUS).named(name))
}

/// Ends the session once the player is out of the farm after the final round.
#[derive(Debug, Default)]
pub struct Finish;

impl<E: Environment + ?Sized> Leaf<E> for Finish {
    fn name(&self) -> &str {
        "finish"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let gained = ctx.world.gained_points();
        info!(gained, "final round complete");
        Err(TerminalError::new(
            "finish",
            format!("final round complete, gained {gained} points"),
        ))
    }
}

/// Collects seeds of the configured variety from the seed table.
#[derive(Debug)]
pub struct TakeSeeds {
    seed: SeedKind,
    wait: Duration,
}

impl TakeSeeds {
    pub fn new(seed: SeedKind, wait: Duration) -> Self {
        Self { seed, wait }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for TakeSeeds {
    fn name(&self) -> &str {
        "take-seeds"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let table = facility(&*ctx.env, SEED_TABLE);
        if !ctx
            .executor
            .interact(&mut *ctx.env, table.as_ref(), "Search", None, true)
        {
            return Ok(LeafStatus::Failure);
        }
        if !ctx.env.choose_option(self.seed.option()) {
            debug!(seed = ?self.seed, "seed option not offered");
            return Ok(LeafStatus::Failure);
        }
        let env: &E = &*ctx.env;
        let got = ctx
            .executor
            .wait_for(self.wait, || held_seed(&env.inventory(), &SEEDS).is_some());
        if got {
            info!(seed = ?self.seed, "took seeds");
        }
        Ok(status(got))
    }
}

/// Walk through the farm door and wait until the points counter matches
/// `inside`.
fn pass_door<E: Environment + ?Sized>(
    ctx: &mut LeafContext<'_, E>,
    inside: bool,
    wait: Duration,
) -> LeafStatus {
    let door = facility(&*ctx.env, FARM_DOOR);
    if !ctx.executor.interact(&mut *ctx.env, door.as_ref(), "Open", None, false) {
        return LeafStatus::Failure;
    }
    let env: &E = &*ctx.env;
    status(
        ctx.executor
            .wait_for(wait, || read_points(env).is_some() == inside),
    )
}

#[derive(Debug)]
pub struct Enter {
    wait: Duration,
}

impl Enter {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Enter {
    fn name(&self) -> &str {
        "enter"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let status = pass_door(ctx, true, self.wait);
        if status == LeafStatus::Success {
            info!("entered the farm");
        }
        Ok(status)
    }
}

#[derive(Debug)]
pub struct Leave {
    wait: Duration,
}

impl Leave {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Leave {
    fn name(&self) -> &str {
        "leave"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let status = pass_door(ctx, false, self.wait);
        if status == LeafStatus::Success {
            info!(
                gained = ctx.world.gained_points(),
                final_round = ctx.world.final_round(),
                "left the farm"
            );
        }
        Ok(status)
    }
}

/// Locates the patch grid around the player and commits the tile layout.
#[derive(Debug)]
pub struct SetupPatches {
    patch_names: Vec<String>,
}

impl SetupPatches {
    pub fn new(patch_names: Vec<String>) -> Self {
        Self { patch_names }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for SetupPatches {
    fn name(&self) -> &str {
        "setup-patches"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let found = ctx
            .env
            .query_entities(&EntityFilter::within(CORNER_SEARCH_RADIUS))
            .into_iter()
            .filter(|entity| {
                entity
                    .name()
                    .is_some_and(|name| matches_any(name, &self.patch_names))
            })
            .map(|entity| entity.tile());
        let Some(corner) = corner_tile(found) else {
            warn!(
                radius = CORNER_SEARCH_RADIUS,
                "no patch objects nearby; cannot lay out patches"
            );
            return Ok(LeafStatus::Failure);
        };
        let tiles = patch_tiles(corner, ctx.world.patch_count());
        info!(%corner, patches = tiles.len(), "patch layout computed");
        ctx.world.commit_layout(tiles);
        Ok(LeafStatus::Success)
    }
}

/// Empties the fruit into the sack.
#[derive(Debug)]
pub struct Deposit {
    wait: Duration,
}

impl Deposit {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Deposit {
    fn name(&self) -> &str {
        "deposit"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let sack = facility(&*ctx.env, SACK);
        let fruit = ctx.world.fruit_count();
        if !ctx.executor.interact(&mut *ctx.env, sack.as_ref(), "Deposit", None, true) {
            return Ok(LeafStatus::Failure);
        }
        let env: &E = &*ctx.env;
        let emptied = ctx
            .executor
            .wait_for(self.wait, || fruit_count(&env.inventory()) == 0);
        if emptied {
            info!(fruit, "deposited fruit");
        }
        Ok(status(emptied))
    }
}

/// Fills the watering cans at the barrel.
#[derive(Debug)]
pub struct Refill {
    wait: Duration,
}

impl Refill {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Refill {
    fn name(&self) -> &str {
        "refill"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let full = WATER_CANS[WATER_CANS.len() - 1];
        let Some(can) = ctx
            .env
            .inventory()
            .into_iter()
            .find(|item| is_water_can(item.id) && item.id != full)
        else {
            debug!("every can is already full");
            return Ok(LeafStatus::Failure);
        };
        let barrel = facility(&*ctx.env, WATER_BARREL);
        if !ctx
            .executor
            .interact(&mut *ctx.env, barrel.as_ref(), "Use", Some(can.id), false)
        {
            return Ok(LeafStatus::Failure);
        }
        let env: &E = &*ctx.env;
        let filled = ctx.executor.wait_for(self.wait, || {
            let items = env.inventory();
            water_count(&items) == water_capacity(&items)
        });
        if filled {
            info!(water = water_count(&ctx.env.inventory()), "cans refilled");
        }
        Ok(status(filled))
    }
}

/// What a patch leaf does to the next patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tending {
    Clear,
    Harvest,
    Water,
    Plant,
}

impl Tending {
    fn leaf_name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Harvest => "harvest",
            Self::Water => "water",
            Self::Plant => "plant",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Harvest => "Harvest",
            Self::Water | Self::Plant => "Use",
        }
    }

    /// Patch state this action is valid for.
    fn expects(self) -> PatchState {
        match self {
            Self::Clear => PatchState::Blighted,
            Self::Harvest => PatchState::Grown,
            Self::Water => PatchState::Dry,
            Self::Plant => PatchState::Empty,
        }
    }
}

/// Clears, harvests, waters or plants the next patch that needs it.
#[derive(Debug)]
pub struct Tend {
    tending: Tending,
    wait: Duration,
}

impl Tend {
    pub fn new(tending: Tending, wait: Duration) -> Self {
        Self { tending, wait }
    }

    /// Inventory item to use on the patch, or `None` when nothing fits.
    fn item<E: Environment + ?Sized>(&self, ctx: &LeafContext<'_, E>) -> Option<Option<ItemId>> {
        match self.tending {
            Tending::Clear | Tending::Harvest => Some(None),
            Tending::Plant => ctx.world.seed().map(Some),
            Tending::Water => ctx
                .env
                .inventory()
                .into_iter()
                .map(|item| item.id)
                .find(|id| WATER_CANS.contains(id))
                .map(Some),
        }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Tend {
    fn name(&self) -> &str {
        self.tending.leaf_name()
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        let Some(patch) = ctx.world.next_patch().cloned() else {
            return Ok(LeafStatus::Failure);
        };
        if patch.state() != self.tending.expects() {
            return Ok(LeafStatus::Failure);
        }
        let Some(select) = self.item(ctx) else {
            debug!(tending = ?self.tending, "required item missing");
            return Ok(LeafStatus::Failure);
        };

        let before = patch.state();
        let accepted = ctx.executor.interact(
            &mut *ctx.env,
            patch.identity.as_ref(),
            self.tending.action(),
            select,
            true,
        );
        if !accepted {
            return Ok(LeafStatus::Failure);
        }
        let env: &E = &*ctx.env;
        let tile = [patch.tile];
        let changed = ctx.executor.wait_for(self.wait, || {
            refresh_patches(env, &tile)
                .get(0)
                .is_some_and(|current| current.state() != before)
        });
        if !changed {
            debug!(%patch, "patch did not change after interaction");
            return Ok(LeafStatus::Failure);
        }

        info!(%patch, tending = ?self.tending, "tended patch");
        if self.tending == Tending::Plant {
            let more = more_to_plant(ctx.world.patches().iter(), &patch);
            ctx.world.set_planting(more);
        }
        ctx.world.set_last_patch(patch);
        Ok(LeafStatus::Success)
    }
}

/// Another empty patch is waiting once `planted` is done.
fn more_to_plant<'a>(mut patches: impl Iterator<Item = &'a Patch>, planted: &Patch) -> bool {
    patches.any(|patch| patch.index != planted.index && patch.state() == PatchState::Empty)
}

/// Rate-limited heartbeat while the crops grow.
#[derive(Debug)]
pub struct Idle {
    cooldown: Duration,
}

impl Idle {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }
}

impl<E: Environment + ?Sized> Leaf<E> for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn execute(&mut self, ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        info!(
            points = ?ctx.world.points(),
            gained = ctx.world.gained_points(),
            water = ctx.world.water_count(),
            "waiting for crops"
        );
        ctx.world.reset_cooldown(self.cooldown);
        Ok(LeafStatus::Success)
    }
}
