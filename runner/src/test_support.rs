//! Test-only helpers: an in-memory farm, scripted leaves and temp config dirs.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use crate::core::data::{
    EMPTY_PATCH_NAME, EMPTY_WATER_CAN, FARM_DOOR, FRUITS, POINTS_WIDGET, SACK, SEED_TABLE, SEEDS,
    SeedKind, WATER_BARREL, WATER_CANS,
};
use crate::core::counters::is_water_can;
use crate::core::patch::PatchState;
use crate::core::types::{Entity, EntityId, Item, ItemId, Nameable, Tile};
use crate::io::config::{BotConfig, CONFIG_FILE, write_config};
use crate::io::environment::{EntityFilter, Environment};
use crate::io::events::{EventSender, WorldEvent};
use crate::io::executor::{ActionExecutor, DEFAULT_PROXIMITY, ExecutorConfig};
use crate::io::wait::WaitConfig;
use crate::tree::{Leaf, LeafContext, LeafStatus, TerminalError};

/// Command recorded by [`FakeEnv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Interact {
        action: String,
        name: Option<String>,
        use_menu: bool,
    },
    UseItem(ItemId),
    ClickItem(ItemId),
    ChooseOption(String),
    Step(Tile),
    Traverse(Tile),
    EnableRun,
}

#[derive(Debug, Clone, Copy)]
struct Crop {
    kind: SeedKind,
    /// 0 seedling, 1-2 plant, 3 grown.
    stage: u8,
    watered: bool,
    blighted: bool,
}

const GROWN_STAGE: u8 = 3;

impl Crop {
    fn name(self) -> String {
        let variety = self.kind.option();
        let lower = variety.to_lowercase();
        let form = if self.stage == 0 { "seedling" } else { "plant" };
        if self.blighted {
            format!("Blighted {lower} {form}")
        } else if self.stage >= GROWN_STAGE {
            format!("Grown {lower} plant")
        } else if self.watered {
            format!("Watered {lower} {form}")
        } else {
            format!("{variety} {form}")
        }
    }
}

fn kind_in_name(name: &str) -> Option<SeedKind> {
    let lower = name.to_lowercase();
    [SeedKind::Golovanova, SeedKind::Bologano, SeedKind::Logavano]
        .into_iter()
        .find(|kind| lower.contains(&kind.option().to_lowercase()))
}

fn seed_index(kind: SeedKind) -> usize {
    SEEDS.iter().position(|seed| *seed == kind.seed()).unwrap_or(0)
}

/// Scripted in-memory farm.
///
/// Movement is instant and every accepted command takes effect immediately.
/// Crops only advance when the test calls [`FakeEnv::grow`].
#[derive(Debug)]
pub struct FakeEnv {
    pub player: Tile,
    pub destination: Option<Tile>,
    pub viewport_radius: u32,
    pub map_radius: u32,
    pub selected: Option<ItemId>,
    /// Actions the client refuses.
    pub reject_actions: Vec<String>,
    /// Selection ignores use/click and survives interactions.
    pub sticky_selection: bool,
    pub energy: u32,
    pub run: bool,
    pub map_offset: (i32, i32),
    pub in_game: bool,
    pub points: u32,
    pub points_per_fruit: u32,
    /// Seeds handed out per seed-table visit.
    pub seed_grant: u32,
    /// Unwatered crops blight on [`FakeEnv::grow`].
    pub blight_dry: bool,
    /// Receives an action event for every accepted interaction.
    pub events: Option<EventSender>,
    pub calls: Vec<Call>,
    entities: Vec<Entity>,
    crops: HashMap<EntityId, Crop>,
    items: Vec<ItemId>,
    dialogue_open: bool,
    next_id: u64,
}

impl Default for FakeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEnv {
    pub fn new() -> Self {
        Self {
            player: Tile::new(0, 0, 0),
            destination: None,
            viewport_radius: 15,
            map_radius: 52,
            selected: None,
            reject_actions: Vec::new(),
            sticky_selection: false,
            energy: 100,
            run: false,
            map_offset: (0, 0),
            in_game: false,
            points: 0,
            points_per_fruit: 10,
            seed_grant: 32,
            blight_dry: false,
            events: None,
            calls: Vec::new(),
            entities: Vec::new(),
            crops: HashMap::new(),
            items: Vec::new(),
            dialogue_open: false,
            next_id: 1,
        }
    }

    /// Player outside the farm door, with the seed table, barrel and sack
    /// nearby. No patches.
    pub fn farm() -> Self {
        let mut env = Self::new();
        env.player = Tile::new(1818, 3497, 0);
        env.add_entity(FARM_DOOR, Tile::new(1805, 3497, 0));
        env.add_entity(SEED_TABLE, Tile::new(1806, 3493, 0));
        env.add_entity(WATER_BARREL, Tile::new(1808, 3501, 0));
        env.add_entity(SACK, Tile::new(1808, 3489, 0));
        env
    }

    pub fn add_entity(&mut self, name: &str, tile: Tile) -> Entity {
        let entity = Entity::new(self.next_id, name, tile);
        self.next_id += 1;
        self.entities.push(entity.clone());
        entity
    }

    pub fn remove_entity(&mut self, id: EntityId) {
        self.entities.retain(|entity| entity.id != id);
        self.crops.remove(&id);
    }

    pub fn add_item(&mut self, id: ItemId) {
        self.items.push(id);
    }

    /// Name of the object standing on `tile`.
    pub fn name_at(&self, tile: Tile) -> Option<&str> {
        self.entities
            .iter()
            .find(|entity| entity.tile == tile)
            .and_then(Nameable::name)
    }

    /// Advance every watered crop one stage. Unwatered crops blight when
    /// `blight_dry` is set, otherwise they wait.
    pub fn grow(&mut self) {
        let ids: Vec<EntityId> = self.crops.keys().copied().collect();
        for id in ids {
            let Some(crop) = self.crops.get_mut(&id) else {
                continue;
            };
            if crop.blighted || crop.stage >= GROWN_STAGE {
                continue;
            }
            if crop.watered {
                crop.stage += 1;
                crop.watered = false;
            } else if self.blight_dry {
                crop.blighted = true;
            }
            let name = crop.name();
            self.rename(id, name);
        }
    }

    fn rename(&mut self, id: EntityId, name: String) {
        if let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) {
            entity.raw_name = name;
        }
    }

    fn distance(&self, tile: Tile) -> f64 {
        self.player.distance_to(tile)
    }

    fn remove_item(&mut self, id: ItemId) -> bool {
        match self.items.iter().position(|item| *item == id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn emit(&self, entity: &Entity, action: &str) {
        if let Some(events) = &self.events {
            events.send(WorldEvent::Action {
                opcode: 3,
                x: entity.tile.x - 1 - self.map_offset.0,
                y: entity.tile.y - 1 - self.map_offset.1,
                entity_name: entity.raw_name.clone(),
                interaction: action.to_string(),
            });
        }
    }

    /// Farm rules for an accepted interaction.
    fn apply(&mut self, entity: &Entity, action: &str, held: Option<ItemId>) {
        let state = PatchState::from_name(entity.name());
        match (action, entity.raw_name.as_str()) {
            ("Search", SEED_TABLE) => self.dialogue_open = true,
            ("Open", FARM_DOOR) => self.in_game = !self.in_game,
            ("Deposit", SACK) => {
                let before = self.items.len();
                self.items.retain(|item| !FRUITS.contains(item));
                let fruit = u32::try_from(before - self.items.len()).unwrap_or(u32::MAX);
                self.points += fruit * self.points_per_fruit;
            }
            ("Use", WATER_BARREL) if held.is_some_and(is_water_can) => {
                for item in &mut self.items {
                    if is_water_can(*item) {
                        *item = WATER_CANS[WATER_CANS.len() - 1];
                    }
                }
            }
            ("Use", _) if state == PatchState::Empty => {
                let Some(seed) = held.filter(|id| SEEDS.contains(id)) else {
                    return;
                };
                let Some(kind) = [SeedKind::Golovanova, SeedKind::Bologano, SeedKind::Logavano]
                    .into_iter()
                    .find(|kind| kind.seed() == seed)
                else {
                    return;
                };
                self.remove_item(seed);
                let crop = Crop {
                    kind,
                    stage: 0,
                    watered: false,
                    blighted: false,
                };
                self.crops.insert(entity.id, crop);
                self.rename(entity.id, crop.name());
            }
            ("Use", _) if state == PatchState::Dry => {
                let Some(can) = held.filter(|id| WATER_CANS.contains(id)) else {
                    return;
                };
                if let Some(slot) = self.items.iter_mut().find(|item| **item == can) {
                    *slot = if can == WATER_CANS[0] {
                        EMPTY_WATER_CAN
                    } else {
                        ItemId(can.0 - 1)
                    };
                }
                let name = match self.crops.get_mut(&entity.id) {
                    Some(crop) => {
                        crop.watered = true;
                        crop.name()
                    }
                    None => format!("Watered {}", entity.raw_name.to_lowercase()),
                };
                self.rename(entity.id, name);
            }
            ("Harvest", _) if state == PatchState::Grown => {
                let kind = kind_in_name(&entity.raw_name).unwrap_or_default();
                self.items.push(FRUITS[seed_index(kind)]);
                self.crops.remove(&entity.id);
                self.rename(entity.id, EMPTY_PATCH_NAME.to_string());
            }
            ("Clear", _) if state == PatchState::Blighted => {
                self.crops.remove(&entity.id);
                self.rename(entity.id, EMPTY_PATCH_NAME.to_string());
            }
            _ => {}
        }
    }
}

impl Environment for FakeEnv {
    fn query_entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|entity| self.distance(entity.tile) <= f64::from(filter.radius))
            .filter(|entity| match &filter.name {
                Some(name) => entity.name() == Some(name.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn exists(&self, entity: &Entity) -> bool {
        self.entities
            .iter()
            .any(|current| current.id == entity.id && current.tile == entity.tile)
    }

    fn in_viewport(&self, entity: &Entity) -> bool {
        self.distance(entity.tile) <= f64::from(self.viewport_radius)
    }

    fn interact(
        &mut self,
        entity: &Entity,
        action: &str,
        name: Option<&str>,
        use_menu: bool,
    ) -> bool {
        self.calls.push(Call::Interact {
            action: action.to_string(),
            name: name.map(str::to_string),
            use_menu,
        });
        if self.reject_actions.iter().any(|rejected| rejected == action) {
            return false;
        }
        let Some(current) = self.entities.iter().find(|e| e.id == entity.id).cloned() else {
            return false;
        };
        let held = if self.sticky_selection {
            self.selected
        } else {
            self.selected.take()
        };
        self.emit(&current, action);
        self.apply(&current, action, held);
        true
    }

    fn inventory(&self) -> Vec<Item> {
        self.items
            .iter()
            .enumerate()
            .map(|(slot, id)| Item { id: *id, slot })
            .collect()
    }

    fn selected_item(&self) -> Option<ItemId> {
        self.selected
    }

    fn use_item(&mut self, item: &Item) -> bool {
        self.calls.push(Call::UseItem(item.id));
        if !self.sticky_selection {
            self.selected = Some(item.id);
        }
        true
    }

    fn click_item(&mut self, item: &Item) -> bool {
        self.calls.push(Call::ClickItem(item.id));
        if !self.sticky_selection && self.selected == Some(item.id) {
            self.selected = None;
        }
        true
    }

    fn choose_option(&mut self, text: &str) -> bool {
        self.calls.push(Call::ChooseOption(text.to_string()));
        if !self.dialogue_open {
            return false;
        }
        self.dialogue_open = false;
        let Some(kind) = kind_in_name(text) else {
            return false;
        };
        for _ in 0..self.seed_grant {
            self.items.push(kind.seed());
        }
        true
    }

    fn destination(&self) -> Option<Tile> {
        self.destination
    }

    fn player_tile(&self) -> Tile {
        self.player
    }

    fn on_map(&self, tile: Tile) -> bool {
        self.distance(tile) <= f64::from(self.map_radius)
    }

    fn step_to(&mut self, tile: Tile) -> bool {
        self.calls.push(Call::Step(tile));
        self.player = tile;
        self.destination = None;
        true
    }

    fn traverse_path(&mut self, tile: Tile) -> bool {
        self.calls.push(Call::Traverse(tile));
        self.player = tile;
        self.destination = None;
        true
    }

    fn run_enabled(&self) -> bool {
        self.run
    }

    fn energy(&self) -> u32 {
        self.energy
    }

    fn enable_run(&mut self) -> bool {
        self.calls.push(Call::EnableRun);
        self.run = true;
        true
    }

    fn widget_texts(&self, widget: u32) -> Option<Vec<String>> {
        (widget == POINTS_WIDGET && self.in_game).then(|| {
            vec![
                "Tithe Farm".to_string(),
                format!("Points: {}", self.points),
            ]
        })
    }

    fn map_offset(&self) -> (i32, i32) {
        self.map_offset
    }
}

/// Leaf that records how often it ran and returns a fixed result.
#[derive(Debug)]
pub struct RecordingLeaf {
    name: String,
    result: Result<LeafStatus, TerminalError>,
    runs: Rc<Cell<u32>>,
}

impl RecordingLeaf {
    pub fn new(name: &str, status: LeafStatus) -> (Self, Rc<Cell<u32>>) {
        Self::with_result(name, Ok(status))
    }

    /// Leaf that fails terminally with `reason`.
    pub fn terminal(name: &str, reason: &str) -> (Self, Rc<Cell<u32>>) {
        Self::with_result(name, Err(TerminalError::new(name, reason)))
    }

    fn with_result(
        name: &str,
        result: Result<LeafStatus, TerminalError>,
    ) -> (Self, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let leaf = Self {
            name: name.to_string(),
            result,
            runs: Rc::clone(&runs),
        };
        (leaf, runs)
    }
}

impl<E: Environment + ?Sized> Leaf<E> for RecordingLeaf {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, _ctx: &mut LeafContext<'_, E>) -> Result<LeafStatus, TerminalError> {
        self.runs.set(self.runs.get() + 1);
        self.result.clone()
    }
}

/// Executor with a fixed seed and millisecond waits.
pub fn fast_executor() -> ActionExecutor {
    ActionExecutor::with_rng(
        ExecutorConfig {
            proximity: DEFAULT_PROXIMITY,
            wait: WaitConfig::new(
                Duration::from_millis(50),
                Duration::from_millis(1),
                Duration::from_millis(5),
            ),
        },
        StdRng::seed_from_u64(7),
    )
}

/// Temporary directory holding a config file.
pub struct ConfigDir {
    dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(CONFIG_FILE)
    }

    pub fn write(&self, config: &BotConfig) -> Result<PathBuf> {
        let path = self.config_path();
        write_config(&path, config)?;
        Ok(path)
    }

    pub fn write_raw(&self, contents: &str) -> Result<PathBuf> {
        let path = self.config_path();
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
