//! Environment abstraction consumed by the control loop.
//!
//! The [`Environment`] trait is the single seam between the decision engine and
//! the game client. Production adapters forward to the client API; tests use
//! `test_support::FakeEnv`, a scripted in-memory farm.

use crate::core::types::{Entity, Item, ItemId, Tile};

/// Filter for entity queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFilter {
    /// Maximum distance from the player, in tiles.
    pub radius: u32,
    /// Exact entity name, if any.
    pub name: Option<String>,
}

impl EntityFilter {
    pub fn within(radius: u32) -> Self {
        Self { radius, name: None }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Query and command surface of the game client.
///
/// Commands return `true` when the client accepted them. A `false` is an
/// ordinary, retryable outcome and never an error.
pub trait Environment {
    fn query_entities(&self, filter: &EntityFilter) -> Vec<Entity>;

    /// True while `entity` is still present at its tile.
    fn exists(&self, entity: &Entity) -> bool;

    fn in_viewport(&self, entity: &Entity) -> bool;

    /// Interact with `entity`. `name` disambiguates menu entries that share an
    /// action; `use_menu` forces the context menu instead of a direct click.
    fn interact(&mut self, entity: &Entity, action: &str, name: Option<&str>, use_menu: bool)
    -> bool;

    fn inventory(&self) -> Vec<Item>;

    /// Currently selected ("used") inventory item, if any.
    fn selected_item(&self) -> Option<ItemId>;

    /// Invoke the item's "Use" action, selecting it.
    fn use_item(&mut self, item: &Item) -> bool;

    /// Plain click on an inventory item.
    fn click_item(&mut self, item: &Item) -> bool;

    /// Pick an option from an open dialogue.
    fn choose_option(&mut self, text: &str) -> bool;

    /// Current movement destination, if walking.
    fn destination(&self) -> Option<Tile>;

    fn player_tile(&self) -> Tile;

    /// True if `tile` is inside the locally loaded, clickable map region.
    fn on_map(&self, tile: Tile) -> bool;

    fn step_to(&mut self, tile: Tile) -> bool;

    /// Walk to `tile` using the path finder.
    fn traverse_path(&mut self, tile: Tile) -> bool;

    fn run_enabled(&self) -> bool;

    /// Run energy, 0..=100.
    fn energy(&self) -> u32;

    fn enable_run(&mut self) -> bool;

    /// Text lines of a widget group, or `None` if it is not open.
    fn widget_texts(&self, widget: u32) -> Option<Vec<String>>;

    /// Offset from scene-local to global coordinates. May change between calls.
    fn map_offset(&self) -> (i32, i32);

    /// Nearest entity matching `filter`.
    fn nearest(&self, filter: &EntityFilter) -> Option<Entity> {
        let player = self.player_tile();
        self.query_entities(filter)
            .into_iter()
            .min_by(|a, b| {
                a.tile
                    .distance_to(player)
                    .total_cmp(&b.tile.distance_to(player))
            })
    }

    /// First inventory slot holding `id`.
    fn find_item(&self, id: ItemId) -> Option<Item> {
        self.inventory().into_iter().find(|item| item.id == id)
    }
}
