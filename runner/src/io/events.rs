//! Event ingestion.
//!
//! The game client delivers notifications on its own thread. They are queued on
//! an `mpsc` channel and applied to the [`WorldModel`] by the control thread at
//! the top of every tick, in delivery order. Each handler writes only the field
//! it owns, so applying an event twice leaves the model as applying it once.
//!
//! A bad event is logged and dropped; it never stops delivery of the rest.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::data::matches_any;
use crate::core::types::Tile;
use crate::io::environment::Environment;
use crate::world::WorldModel;

/// Raw opcodes for object interactions (item-on-object, widget-on-object and
/// the five object menu options).
pub const OBJECT_INTERACTION_OPCODES: [u16; 7] = [1, 2, 3, 4, 5, 6, 1001];

/// Toggle id that marks the final round.
pub const FINAL_ROUND_TOGGLE: &str = "lastRound";

/// Notification from the game client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The player issued an interaction. `x`/`y` are scene-local coordinates,
    /// off by one from the object's tile.
    Action {
        opcode: u16,
        x: i32,
        y: i32,
        entity_name: String,
        #[serde(default)]
        interaction: String,
    },
    /// A UI checkbox changed.
    Toggle { id: String, checked: bool },
    /// Chat or game message.
    Message {
        #[serde(default)]
        category: String,
        text: String,
    },
    /// The game advanced one tick.
    Tick,
}

/// Cloneable producer side of the event queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<WorldEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` once the ingestor is gone.
    pub fn send(&self, event: WorldEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer side: applies queued events to the world model.
#[derive(Debug)]
pub struct EventIngestor {
    rx: Receiver<WorldEvent>,
    patch_names: Vec<String>,
}

impl EventIngestor {
    /// Create an ingestor that matches patch objects against `patch_names`.
    pub fn new(patch_names: Vec<String>) -> (EventSender, Self) {
        let (tx, rx) = mpsc::channel();
        (EventSender { tx }, Self { rx, patch_names })
    }

    /// Apply every event queued so far. Never blocks.
    ///
    /// Returns the number of events applied.
    pub fn drain<E: Environment + ?Sized>(&self, world: &mut WorldModel, env: &E) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply(&event, world, env);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Apply one event.
    pub fn apply<E: Environment + ?Sized>(
        &self,
        event: &WorldEvent,
        world: &mut WorldModel,
        env: &E,
    ) {
        match event {
            WorldEvent::Action {
                opcode,
                x,
                y,
                entity_name,
                interaction,
            } => {
                let action = ActionRef {
                    opcode: *opcode,
                    x: *x,
                    y: *y,
                    entity_name,
                    interaction,
                };
                self.on_action(&action, world, env);
            }
            WorldEvent::Toggle { id, checked } => {
                if id == FINAL_ROUND_TOGGLE {
                    info!(checked, "final round toggled");
                    world.set_final_round(*checked);
                } else {
                    debug!(%id, "ignoring toggle");
                }
            }
            WorldEvent::Message { category, text } => {
                info!(%category, %text, "game message");
            }
            WorldEvent::Tick => world.record_tick(Instant::now()),
        }
    }

    fn on_action<E: Environment + ?Sized>(
        &self,
        action: &ActionRef<'_>,
        world: &mut WorldModel,
        env: &E,
    ) {
        let ActionRef {
            opcode,
            x,
            y,
            entity_name,
            interaction,
        } = *action;
        if !OBJECT_INTERACTION_OPCODES.contains(&opcode) {
            return;
        }
        // The offset can move between events, so read it each time.
        let (dx, dy) = env.map_offset();
        let Some(tile) = Tile::new(0, 0, 0)
            .checked_derive(x, y)
            .and_then(|tile| tile.checked_derive(1, 1))
            .and_then(|tile| tile.checked_derive(dx, dy))
        else {
            warn!(x, y, dx, dy, "dropping action event with unrepresentable tile");
            return;
        };
        if !matches_any(entity_name, &self.patch_names) {
            debug!(%entity_name, "action on non-patch object");
            return;
        }
        match world.patches().at(tile).cloned() {
            Some(patch) => {
                info!(%interaction, %patch, "interacted with patch");
                world.set_last_patch(patch);
            }
            None => debug!(%tile, %entity_name, "action tile outside working set"),
        }
    }
}

/// Fields of a [`WorldEvent::Action`], borrowed for handling.
#[derive(Debug, Clone, Copy)]
struct ActionRef<'a> {
    opcode: u16,
    x: i32,
    y: i32,
    entity_name: &'a str,
    interaction: &'a str,
}

/// Parse one JSON-lines event.
pub fn parse_event_line(line: &str) -> Result<WorldEvent> {
    serde_json::from_str(line.trim()).with_context(|| format!("parse event {line:?}"))
}

/// Forward JSON-lines events from `reader` into `sender` on a background thread.
///
/// Blank lines are skipped; lines that fail to parse are logged and dropped.
/// The thread ends at end of input, on a read error, or once the ingestor is
/// dropped. It returns the number of lines dropped.
pub fn spawn_line_feed<R>(reader: R, sender: EventSender) -> JoinHandle<usize>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut dropped = 0;
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(err = %err, "event feed read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_event_line(&line) {
                Ok(event) => {
                    if !sender.send(event) {
                        break;
                    }
                }
                Err(err) => {
                    warn!(err = %format!("{err:#}"), "dropping malformed event");
                    dropped += 1;
                }
            }
        }
        dropped
    })
}
