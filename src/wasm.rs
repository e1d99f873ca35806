//! Browser binding.
//!
//! Threads are not available on `wasm32-unknown-unknown`, so the host owns
//! the think delay: it waits while [`WasmGame::is_computer_turn`] holds and
//! then calls [`WasmGame::computer_move`]. Saving is the host's job too;
//! [`WasmGame::save_state`] hands it the JSON document.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

use crate::ai::{DEFAULT_THINK_DELAY, OperationResult, choose_move};
use crate::error::GameError;
use crate::game::{Game, TurnAdvance};
use crate::persistence::{self, SavedGame};
use crate::types::{Coordinate, DiscCount, GameSnapshot, Message, PlayerKind, Side};

/// Everything the page needs to redraw.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameState<'a> {
    snapshot: GameSnapshot,
    message: Message,
    count: DiscCount,
    placeable: Vec<Coordinate>,
    pending_pass: Option<Side>,
    /// Cells flipped by the last placement, placed cell first.
    changed: &'a [Coordinate],
}

#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
    rng: StdRng,
    pending_pass: Option<Side>,
    changed: Vec<Coordinate>,
}

#[wasm_bindgen]
impl WasmGame {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> WasmGame {
        WasmGame {
            game: Game::new(),
            rng: StdRng::seed_from_u64(u64::from(seed)),
            pending_pass: None,
            changed: Vec::new(),
        }
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.game_state())?)
    }

    /// Places a disc for the manual side to move. Returns `false` when the
    /// input is ignored.
    pub fn place(&mut self, x: i32, y: i32) -> Result<bool, JsError> {
        Ok(self.place_manual(Coordinate::new(x, y))?)
    }

    /// Lets the computer side to move play. Returns `false` when it is not
    /// a computer's turn.
    #[wasm_bindgen(js_name = computerMove)]
    pub fn computer_move(&mut self) -> bool {
        self.play_computer().is_some()
    }

    #[wasm_bindgen(js_name = isComputerTurn)]
    pub fn is_computer_turn(&self) -> bool {
        self.computer_side().is_some()
    }

    /// Suggested pause before [`WasmGame::computer_move`], in milliseconds.
    #[wasm_bindgen(js_name = thinkDelayMs)]
    pub fn think_delay_ms() -> u32 {
        u32::try_from(DEFAULT_THINK_DELAY.as_millis()).unwrap_or(u32::MAX)
    }

    /// `side` is 0 (dark) or 1 (light); `kind` is 0 (manual) or 1 (computer).
    #[wasm_bindgen(js_name = changePlayerKind)]
    pub fn change_player_kind(&mut self, side: u8, kind: u8) -> Result<(), JsError> {
        self.set_player_kind(Side::from_index(side)?, PlayerKind::try_from(kind)?);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.game = self.game.reset();
        self.pending_pass = None;
        self.changed.clear();
        info!("game reset");
    }

    #[wasm_bindgen(js_name = confirmPass)]
    pub fn confirm_pass(&mut self) {
        self.pending_pass = None;
    }

    #[wasm_bindgen(js_name = saveState)]
    pub fn save_state(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&SavedGame::from(&self.game))?)
    }

    /// Restores a saved game. Unreadable input starts a new game and
    /// returns `false`.
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&mut self, json: &str) -> bool {
        self.restore(json)
    }
}

impl WasmGame {
    fn game_state(&self) -> GameState<'_> {
        GameState {
            snapshot: self.game.snapshot(),
            message: self.game.message(),
            count: self.game.disc_count(),
            placeable: self
                .game
                .turn()
                .map(|side| self.game.placeable_coordinates(side))
                .unwrap_or_default(),
            pending_pass: self.pending_pass,
            changed: &self.changed,
        }
    }

    /// The side to move, if nothing blocks it from playing.
    fn active_side(&self) -> Option<Side> {
        match self.pending_pass {
            Some(_) => None,
            None => self.game.turn(),
        }
    }

    fn computer_side(&self) -> Option<Side> {
        self.active_side()
            .filter(|&side| self.game.players().kind(side) == PlayerKind::Computer)
    }

    fn place_manual(&mut self, coordinate: Coordinate) -> Result<bool, GameError> {
        let Some(side) = self.active_side() else {
            return Ok(false);
        };
        if self.game.players().kind(side) != PlayerKind::Manual {
            return Ok(false);
        }
        self.apply_placement(side, coordinate)?;
        Ok(true)
    }

    fn play_computer(&mut self) -> Option<OperationResult> {
        let side = self.computer_side()?;
        match choose_move(self.game.board(), side, &mut self.rng) {
            Some(coordinate) => match self.apply_placement(side, coordinate) {
                Ok(()) => Some(OperationResult::Coordinate(coordinate)),
                Err(err) => {
                    warn!(%err, "computer chose an unplaceable coordinate");
                    None
                }
            },
            None => {
                self.changed.clear();
                self.next_turn();
                Some(OperationResult::Pass)
            }
        }
    }

    fn set_player_kind(&mut self, side: Side, kind: PlayerKind) {
        self.game = self.game.change_player(side, kind);
        debug!(%side, ?kind, "player changed");
    }

    fn apply_placement(&mut self, side: Side, coordinate: Coordinate) -> Result<(), GameError> {
        let placement = self.game.place(side, coordinate)?;
        self.game = placement.game;
        self.changed = placement.changed;
        self.next_turn();
        Ok(())
    }

    fn next_turn(&mut self) {
        let (game, advance) = self.game.advance_turn();
        self.game = game;
        if let TurnAdvance::Passed { passed, .. } = advance {
            self.pending_pass = Some(passed);
        }
    }

    fn restore(&mut self, json: &str) -> bool {
        self.pending_pass = None;
        self.changed.clear();
        match persistence::decode(json.as_bytes()) {
            Ok(game) => {
                self.game = game;
                true
            }
            Err(err) => {
                warn!(%err, "could not load saved game, starting a new one");
                self.game = Game::new();
                false
            }
        }
    }
}
