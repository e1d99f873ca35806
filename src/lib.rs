use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod persistence;
pub mod session;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use config::SessionConfig;
pub use error::{DecodeError, GameError, PersistenceError};
pub use game::{Game, Placement, Players, TurnAdvance};
pub use session::{GameObserver, GameSession};
pub use types::{Coordinate, Direction, Disc, PlayerKind, Side};
pub use wasm::WasmGame;

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
