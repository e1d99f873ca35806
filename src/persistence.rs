//! Save file format and storage backends.
//!
//! A saved game is a single JSON document:
//!
//! ```json
//! {
//!   "turn": "x",
//!   "darkPlayerKind": 0,
//!   "lightPlayerKind": 1,
//!   "board": [{ "coordinate": { "x": 3, "y": 3 }, "side": "o" }]
//! }
//! ```
//!
//! `"x"` is dark, `"o"` is light, `null` turn means the game is over and
//! player kinds are `0` (manual) or `1` (computer).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::Board;
use crate::error::{DecodeError, PersistenceError};
use crate::game::{Game, Players};
use crate::types::{PlacedDisc, PlayerKind, Side};

/// On-disk representation of a [`Game`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub turn: Option<Side>,
    pub dark_player_kind: PlayerKind,
    pub light_player_kind: PlayerKind,
    pub board: Vec<PlacedDisc>,
}

impl From<&Game> for SavedGame {
    fn from(game: &Game) -> Self {
        let players = game.players();
        SavedGame {
            turn: game.turn(),
            dark_player_kind: players.kind(Side::Dark),
            light_player_kind: players.kind(Side::Light),
            board: game.board().discs().collect(),
        }
    }
}

/// Rebuilds a game, rejecting positions no sequence of moves could produce:
/// discs off the grid, two discs on one cell, or a turn that cannot be
/// played (or a finished game that still has placements).
impl TryFrom<SavedGame> for Game {
    type Error = DecodeError;

    fn try_from(saved: SavedGame) -> Result<Self, Self::Error> {
        let mut cells = BTreeMap::new();
        for PlacedDisc { coordinate, side } in saved.board {
            if !coordinate.is_on_board() {
                return Err(DecodeError::OffBoard(coordinate));
            }
            if cells.insert(coordinate, side).is_some() {
                return Err(DecodeError::DuplicateCoordinate(coordinate));
            }
        }

        let game = Game::from_parts(
            saved.turn,
            Players::new(saved.dark_player_kind, saved.light_player_kind),
            Board::from_discs(cells),
        );
        let consistent = match game.turn() {
            Some(side) => !game.placeable_coordinates(side).is_empty(),
            None => game.is_game_over(),
        };
        if !consistent {
            return Err(DecodeError::InconsistentTurn(game.turn()));
        }
        Ok(game)
    }
}

pub fn encode(game: &Game) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(&SavedGame::from(game)).map_err(PersistenceError::Encode)
}

pub fn decode(data: &[u8]) -> Result<Game, PersistenceError> {
    let saved: SavedGame = serde_json::from_slice(data).map_err(PersistenceError::Decode)?;
    Game::try_from(saved).map_err(PersistenceError::Invalid)
}

/// Byte storage for one saved game.
pub trait GameRepository {
    fn save(&self, data: &[u8]) -> Result<(), PersistenceError>;

    fn load(&self) -> Result<Vec<u8>, PersistenceError>;
}

pub fn save<R>(repository: &R, game: &Game) -> Result<(), PersistenceError>
where
    R: GameRepository + ?Sized,
{
    repository.save(&encode(game)?)
}

pub fn load<R>(repository: &R) -> Result<Game, PersistenceError>
where
    R: GameRepository + ?Sized,
{
    decode(&repository.load()?)
}

/// Loads the saved game, falling back to a fresh one on any failure.
pub fn load_or_new<R>(repository: &R) -> Game
where
    R: GameRepository + ?Sized,
{
    match load(repository) {
        Ok(game) => {
            info!(turn = ?game.turn(), "saved game loaded");
            game
        }
        Err(err) => {
            warn!(%err, "could not load saved game, starting a new one");
            Game::new()
        }
    }
}

/// Stores the game in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the save file. Paths without a file name (`""`, `".."`)
    /// cannot be saved to.
    fn temp_path(&self) -> io::Result<PathBuf> {
        let Some(name) = self.path.file_name() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "save path has no file name",
            ));
        };
        let mut name = name.to_os_string();
        name.push(".tmp");
        Ok(self.path.with_file_name(name))
    }
}

impl GameRepository for FileRepository {
    fn save(&self, data: &[u8]) -> Result<(), PersistenceError> {
        let temp = self.temp_path().map_err(PersistenceError::Write)?;
        fs::write(&temp, data).map_err(PersistenceError::Write)?;
        fs::rename(&temp, &self.path).map_err(PersistenceError::Write)
    }

    fn load(&self) -> Result<Vec<u8>, PersistenceError> {
        fs::read(&self.path).map_err(PersistenceError::Read)
    }
}

/// In-process storage, used by hosts that keep the bytes themselves.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(Some(data.into())),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GameRepository for MemoryRepository {
    fn save(&self, data: &[u8]) -> Result<(), PersistenceError> {
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.to_vec());
        Ok(())
    }

    fn load(&self) -> Result<Vec<u8>, PersistenceError> {
        self.contents().ok_or_else(|| {
            PersistenceError::Read(io::Error::new(io::ErrorKind::NotFound, "no saved game"))
        })
    }
}
