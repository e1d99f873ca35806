use std::io;

use crate::types::{Coordinate, Side};

/// Rule violations reported by the game.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// The placement would not capture anything, or the cell is occupied.
    #[error("cannot place a {side} disc at {coordinate}")]
    PlacementRejected { side: Side, coordinate: Coordinate },
}

/// Malformed values coming from outside the engine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown side id: {0}")]
    UnknownSide(u8),

    #[error("unknown player kind id: {0}")]
    UnknownPlayerKind(u8),

    #[error("invalid disc symbol: {0:?}")]
    InvalidSymbol(char),

    #[error("board diagram must have 8 rows of 8 cells, found {0} cells")]
    InvalidShape(usize),

    #[error("disc outside the board at {0}")]
    OffBoard(Coordinate),

    #[error("more than one disc at {0}")]
    DuplicateCoordinate(Coordinate),

    /// The side to move has no placement, or a finished game still has one.
    #[error("turn {0:?} does not match the board")]
    InconsistentTurn(Option<Side>),
}

/// Failures at the save/load boundary.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read saved game: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write saved game: {0}")]
    Write(#[source] io::Error),

    #[error("failed to encode game: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("saved game is malformed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("saved game is not a reachable position: {0}")]
    Invalid(#[source] DecodeError),
}
