//! Move selection for computer-controlled sides.

mod computer;
mod random;

pub use computer::{ComputerPlayer, DEFAULT_THINK_DELAY, OperationResult, ThinkTask};
pub use random::{RandomMoveSelector, choose_move};

use crate::board::Board;
use crate::types::{Coordinate, Side};

/// Picks a placement for `side`, or `None` when it has to pass.
pub trait MoveSelector: Send + Sync {
    fn select_move(&self, board: &Board, side: Side) -> Option<Coordinate>;
}

/// Always plays the first placeable coordinate in scan order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPlaceableSelector;

impl MoveSelector for FirstPlaceableSelector {
    fn select_move(&self, board: &Board, side: Side) -> Option<Coordinate> {
        board.placeable_coordinates(side).first().copied()
    }
}
