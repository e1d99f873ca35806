use rand::Rng;
use rand::seq::IndexedRandom;

use crate::ai::MoveSelector;
use crate::board::Board;
use crate::types::{Coordinate, Side};

/// Uniformly random placeable coordinate, `None` when there is none.
pub fn choose_move<R>(board: &Board, side: Side, rng: &mut R) -> Option<Coordinate>
where
    R: Rng + ?Sized,
{
    board.placeable_coordinates(side).choose(rng).copied()
}

/// [`choose_move`] driven by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMoveSelector;

impl MoveSelector for RandomMoveSelector {
    fn select_move(&self, board: &Board, side: Side) -> Option<Coordinate> {
        choose_move(board, side, &mut rand::rng())
    }
}
