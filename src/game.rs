use tracing::debug;

use crate::board::Board;
use crate::error::GameError;
use crate::types::{Coordinate, DiscCount, GameSnapshot, Message, PlayerKind, Side};

const TURN_LABEL: &str = "'s turn";
const WON_LABEL: &str = " won";
const TIED_LABEL: &str = "Tied";

/// Player assignment for both sides. Always complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Players {
    dark: PlayerKind,
    light: PlayerKind,
}

impl Players {
    pub fn new(dark: PlayerKind, light: PlayerKind) -> Self {
        Self { dark, light }
    }

    pub fn kind(&self, side: Side) -> PlayerKind {
        match side {
            Side::Dark => self.dark,
            Side::Light => self.light,
        }
    }

    /// Replaces the player of `side`; the other side keeps its player.
    pub fn change_player(&self, side: Side, kind: PlayerKind) -> Players {
        match side {
            Side::Dark => Players::new(kind, self.light),
            Side::Light => Players::new(self.dark, kind),
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The game after the placement. The turn is not advanced yet.
    pub game: Game,
    /// The placed coordinate followed by every captured one.
    pub changed: Vec<Coordinate>,
}

/// What happened when the turn was handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// `side` has a legal placement and moves next.
    Continue(Side),
    /// `passed` had nothing to place, so `next` moves again.
    Passed { passed: Side, next: Side },
    /// Neither side can place. `winner` is `None` on a tie.
    GameOver { winner: Option<Side> },
}

/// Aggregate game state. `turn == None` means the game is over.
///
/// Every transition returns a new `Game`; the receiver is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    turn: Option<Side>,
    players: Players,
    board: Board,
}

impl Game {
    /// Dark to move on the standard starting board, both sides manual.
    pub fn new() -> Self {
        Self::from_parts(Some(Side::Dark), Players::default(), Board::new())
    }

    pub fn from_parts(turn: Option<Side>, players: Players, board: Board) -> Self {
        Self {
            turn,
            players,
            board,
        }
    }

    pub fn turn(&self) -> Option<Side> {
        self.turn
    }

    pub fn players(&self) -> Players {
        self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn message(&self) -> Message {
        if let Some(side) = self.turn {
            return Message {
                side: Some(side),
                label: TURN_LABEL,
            };
        }
        match self.board.winner() {
            Some(winner) => Message {
                side: Some(winner),
                label: WON_LABEL,
            },
            None => Message {
                side: None,
                label: TIED_LABEL,
            },
        }
    }

    pub fn current_player_kind(&self) -> Option<PlayerKind> {
        self.turn.map(|side| self.players.kind(side))
    }

    pub fn is_game_over(&self) -> bool {
        Side::BOTH
            .iter()
            .all(|&side| self.board.placeable_coordinates(side).is_empty())
    }

    /// A brand new game. Player assignments are not carried over.
    pub fn reset(&self) -> Game {
        Game::new()
    }

    pub fn change_turn(&self, turn: Option<Side>) -> Game {
        Game::from_parts(turn, self.players, self.board.clone())
    }

    pub fn change_player(&self, side: Side, kind: PlayerKind) -> Game {
        Game::from_parts(
            self.turn,
            self.players.change_player(side, kind),
            self.board.clone(),
        )
    }

    pub fn count(&self, side: Side) -> usize {
        self.board.count(side)
    }

    pub fn disc_count(&self) -> DiscCount {
        DiscCount {
            dark: self.count(Side::Dark),
            light: self.count(Side::Light),
        }
    }

    pub fn placeable_coordinates(&self, side: Side) -> Vec<Coordinate> {
        self.board.placeable_coordinates(side)
    }

    pub fn coordinates_of_discs_to_be_acquired(
        &self,
        side: Side,
        coordinate: Coordinate,
    ) -> Vec<Coordinate> {
        self.board
            .coordinates_of_discs_to_be_acquired(side, coordinate)
    }

    /// Places `side` at `coordinate` and flips every captured disc.
    pub fn place(&self, side: Side, coordinate: Coordinate) -> Result<Placement, GameError> {
        let acquired = self
            .board
            .coordinates_of_discs_to_be_acquired(side, coordinate);
        if acquired.is_empty() {
            return Err(GameError::PlacementRejected { side, coordinate });
        }

        let mut changed = Vec::with_capacity(acquired.len() + 1);
        changed.push(coordinate);
        changed.extend(acquired);
        debug!(%side, %coordinate, flipped = changed.len() - 1, "disc placed");

        Ok(Placement {
            game: self.place_discs(side, &changed),
            changed,
        })
    }

    /// Sets every coordinate to `side` without checking legality.
    pub fn place_discs(&self, side: Side, coordinates: &[Coordinate]) -> Game {
        Game::from_parts(
            self.turn,
            self.players,
            self.board.place_all(side, coordinates),
        )
    }

    pub fn remove_disc(&self, coordinate: Coordinate) -> Game {
        Game::from_parts(self.turn, self.players, self.board.remove_disc(coordinate))
    }

    /// Hands the turn to the other side, skipping a side with no legal
    /// placement and ending the game when neither side can place.
    pub fn advance_turn(&self) -> (Game, TurnAdvance) {
        let Some(current) = self.turn else {
            let winner = self.board.winner();
            return (self.clone(), TurnAdvance::GameOver { winner });
        };

        let next = current.flipped();
        if !self.board.placeable_coordinates(next).is_empty() {
            return (self.change_turn(Some(next)), TurnAdvance::Continue(next));
        }

        if !self.board.placeable_coordinates(current).is_empty() {
            debug!(passed = %next, "no placeable coordinates, passing");
            return (
                self.change_turn(Some(current)),
                TurnAdvance::Passed {
                    passed: next,
                    next: current,
                },
            );
        }

        let winner = self.board.winner();
        debug!(?winner, "game over");
        (self.change_turn(None), TurnAdvance::GameOver { winner })
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            turn: self.turn,
            dark_player: self.players.kind(Side::Dark),
            light_player: self.players.kind(Side::Light),
            discs: self.board.discs().collect(),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
