use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::error::DecodeError;
use crate::types::{BOARD_SIZE, Coordinate, Direction, PlacedDisc, Side};

const NUM_SQUARES: usize = (BOARD_SIZE * BOARD_SIZE) as usize;
const EMPTY_SYMBOL: char = '-';

/// Every playable coordinate in scan order (row by row, left to right).
static ALL_COORDINATES: Lazy<Vec<Coordinate>> = Lazy::new(|| {
    (0..BOARD_SIZE)
        .flat_map(|y| (0..BOARD_SIZE).map(move |x| Coordinate::new(x, y)))
        .collect()
});

const INITIAL_DISCS: [(Coordinate, Side); 4] = [
    (Coordinate::new(3, 3), Side::Light),
    (Coordinate::new(3, 4), Side::Dark),
    (Coordinate::new(4, 3), Side::Dark),
    (Coordinate::new(4, 4), Side::Light),
];

/// Reversi board as a sparse map from coordinate to disc.
///
/// Boards are values: `place` and `remove_disc` return a new board and leave
/// the receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: BTreeMap<Coordinate, Side>,
}

impl Board {
    /// Creates the initial board:
    /// (3,3)=light, (4,3)=dark, (3,4)=dark, (4,4)=light.
    pub fn new() -> Self {
        Self::from_discs(INITIAL_DISCS)
    }

    pub fn empty() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Builds a board from `(coordinate, side)` pairs. Later pairs overwrite
    /// earlier ones on the same coordinate.
    pub fn from_discs<I>(discs: I) -> Self
    where
        I: IntoIterator<Item = (Coordinate, Side)>,
    {
        Self {
            cells: discs.into_iter().collect(),
        }
    }

    /// All 64 playable coordinates in scan order.
    pub fn all_coordinates() -> &'static [Coordinate] {
        &ALL_COORDINATES
    }

    pub fn disc_at(&self, coordinate: Coordinate) -> Option<Side> {
        self.cells.get(&coordinate).copied()
    }

    /// Occupied cells in scan order.
    pub fn discs(&self) -> impl Iterator<Item = PlacedDisc> + '_ {
        self.cells
            .iter()
            .map(|(&coordinate, &side)| PlacedDisc { coordinate, side })
    }

    pub fn count(&self, side: Side) -> usize {
        self.cells.values().filter(|&&disc| disc == side).count()
    }

    pub fn empty_count(&self) -> usize {
        NUM_SQUARES.saturating_sub(self.cells.len())
    }

    /// The side holding strictly more discs, `None` on a tie.
    pub fn winner(&self) -> Option<Side> {
        let dark = self.count(Side::Dark);
        let light = self.count(Side::Light);
        match dark.cmp(&light) {
            std::cmp::Ordering::Greater => Some(Side::Dark),
            std::cmp::Ordering::Less => Some(Side::Light),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Returns a board with `coordinate` set to `side`, overwriting any
    /// existing disc. Legality is not checked here.
    pub fn place(&self, side: Side, coordinate: Coordinate) -> Board {
        let mut cells = self.cells.clone();
        cells.insert(coordinate, side);
        Board { cells }
    }

    /// Same as [`Board::place`] for several coordinates at once.
    pub fn place_all(&self, side: Side, coordinates: &[Coordinate]) -> Board {
        let mut cells = self.cells.clone();
        cells.extend(coordinates.iter().map(|&coordinate| (coordinate, side)));
        Board { cells }
    }

    pub fn remove_disc(&self, coordinate: Coordinate) -> Board {
        let mut cells = self.cells.clone();
        cells.remove(&coordinate);
        Board { cells }
    }

    /// Coordinates of the opponent discs captured by placing `side` at
    /// `coordinate`, direction by direction in scan order and nearest first
    /// within a direction.
    ///
    /// An empty result means the placement is illegal: the cell is occupied,
    /// off the board, or brackets nothing.
    pub fn coordinates_of_discs_to_be_acquired(
        &self,
        side: Side,
        coordinate: Coordinate,
    ) -> Vec<Coordinate> {
        if !coordinate.is_on_board() || self.disc_at(coordinate).is_some() {
            return Vec::new();
        }

        Direction::ALL
            .iter()
            .flat_map(|&direction| self.acquirable_in_direction(side, coordinate, direction))
            .collect()
    }

    pub fn is_placeable(&self, side: Side, coordinate: Coordinate) -> bool {
        !self
            .coordinates_of_discs_to_be_acquired(side, coordinate)
            .is_empty()
    }

    /// Legal placements for `side` in scan order.
    pub fn placeable_coordinates(&self, side: Side) -> Vec<Coordinate> {
        Self::all_coordinates()
            .iter()
            .copied()
            .filter(|&coordinate| self.is_placeable(side, coordinate))
            .collect()
    }

    fn acquirable_in_direction(
        &self,
        side: Side,
        origin: Coordinate,
        direction: Direction,
    ) -> Vec<Coordinate> {
        let mut line = Vec::new();
        let mut next = origin.adjacent(direction);

        while next.is_on_board() {
            match self.disc_at(next) {
                Some(disc) if disc == side => return line,
                Some(_) => line.push(next),
                None => break,
            }
            next = next.adjacent(direction);
        }

        Vec::new()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Eight rows of `x` (dark), `o` (light) and `-` (empty).
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let symbol = self
                    .disc_at(Coordinate::new(x, y))
                    .map_or(EMPTY_SYMBOL, Side::symbol);
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if symbols.len() != NUM_SQUARES {
            return Err(DecodeError::InvalidShape(symbols.len()));
        }

        let mut cells = BTreeMap::new();
        for (&coordinate, &symbol) in Self::all_coordinates().iter().zip(symbols.iter()) {
            if symbol == EMPTY_SYMBOL {
                continue;
            }
            cells.insert(coordinate, Side::from_symbol(symbol)?);
        }

        Ok(Board { cells })
    }
}
