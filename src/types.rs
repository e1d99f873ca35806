use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Width and height of the board.
pub const BOARD_SIZE: i32 = 8;

/// A board coordinate. `x` is the column, `y` is the row.
///
/// Coordinates are unbounded values; only the board decides which of them
/// are playable. Ordering is row-major so sorted collections enumerate in
/// scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    pub const fn add(self, other: Coordinate) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// The neighbouring coordinate one step towards `direction`.
    pub const fn adjacent(self, direction: Direction) -> Self {
        self.add(direction.delta())
    }

    pub fn is_on_board(self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::add(self, rhs)
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then_with(|| self.x.cmp(&other.x))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight compass directions, in capture scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    UpperLeft,
    Upper,
    UpperRight,
    Right,
    LowerRight,
    Lower,
    LowerLeft,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::UpperLeft,
        Direction::Upper,
        Direction::UpperRight,
        Direction::Right,
        Direction::LowerRight,
        Direction::Lower,
        Direction::LowerLeft,
        Direction::Left,
    ];

    /// Unit step `(dx, dy)`; `y` grows downwards.
    pub const fn delta(self) -> Coordinate {
        match self {
            Direction::UpperLeft => Coordinate::new(-1, -1),
            Direction::Upper => Coordinate::new(0, -1),
            Direction::UpperRight => Coordinate::new(1, -1),
            Direction::Right => Coordinate::new(1, 0),
            Direction::LowerRight => Coordinate::new(1, 1),
            Direction::Lower => Coordinate::new(0, 1),
            Direction::LowerLeft => Coordinate::new(-1, 1),
            Direction::Left => Coordinate::new(-1, 0),
        }
    }
}

/// One of the two colors. Persisted as `"x"` (dark) and `"o"` (light).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "x")]
    Dark,
    #[serde(rename = "o")]
    Light,
}

/// A disc's visible face is its side.
pub type Disc = Side;

impl Side {
    pub const BOTH: [Side; 2] = [Side::Dark, Side::Light];

    pub const fn flipped(self) -> Self {
        match self {
            Side::Dark => Side::Light,
            Side::Light => Side::Dark,
        }
    }

    /// Color id used across the presentation boundary: 0 = dark, 1 = light.
    pub const fn index(self) -> usize {
        match self {
            Side::Dark => 0,
            Side::Light => 1,
        }
    }

    pub fn from_index(index: u8) -> Result<Self, DecodeError> {
        match index {
            0 => Ok(Side::Dark),
            1 => Ok(Side::Light),
            other => Err(DecodeError::UnknownSide(other)),
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Side::Dark => 'x',
            Side::Light => 'o',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self, DecodeError> {
        match symbol {
            'x' => Ok(Side::Dark),
            'o' => Ok(Side::Light),
            other => Err(DecodeError::InvalidSymbol(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Dark => f.write_str("Dark"),
            Side::Light => f.write_str("Light"),
        }
    }
}

/// Who drives a side. Persisted as its integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerKind {
    #[default]
    Manual = 0,
    Computer = 1,
}

impl From<PlayerKind> for u8 {
    fn from(kind: PlayerKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for PlayerKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerKind::Manual),
            1 => Ok(PlayerKind::Computer),
            other => Err(DecodeError::UnknownPlayerKind(other)),
        }
    }
}

/// Turn or result line shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Message {
    pub side: Option<Side>,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiscCount {
    pub dark: usize,
    pub light: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedDisc {
    pub coordinate: Coordinate,
    pub side: Side,
}

/// Full state pushed to the presentation layer on load and reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub turn: Option<Side>,
    pub dark_player: PlayerKind,
    pub light_player: PlayerKind,
    pub discs: Vec<PlacedDisc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_follows_direction_delta() {
        let origin = Coordinate::new(3, 3);

        assert_eq!(origin.adjacent(Direction::UpperLeft), Coordinate::new(2, 2));
        assert_eq!(origin.adjacent(Direction::Right), Coordinate::new(4, 3));
        assert_eq!(origin.adjacent(Direction::Lower), Coordinate::new(3, 4));
        assert_eq!(
            Coordinate::new(1, 2) + Coordinate::new(3, -4),
            Coordinate::new(4, -2)
        );
    }

    #[test]
    fn directions_are_distinct_unit_steps() {
        for (i, a) in Direction::ALL.iter().enumerate() {
            let d = a.delta();
            assert!(d.x.abs() <= 1 && d.y.abs() <= 1);
            assert_ne!(d, Coordinate::new(0, 0));
            for b in &Direction::ALL[i + 1..] {
                assert_ne!(d, b.delta());
            }
        }
    }

    #[test]
    fn coordinates_sort_row_major() {
        let mut coords = vec![
            Coordinate::new(0, 1),
            Coordinate::new(7, 0),
            Coordinate::new(1, 1),
            Coordinate::new(0, 0),
        ];
        coords.sort();

        assert_eq!(
            coords,
            vec![
                Coordinate::new(0, 0),
                Coordinate::new(7, 0),
                Coordinate::new(0, 1),
                Coordinate::new(1, 1),
            ]
        );
    }

    #[test]
    fn flipping_twice_returns_the_same_side() {
        for side in Side::BOTH {
            assert_ne!(side.flipped(), side);
            assert_eq!(side.flipped().flipped(), side);
        }
    }

    #[test]
    fn side_ids_and_symbols() {
        assert_eq!(Side::from_index(0), Ok(Side::Dark));
        assert_eq!(Side::from_index(1), Ok(Side::Light));
        assert_eq!(Side::from_index(2), Err(DecodeError::UnknownSide(2)));
        assert_eq!(Side::from_symbol('x'), Ok(Side::Dark));
        assert_eq!(Side::from_symbol('o'), Ok(Side::Light));
        assert_eq!(Side::from_symbol('?'), Err(DecodeError::InvalidSymbol('?')));
    }

    #[test]
    fn player_kind_uses_integer_ids() {
        assert_eq!(u8::from(PlayerKind::Manual), 0);
        assert_eq!(u8::from(PlayerKind::Computer), 1);
        assert_eq!(PlayerKind::try_from(1), Ok(PlayerKind::Computer));
        assert_eq!(
            PlayerKind::try_from(9),
            Err(DecodeError::UnknownPlayerKind(9))
        );
        assert_eq!(serde_json::to_string(&PlayerKind::Computer).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Side::Light).unwrap(), "\"o\"");
    }
}
