use std::fmt;

use serde::{Deserialize, Serialize};

use crate::UnitId;

/// The six piece kinds of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl UnitKind {
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Pawn,
        UnitKind::Knight,
        UnitKind::Bishop,
        UnitKind::Rook,
        UnitKind::Queen,
        UnitKind::King,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnitKind::Pawn => "PAWN",
            UnitKind::Knight => "KNIGHT",
            UnitKind::Bishop => "BISHOP",
            UnitKind::Rook => "ROOK",
            UnitKind::Queen => "QUEEN",
            UnitKind::King => "KING",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    White,
    Black,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("WHITE"),
            Side::Black => f.write_str("BLACK"),
        }
    }
}

/// Board square. Opaque to the evolution engine; it is only handed back to the
/// board collaborator when a capture is finalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: u8,
    pub rank: u8,
}

impl Position {
    #[must_use]
    pub const fn new(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub side: Side,
    pub position: Position,
    pub alive: bool,
}
