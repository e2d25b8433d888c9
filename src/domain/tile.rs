//! Tile kinds and their properties.
//! Properties are queried via methods, not stored as flags,
//! so tile semantics are centralized here.

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tile {
    #[default]
    Empty,
    Solid,
    Goal, // Level exit, passable
    Door, // Decision point, passable
}

impl Tile {
    /// Does this tile stop movement? Only solid tiles do.
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Solid)
    }

    pub fn is_door(self) -> bool {
        matches!(self, Tile::Door)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }

    /// Single-character code used in snapshot rows.
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Solid => '#',
            Tile::Goal  => 'G',
            Tile::Door  => 'D',
        }
    }

    /// Inverse of `glyph`. Unknown characters read as empty.
    pub fn from_glyph(c: char) -> Tile {
        match c {
            '#' => Tile::Solid,
            'G' => Tile::Goal,
            'D' => Tile::Door,
            _   => Tile::Empty,
        }
    }
}
