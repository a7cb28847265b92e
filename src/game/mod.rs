//! # Game Module
//!
//! Core game state, the entity model, and the encounter engine.
//!
//! This module contains the fundamental building blocks of Gloomcrawl:
//! - Grid positions and cardinal directions
//! - The character entity model
//! - Session state (roster, flags, settings)
//! - The encounter engine driving one turn of work per command

pub mod engine;
pub mod entities;
pub mod events;
pub mod session;

pub use engine::*;
pub use entities::*;
pub use events::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// A room coordinate on the square dungeon grid.
///
/// Coordinates are 0-indexed and always bounded by the dungeon size;
/// the entrance is `(0, 0)` and the exit is `(size - 1, size - 1)`.
///
/// # Examples
///
/// ```
/// use gloomcrawl::Position;
///
/// let pos = Position::new(2, 3);
/// assert!(pos.is_cardinally_adjacent(Position::new(2, 4)));
/// assert!(!pos.is_cardinally_adjacent(Position::new(3, 4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the dungeon entrance, `(0, 0)`.
    pub fn entrance() -> Self {
        Self::new(0, 0)
    }

    /// Returns the dungeon exit for a grid of the given size.
    pub fn exit(dungeon_size: u32) -> Self {
        Self::new(dungeon_size - 1, dungeon_size - 1)
    }

    /// True when `other` shares an edge with this room (no diagonals).
    pub fn is_cardinally_adjacent(self, other: Position) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Returns all four directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}

/// Presentation language. Stored on the session so the front end can
/// render events and accept synonyms in the player's language; the
/// engine itself is language-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    German,
}

impl Language {
    /// Parses a language name, case-insensitively.
    ///
    /// Returns `None` for unsupported languages; callers fall back to
    /// the default and surface a notice rather than failing.
    pub fn parse(name: &str) -> Option<Language> {
        match name.to_lowercase().as_str() {
            "english" => Some(Language::English),
            "german" | "deutsch" => Some(Language::German),
            _ => None,
        }
    }

    /// The other supported language.
    pub fn toggled(self) -> Language {
        match self {
            Language::English => Language::German,
            Language::German => Language::English,
        }
    }
}

/// The two potion kinds a merchant sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotionKind {
    Health,
    Strength,
}
