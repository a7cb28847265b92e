//! # Entity Model
//!
//! The [`Character`] struct represents every inhabitant of the dungeon:
//! the hero, merchants, monsters, and mimics. All of them share one
//! shape; behavior differences live in the encounter engine.

use crate::{config, CrawlError, CrawlResult, Direction, Position};
use serde::{Deserialize, Serialize};

/// What a character is, which decides how the engine treats a shared
/// room. A mimic counts as harmless treasure until it reveals itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterKind {
    Hero,
    Merchant,
    Monster,
    Mimic,
}

impl CharacterKind {
    /// Integer tag used by the save format.
    pub fn to_index(self) -> u32 {
        match self {
            CharacterKind::Hero => 0,
            CharacterKind::Merchant => 1,
            CharacterKind::Monster => 2,
            CharacterKind::Mimic => 3,
        }
    }

    /// Reverse of [`to_index`](Self::to_index); `None` for unknown tags.
    pub fn from_index(index: u32) -> Option<CharacterKind> {
        match index {
            0 => Some(CharacterKind::Hero),
            1 => Some(CharacterKind::Merchant),
            2 => Some(CharacterKind::Monster),
            3 => Some(CharacterKind::Mimic),
            _ => None,
        }
    }
}

/// A single dungeon inhabitant.
///
/// Health never goes negative; every mutation clamps at zero. The
/// position is only ever written through validated setters so that a
/// character can never leave the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    health: i32,
    pub max_damage: i32,
    position: Position,
    pub gold: i32,
    pub kind: CharacterKind,
    pub has_health_potion: bool,
    pub has_strength_potion: bool,
}

impl Character {
    /// Creates a character with explicit stats. Used by the generator
    /// and the save loader.
    pub fn new(
        name: impl Into<String>,
        health: i32,
        kind: CharacterKind,
        max_damage: i32,
        position: Position,
        gold: i32,
        has_health_potion: bool,
        has_strength_potion: bool,
    ) -> Self {
        Self {
            name: name.into(),
            health: health.max(0),
            max_damage,
            position,
            gold,
            kind,
            has_health_potion,
            has_strength_potion,
        }
    }

    /// Creates the hero at the dungeon entrance with starting stats.
    ///
    /// # Examples
    ///
    /// ```
    /// use gloomcrawl::{Character, Position};
    ///
    /// let hero = Character::hero("Adelinde");
    /// assert_eq!(hero.health(), 100);
    /// assert_eq!(hero.position(), Position::entrance());
    /// ```
    pub fn hero(name: impl Into<String>) -> Self {
        Self::new(
            name,
            config::HERO_STARTING_HEALTH,
            CharacterKind::Hero,
            config::HERO_BASE_DAMAGE,
            Position::entrance(),
            0,
            false,
            false,
        )
    }

    /// Creates a merchant with a full potion stock.
    pub fn merchant(ordinal: u32, position: Position) -> Self {
        Self::new(
            format!("Merchant {ordinal}"),
            25,
            CharacterKind::Merchant,
            10,
            position,
            10,
            true,
            true,
        )
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    /// Sets health directly, clamped at zero.
    pub fn set_health(&mut self, health: i32) {
        self.health = health.max(0);
    }

    /// Restores health. There is no upper cap; a lucky hero can sit
    /// above the starting value.
    pub fn heal(&mut self, amount: i32) {
        self.health += amount;
    }

    /// Deals damage, clamping health at zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Moves the character to an arbitrary room, validating bounds.
    ///
    /// An out-of-range coordinate is an engine bug (or a corrupt save),
    /// never user error, so it fails loudly instead of clamping.
    pub fn set_position(&mut self, position: Position, dungeon_size: u32) -> CrawlResult<()> {
        if position.x >= dungeon_size || position.y >= dungeon_size {
            return Err(CrawlError::InvariantViolation(format!(
                "coordinate ({}) outside dungeon of size {}",
                position, dungeon_size
            )));
        }
        self.position = position;
        Ok(())
    }

    /// True once health has reached zero.
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// True when the character stands on the exit room.
    pub fn has_escaped(&self, dungeon_size: u32) -> bool {
        self.position == Position::exit(dungeon_size)
    }

    /// The toll every turn takes on the hero.
    pub fn apply_turn_health_decay(&mut self) {
        self.take_damage(config::TURN_HEALTH_DECAY);
    }

    /// Attempts one step in the given direction.
    ///
    /// Steps off the grid edge are rejected without touching the
    /// position; a legal step mutates it and returns `true`.
    pub fn try_step(&mut self, direction: Direction, dungeon_size: u32) -> bool {
        let edge = dungeon_size - 1;
        match direction {
            Direction::North if self.position.y != 0 => self.position.y -= 1,
            Direction::South if self.position.y != edge => self.position.y += 1,
            Direction::East if self.position.x != edge => self.position.x += 1,
            Direction::West if self.position.x != 0 => self.position.x -= 1,
            _ => return false,
        }
        true
    }

    /// A mimic caught in a bad mood, or a merchant pushed too far:
    /// from here on the engine treats this character as a monster.
    pub fn turn_hostile(&mut self) {
        self.kind = CharacterKind::Monster;
    }

    /// Status line used by the roster listing.
    pub fn status_line(&self) -> String {
        format!(
            "{} at {} with {} health and {} gold",
            self.name, self.position, self.health, self.gold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hero_starting_stats() {
        let hero = Character::hero("Tester");
        assert_eq!(hero.health(), 100);
        assert_eq!(hero.max_damage, 25);
        assert_eq!(hero.gold, 0);
        assert_eq!(hero.kind, CharacterKind::Hero);
        assert!(!hero.has_health_potion);
        assert!(!hero.has_strength_potion);
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut hero = Character::hero("Tester");
        hero.set_health(1);
        hero.apply_turn_health_decay();
        assert_eq!(hero.health(), 0);
        assert!(hero.is_dead());
        hero.apply_turn_health_decay();
        assert_eq!(hero.health(), 0);
    }

    #[test]
    fn test_step_rejected_at_edges() {
        let size = 6;
        let mut hero = Character::hero("Tester");

        // At the entrance both north and west lead off the grid.
        assert!(!hero.try_step(Direction::North, size));
        assert!(!hero.try_step(Direction::West, size));
        assert_eq!(hero.position(), Position::entrance());

        // Southern edge: y == size - 1 rejects further south steps.
        hero.set_position(Position::new(4, 5), size).unwrap();
        assert!(!hero.try_step(Direction::South, size));
        assert_eq!(hero.position(), Position::new(4, 5));
        assert!(hero.try_step(Direction::North, size));
        assert_eq!(hero.position(), Position::new(4, 4));
    }

    #[test]
    fn test_set_position_rejects_out_of_bounds() {
        let mut hero = Character::hero("Tester");
        assert!(hero.set_position(Position::new(6, 0), 6).is_err());
        assert!(hero.set_position(Position::new(0, 9), 6).is_err());
        // Rejected writes must not move the character.
        assert_eq!(hero.position(), Position::entrance());
        assert!(hero.set_position(Position::new(5, 5), 6).is_ok());
    }

    #[test]
    fn test_kind_index_round_trip() {
        for kind in [
            CharacterKind::Hero,
            CharacterKind::Merchant,
            CharacterKind::Monster,
            CharacterKind::Mimic,
        ] {
            assert_eq!(CharacterKind::from_index(kind.to_index()), Some(kind));
        }
        assert_eq!(CharacterKind::from_index(7), None);
    }

    proptest! {
        /// A legal step moves exactly one unit along one axis and never
        /// leaves the grid; an illegal one changes nothing.
        #[test]
        fn prop_step_stays_in_bounds(
            size in 6u32..=9,
            x in 0u32..9,
            y in 0u32..9,
            dir_index in 0usize..4,
        ) {
            prop_assume!(x < size && y < size);
            let mut character = Character::hero("Prop");
            character.set_position(Position::new(x, y), size).unwrap();
            let before = character.position();
            let direction = Direction::all()[dir_index];

            let moved = character.try_step(direction, size);
            let after = character.position();

            prop_assert!(after.x < size && after.y < size);
            if moved {
                prop_assert!(before.is_cardinally_adjacent(after));
            } else {
                prop_assert_eq!(before, after);
            }
        }

        /// Health decay never produces a negative value.
        #[test]
        fn prop_decay_never_negative(health in 0i32..200, rounds in 0usize..200) {
            let mut character = Character::hero("Prop");
            character.set_health(health);
            for _ in 0..rounds {
                character.apply_turn_health_decay();
            }
            prop_assert!(character.health() >= 0);
        }
    }
}
