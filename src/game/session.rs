//! # Game Session State
//!
//! [`GameSession`] is the single source of truth for one run: the
//! roster, the turn counters, the settings, and the handful of flags
//! the encounter engine steers by. It is plain data with accessors;
//! all rule logic lives in [`crate::GameEngine`].

use crate::{Character, CharacterKind, DisplayState, Language};
use serde::{Deserialize, Serialize};

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The hero reached the exit corner.
    Escaped,
    /// The hero's health hit zero.
    Dead,
}

/// All mutable state of one play session.
///
/// The hero is always `roster[0]`; everything else in the roster is a
/// merchant, monster, or mimic. There are no globals; the engine
/// receives the session explicitly on every operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Side length of the square grid.
    pub dungeon_size: u32,
    /// Every character in the dungeon, hero first.
    roster: Vec<Character>,
    /// Number of successful hero moves so far.
    pub turn_counter: u32,
    /// Turns the current strength boost has been running.
    pub potion_turn_counter: u32,
    /// Whether either side may retreat from combat.
    pub can_retreat: bool,
    /// Presentation language; the engine only stores it.
    pub language: Language,
    /// Roster index of the character sharing the hero's room.
    pub room_partner: Option<usize>,

    in_combat: bool,
    in_trade: bool,
    /// The player is picking a save file to restore.
    pub save_loading: bool,
    /// The run has ended; see [`GameSession::outcome`].
    pub outcome: Option<GameOutcome>,
    /// Someone died this command and cleanup has not run yet.
    pub character_died: bool,
}

impl GameSession {
    /// Creates an empty session for the given grid size. The roster is
    /// filled by the generator or the save loader.
    pub fn new(dungeon_size: u32) -> Self {
        Self {
            dungeon_size,
            roster: Vec::new(),
            turn_counter: 0,
            potion_turn_counter: 0,
            can_retreat: true,
            language: Language::default(),
            room_partner: None,
            in_combat: false,
            in_trade: false,
            save_loading: false,
            outcome: None,
            character_died: false,
        }
    }

    /// Read-only view of the roster for the presentation layer.
    pub fn roster(&self) -> &[Character] {
        &self.roster
    }

    pub(crate) fn roster_mut(&mut self) -> &mut Vec<Character> {
        &mut self.roster
    }

    /// Adds a character to the back of the roster.
    pub fn push_character(&mut self, character: Character) {
        self.roster.push(character);
    }

    /// Replaces the whole roster. Used by the save loader after a
    /// successful parse; the hero-first ordering comes from the file.
    pub fn replace_roster(&mut self, roster: Vec<Character>) {
        self.roster = roster;
    }

    /// The hero. Panics only if the roster is empty, which initialize
    /// and load both rule out.
    pub fn hero(&self) -> &Character {
        &self.roster[0]
    }

    pub fn hero_mut(&mut self) -> &mut Character {
        &mut self.roster[0]
    }

    /// True once a hero has been placed at roster index 0.
    pub fn has_hero(&self) -> bool {
        self.roster
            .first()
            .map(|c| c.kind == CharacterKind::Hero)
            .unwrap_or(false)
    }

    /// Whether the hero is currently locked in combat.
    ///
    /// Derived guard: with no room partner there is nobody to fight, so
    /// the flag reads false regardless of what was last stored.
    pub fn in_combat(&self) -> bool {
        self.room_partner.is_some() && self.in_combat
    }

    /// Whether the hero is at a merchant's trade menu. Same derived
    /// guard as [`in_combat`](Self::in_combat).
    pub fn in_trade(&self) -> bool {
        self.room_partner.is_some() && self.in_trade
    }

    pub fn set_in_combat(&mut self, value: bool) {
        self.in_combat = value;
        if value {
            self.in_trade = false;
        }
    }

    pub fn set_in_trade(&mut self, value: bool) {
        self.in_trade = value;
        if value {
            self.in_combat = false;
        }
    }

    /// Scans the roster for a character in the hero's room, updating
    /// [`room_partner`](Self::room_partner). Returns whether one exists.
    pub fn detect_room_partner(&mut self) -> bool {
        let hero_pos = self.hero().position();
        self.room_partner = self
            .roster
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, other)| other.position() == hero_pos)
            .map(|(index, _)| index);
        self.room_partner.is_some()
    }

    /// The character sharing the hero's room, if any.
    pub fn room_partner_character(&self) -> Option<&Character> {
        self.room_partner.and_then(|index| self.roster.get(index))
    }

    /// Number of monsters (and lurking mimics) in cardinally adjacent
    /// rooms; the hero can smell them before seeing them. Merchants
    /// do not count.
    pub fn nearby_monster_count(&self) -> usize {
        let hero_pos = self.hero().position();
        self.roster
            .iter()
            .skip(1)
            .filter(|other| other.kind != CharacterKind::Merchant)
            .filter(|other| hero_pos.is_cardinally_adjacent(other.position()))
            .count()
    }

    /// Snapshot of everything the status panel renders.
    pub fn display_state(&self) -> DisplayState {
        let hero = self.hero();
        DisplayState {
            health: hero.health(),
            max_damage: hero.max_damage,
            position: hero.position(),
            nearby_monster_count: self.nearby_monster_count(),
            turn: self.turn_counter,
            gold: hero.gold,
            has_health_potion: hero.has_health_potion,
            has_strength_potion: hero.has_strength_potion,
        }
    }
}
