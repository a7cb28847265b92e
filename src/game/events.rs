//! # Game Events
//!
//! Everything the engine wants the player to know is queued as a
//! [`GameEvent`]. The presentation layer drains the queue after each
//! command and renders the events in the session's language; the engine
//! itself never formats user-facing text.

use crate::{Language, PotionKind, Position};
use serde::{Deserialize, Serialize};

/// Which command set a help request should describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelpContext {
    Exploring,
    Combat,
    Trade,
    SaveSelect,
}

/// A single notable thing that happened inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new dungeon has been generated and the run has begun.
    Welcome,
    /// The requested step leads off the grid, or the hero cannot move.
    MoveBlocked,
    /// The hero found loose gold in an empty room.
    GoldFound { amount: i32, position: Position },
    /// The hero walked in on a merchant; the trade menu is open.
    TradeOpened {
        merchant: String,
        sells_health: bool,
        sells_strength: bool,
        price: i32,
    },
    /// A monster took the hero's hit and left rather than fight.
    MonsterFled { name: String },
    /// A monster is backing out of the hero's room.
    MonsterRetreating { name: String, position: Position },
    /// The hero's blow landed.
    HeroHit { target: String, damage: i32 },
    /// The opponent's blow landed on the hero.
    HeroStruck { attacker: String, damage: i32 },
    /// A chest turned out to be just a chest.
    TreasureFound { position: Position, reward: i32 },
    /// A chest turned out to be teeth.
    MimicAttacks { position: Position },
    /// Combat has begun against the named opponent.
    CombatStarted {
        opponent: String,
        opponent_position: Position,
        opponent_health: i32,
        hero_health: i32,
    },
    /// A non-hero character died; its gold goes to the hero.
    CharacterPerished { name: String, gold: i32 },
    /// Retreat is disabled for this session.
    RetreatBlocked,
    /// The hero broke away from combat alive.
    HeroRetreated { health: i32 },
    /// A potion was drunk; `stat` is the resulting health or damage cap.
    PotionDrunk { potion: PotionKind, stat: i32 },
    /// The hero reached for a potion that is not there.
    NoPotion,
    /// The strength boost wore off.
    StrengthExpired { max_damage: i32 },
    /// A purchase went through.
    PotionBought { potion: PotionKind, gold_remaining: i32 },
    /// The merchant has already sold that potion.
    OutOfStock { merchant: String, potion: PotionKind },
    /// The hero already carries one of those.
    AlreadyOwned { potion: PotionKind },
    /// The hero cannot afford the asking price.
    NotEnoughGold { gold: i32, potion: PotionKind },
    /// The hero turned on the merchant; the merchant is now a monster.
    MerchantProvoked { name: String },
    /// The hero walked away from the trade.
    TradeClosed,
    /// The hero is dead and the run is over.
    HeroDied,
    /// The hero reached the exit and the run is over.
    HeroEscaped,
    /// A save file was written.
    SaveCreated { file_name: String },
    /// A save could not be written; the reason is already logged.
    SaveFailed { reason: String },
    /// Saving and loading are unavailable mid-combat or mid-trade.
    SaveUnavailable { in_combat: bool },
    LoadUnavailable { in_combat: bool },
    /// The save menu is open; files are listed 1-indexed.
    SaveListing { files: Vec<String> },
    /// There is nothing to load.
    NoSavesAvailable,
    /// A save file was restored into the session.
    SaveLoaded { file_name: String },
    /// The selection did not name a listed save file.
    InvalidSaveSelection,
    /// The input matched no command in the current state.
    InvalidCommand,
    /// A privileged command from a non-admin player.
    AdminDenied,
    /// Diagnostic: one status line per roster member.
    RosterListing { lines: Vec<String> },
    /// Diagnostic: the current grid size.
    DungeonSizeReport { size: u32 },
    /// Diagnostic: the session flags.
    FlagsReport {
        in_combat: bool,
        in_trade: bool,
        save_loading: bool,
    },
    /// Diagnostic: gold was granted to the hero.
    GoldGranted { gold: i32 },
    /// An unsupported language was requested; the default stands.
    LanguageRejected,
    /// The presentation language changed.
    LanguageChanged { language: Language },
    /// The retreat setting was toggled.
    RetreatToggled { enabled: bool },
    /// The player asked for help in some engine state.
    HelpShown { context: HelpContext },
}
