//! # Command Input
//!
//! Turns raw player text into a closed [`Command`] enum. Matching is
//! exact against explicit per-locale synonym tables. An unknown word
//! is rejected instead of fuzzily matched, so a direction hiding
//! inside an unrelated word can never move the hero.
//!
//! Parsing is state-aware: the same word "health" means *drink* while
//! exploring or fighting and *buy* at a merchant's menu, and while the
//! save menu is open the only meaningful input is a number.

use crate::{Direction, PotionKind};

/// Which command set the engine currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Exploring,
    Combat,
    Trade,
    SaveSelect,
}

/// Privileged diagnostic commands. Available only behind the client's
/// admin flag; convenience for poking at a running game, not a
/// security boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Set the hero's health to zero.
    Perish,
    /// Teleport the hero to the exit corner.
    Escape,
    /// List every roster member.
    ListRoster,
    /// Report the dungeon size.
    ShowSize,
    /// Report the session flags.
    ShowFlags,
    /// Request an unsupported language to exercise the fallback.
    LanguageProbe,
    /// Grant the hero 100 gold.
    GrantGold,
}

impl AdminCommand {
    fn parse(token: &str) -> Option<AdminCommand> {
        match token {
            "perish" => Some(AdminCommand::Perish),
            "escape" => Some(AdminCommand::Escape),
            "list" => Some(AdminCommand::ListRoster),
            "size" => Some(AdminCommand::ShowSize),
            "status" => Some(AdminCommand::ShowFlags),
            "lang" => Some(AdminCommand::LanguageProbe),
            "money" => Some(AdminCommand::GrantGold),
            _ => None,
        }
    }
}

/// Everything a player can ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Go(Direction),
    Fight,
    Retreat,
    DrinkHealth,
    DrinkStrength,
    BuyHealth,
    BuyStrength,
    LeaveTrade,
    KillMerchant,
    Save,
    Load,
    Help,
    /// Numeric pick from the save menu, 1-indexed.
    SaveSelection(usize),
    Admin(AdminCommand),
}

/// Leading verbs that carry no meaning of their own; the noun decides.
const VERB_PREFIXES: &[&str] = &["go ", "geh ", "drink ", "trink ", "buy ", "kauf ", "kaufe "];

const NORTH: &[&str] = &["north", "nord"];
const SOUTH: &[&str] = &["south", "süd", "sued"];
const EAST: &[&str] = &["east", "ost"];
const WEST: &[&str] = &["west", "westen"];

const HEALTH_POTION: &[&str] = &["health", "health potion", "heil", "heiltrank"];
const STRENGTH_POTION: &[&str] = &["strength", "strength potion", "kraft", "krafttrank"];

const FIGHT: &[&str] = &["fight", "kampf", "kämpfen", "kaempfen"];
const RETREAT: &[&str] = &["retreat", "zurückziehen", "zurueckziehen"];
const LEAVE: &[&str] = &["leave", "leave trade", "verlassen"];
const KILL: &[&str] = &["kill", "kill merchant", "töten", "toeten", "töte", "toete"];
const SAVE: &[&str] = &["save", "save game", "speichern"];
const LOAD: &[&str] = &["load", "load save", "laden"];
const HELP: &[&str] = &["help", "hilfe"];

fn listed(table: &[&str], token: &str) -> bool {
    table.contains(&token)
}

/// Strips one optional verb prefix; `"go north"` and `"north"` are the
/// same command.
fn strip_verb(token: &str) -> &str {
    for prefix in VERB_PREFIXES {
        if let Some(rest) = token.strip_prefix(prefix) {
            return rest.trim();
        }
    }
    token
}

fn parse_direction(token: &str) -> Option<Direction> {
    if listed(NORTH, token) {
        Some(Direction::North)
    } else if listed(SOUTH, token) {
        Some(Direction::South)
    } else if listed(EAST, token) {
        Some(Direction::East)
    } else if listed(WEST, token) {
        Some(Direction::West)
    } else {
        None
    }
}

fn parse_potion(token: &str) -> Option<PotionKind> {
    if listed(HEALTH_POTION, token) {
        Some(PotionKind::Health)
    } else if listed(STRENGTH_POTION, token) {
        Some(PotionKind::Strength)
    } else {
        None
    }
}

impl Command {
    /// Parses one line of input against the command set of `mode`.
    ///
    /// Case- and locale-insensitive; both English and German synonyms
    /// are accepted at all times. Returns `None` for anything outside
    /// the closed vocabulary.
    ///
    /// # Examples
    ///
    /// ```
    /// use gloomcrawl::{Command, Direction, InputMode};
    ///
    /// let command = Command::parse("Go North", InputMode::Exploring);
    /// assert_eq!(command, Some(Command::Go(Direction::North)));
    ///
    /// // The same noun switches meaning with the mode.
    /// assert_eq!(
    ///     Command::parse("health", InputMode::Trade),
    ///     Some(Command::BuyHealth)
    /// );
    /// ```
    pub fn parse(input: &str, mode: InputMode) -> Option<Command> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        let token = strip_verb(&normalized);

        if let Some(admin) = AdminCommand::parse(token) {
            return Some(Command::Admin(admin));
        }
        if listed(HELP, token) {
            return Some(Command::Help);
        }

        match mode {
            InputMode::SaveSelect => token.parse::<usize>().ok().map(Command::SaveSelection),
            InputMode::Exploring => {
                if let Some(direction) = parse_direction(token) {
                    return Some(Command::Go(direction));
                }
                match parse_potion(token) {
                    Some(PotionKind::Health) => return Some(Command::DrinkHealth),
                    Some(PotionKind::Strength) => return Some(Command::DrinkStrength),
                    None => {}
                }
                parse_meta(token)
            }
            InputMode::Combat => {
                if listed(FIGHT, token) {
                    return Some(Command::Fight);
                }
                if listed(RETREAT, token) {
                    return Some(Command::Retreat);
                }
                match parse_potion(token) {
                    Some(PotionKind::Health) => return Some(Command::DrinkHealth),
                    Some(PotionKind::Strength) => return Some(Command::DrinkStrength),
                    None => {}
                }
                parse_meta(token)
            }
            InputMode::Trade => {
                match parse_potion(token) {
                    Some(PotionKind::Health) => return Some(Command::BuyHealth),
                    Some(PotionKind::Strength) => return Some(Command::BuyStrength),
                    None => {}
                }
                if listed(LEAVE, token) {
                    return Some(Command::LeaveTrade);
                }
                if listed(KILL, token) {
                    return Some(Command::KillMerchant);
                }
                parse_meta(token)
            }
        }
    }
}

/// Save and load are meaningful in every non-menu state; the engine
/// decides whether they are currently allowed.
fn parse_meta(token: &str) -> Option<Command> {
    if listed(SAVE, token) {
        Some(Command::Save)
    } else if listed(LOAD, token) {
        Some(Command::Load)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_both_locales() {
        for (input, direction) in [
            ("north", Direction::North),
            ("go north", Direction::North),
            ("geh nord", Direction::North),
            ("SOUTH", Direction::South),
            ("sued", Direction::South),
            ("süd", Direction::South),
            ("go east", Direction::East),
            ("ost", Direction::East),
            ("west", Direction::West),
        ] {
            assert_eq!(
                Command::parse(input, InputMode::Exploring),
                Some(Command::Go(direction)),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_no_substring_collisions() {
        // A direction buried in an unrelated word must not move the
        // hero, unlike substring matching would.
        assert_eq!(Command::parse("northward", InputMode::Exploring), None);
        assert_eq!(Command::parse("keast", InputMode::Exploring), None);
        assert_eq!(Command::parse("lostword", InputMode::Exploring), None);
    }

    #[test]
    fn test_potion_words_depend_on_mode() {
        assert_eq!(
            Command::parse("drink health potion", InputMode::Exploring),
            Some(Command::DrinkHealth)
        );
        assert_eq!(
            Command::parse("health", InputMode::Combat),
            Some(Command::DrinkHealth)
        );
        assert_eq!(
            Command::parse("buy health", InputMode::Trade),
            Some(Command::BuyHealth)
        );
        assert_eq!(
            Command::parse("krafttrank", InputMode::Trade),
            Some(Command::BuyStrength)
        );
    }

    #[test]
    fn test_combat_commands() {
        assert_eq!(
            Command::parse("fight", InputMode::Combat),
            Some(Command::Fight)
        );
        assert_eq!(
            Command::parse("kampf", InputMode::Combat),
            Some(Command::Fight)
        );
        assert_eq!(
            Command::parse("retreat", InputMode::Combat),
            Some(Command::Retreat)
        );
        // Fighting is not a thing while merely exploring.
        assert_eq!(Command::parse("fight", InputMode::Exploring), None);
    }

    #[test]
    fn test_trade_commands() {
        assert_eq!(
            Command::parse("leave", InputMode::Trade),
            Some(Command::LeaveTrade)
        );
        assert_eq!(
            Command::parse("kill merchant", InputMode::Trade),
            Some(Command::KillMerchant)
        );
        assert_eq!(
            Command::parse("verlassen", InputMode::Trade),
            Some(Command::LeaveTrade)
        );
    }

    #[test]
    fn test_save_selection_numeric_only() {
        assert_eq!(
            Command::parse("2", InputMode::SaveSelect),
            Some(Command::SaveSelection(2))
        );
        assert_eq!(Command::parse("two", InputMode::SaveSelect), None);
        assert_eq!(Command::parse("north", InputMode::SaveSelect), None);
        // Help still works from the save menu.
        assert_eq!(
            Command::parse("help", InputMode::SaveSelect),
            Some(Command::Help)
        );
    }

    #[test]
    fn test_admin_commands_parse_everywhere() {
        for mode in [
            InputMode::Exploring,
            InputMode::Combat,
            InputMode::Trade,
            InputMode::SaveSelect,
        ] {
            assert_eq!(
                Command::parse("money", mode),
                Some(Command::Admin(AdminCommand::GrantGold))
            );
            assert_eq!(
                Command::parse("status", mode),
                Some(Command::Admin(AdminCommand::ShowFlags))
            );
        }
    }

    #[test]
    fn test_meta_commands_and_noise() {
        assert_eq!(
            Command::parse("save", InputMode::Exploring),
            Some(Command::Save)
        );
        assert_eq!(
            Command::parse("load", InputMode::Combat),
            Some(Command::Load)
        );
        assert_eq!(
            Command::parse("speichern", InputMode::Trade),
            Some(Command::Save)
        );
        assert_eq!(Command::parse("", InputMode::Exploring), None);
        assert_eq!(Command::parse("   ", InputMode::Exploring), None);
        assert_eq!(Command::parse("abracadabra", InputMode::Exploring), None);
    }
}
