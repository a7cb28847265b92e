//! # Persistence
//!
//! Saves are plain text, one `key: value` pair per line: a session
//! block, then one block per character in roster order, with sentinel
//! lines between the sections. The loader runs two passes: the first
//! sizes the roster from the session block, the second fills each
//! character in by key, ignoring unknown keys so older or hand-edited
//! files still load.
//!
//! A failed load never touches the running session: the parsed state
//! is committed only after the whole file has been read and validated.

use crate::{Character, CharacterKind, CrawlError, CrawlResult, GameSession, Position};
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const DUNGEON_SENTINEL: &str = "~~~ END OF DUNGEON INFO ~~~";
const CHARACTER_SENTINEL: &str = "~~~ END OF CHARACTER INFO ~~~";
const FILE_SENTINEL: &str = "~~~ END OF SAVE FILE ~~~";

/// A fully parsed save file, ready to replace the running session.
#[derive(Debug)]
pub struct RestoredGame {
    pub file_name: String,
    session: GameSession,
}

impl RestoredGame {
    pub fn into_session(self) -> GameSession {
        self.session
    }
}

/// Save file storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Save file names in selection order. A missing directory just
    /// means there is nothing saved yet.
    pub fn list(&self) -> CrawlResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Writes the session to a new timestamped file and returns its
    /// name. Refuses a roster without a hero.
    pub fn write(&self, session: &GameSession) -> CrawlResult<String> {
        if !session.has_hero() {
            return Err(CrawlError::InvalidState(
                "cannot save: roster is missing its hero".to_string(),
            ));
        }

        let file_name = format!(
            "Save File {}.txt",
            chrono::Local::now().format("%m-%d-%Y %H-%M-%S")
        );
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(&file_name), render_save(session))?;
        debug!("wrote {} characters to {file_name}", session.roster().len());
        Ok(file_name)
    }

    /// Reads the 1-indexed save from the listing.
    ///
    /// An out-of-range selection is user error
    /// ([`CrawlError::InvalidState`]); everything else that can go
    /// wrong here means the file itself is unreadable or malformed.
    pub fn read_selection(&self, selection: usize) -> CrawlResult<RestoredGame> {
        let files = self.list()?;
        let file_name = selection
            .checked_sub(1)
            .and_then(|index| files.get(index))
            .ok_or_else(|| {
                CrawlError::InvalidState(format!(
                    "save selection {selection} is not between 1 and {}",
                    files.len()
                ))
            })?
            .clone();

        let content = fs::read_to_string(self.dir.join(&file_name))?;
        let session = parse_save(&content)?;
        Ok(RestoredGame { file_name, session })
    }
}

/// Serializes a session into the flat text format.
fn render_save(session: &GameSession) -> String {
    let mut out = String::new();
    let room_partner = session
        .room_partner
        .map(|index| index as i64)
        .unwrap_or(-1);

    // Infallible: writing to a String cannot error.
    let _ = writeln!(out, "numOfCharacters: {}", session.roster().len());
    let _ = writeln!(out, "dungeonSize: {}", session.dungeon_size);
    let _ = writeln!(out, "turnCounter: {}", session.turn_counter);
    let _ = writeln!(out, "characterInSameRoom: {room_partner}");
    let _ = writeln!(out, "potionTurnCounter: {}", session.potion_turn_counter);
    let _ = writeln!(out, "canRetreat: {}", session.can_retreat);
    let _ = writeln!(out, "{DUNGEON_SENTINEL}");

    for character in session.roster() {
        let _ = writeln!(out, "name: {}", character.name);
        let _ = writeln!(out, "health: {}", character.health());
        let _ = writeln!(out, "maxDamage: {}", character.max_damage);
        let _ = writeln!(out, "xCord: {}", character.position().x);
        let _ = writeln!(out, "yCord: {}", character.position().y);
        let _ = writeln!(out, "gold: {}", character.gold);
        let _ = writeln!(out, "type: {}", character.kind.to_index());
        let _ = writeln!(out, "healthPotionCondition: {}", character.has_health_potion);
        let _ = writeln!(
            out,
            "strengthPotionCondition: {}",
            character.has_strength_potion
        );
        let _ = writeln!(out, "{CHARACTER_SENTINEL}");
    }

    let _ = writeln!(out, "{FILE_SENTINEL}");
    out
}

fn parse_int(key: &str, value: &str) -> CrawlResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| CrawlError::MalformedSave(format!("{key} is not an integer: {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> CrawlResult<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| CrawlError::MalformedSave(format!("{key} is not a boolean: {value:?}")))
}

/// One character block in mid-parse. Fields keep the placeholder
/// defaults the save format assumes when a key is absent.
struct RawCharacter {
    name: String,
    health: i64,
    max_damage: i64,
    x: i64,
    y: i64,
    gold: i64,
    kind_index: i64,
    has_health_potion: bool,
    has_strength_potion: bool,
}

impl RawCharacter {
    fn new() -> Self {
        Self {
            name: String::new(),
            health: 0,
            max_damage: 0,
            x: 0,
            y: 0,
            gold: 0,
            kind_index: CharacterKind::Monster.to_index() as i64,
            has_health_potion: false,
            has_strength_potion: false,
        }
    }

    fn build(self, dungeon_size: u32) -> CrawlResult<Character> {
        let kind = u32::try_from(self.kind_index)
            .ok()
            .and_then(CharacterKind::from_index)
            .ok_or_else(|| {
                CrawlError::MalformedSave(format!("unknown character type {}", self.kind_index))
            })?;

        let in_range = |value: i64| -> bool { value >= 0 && (value as u64) < dungeon_size as u64 };
        if !in_range(self.x) || !in_range(self.y) {
            return Err(CrawlError::MalformedSave(format!(
                "coordinate ({}, {}) outside dungeon of size {dungeon_size}",
                self.x, self.y
            )));
        }

        let mut character = Character::new(
            self.name,
            self.health as i32,
            kind,
            self.max_damage as i32,
            Position::entrance(),
            self.gold as i32,
            self.has_health_potion,
            self.has_strength_potion,
        );
        character
            .set_position(Position::new(self.x as u32, self.y as u32), dungeon_size)
            .map_err(|err| CrawlError::MalformedSave(err.to_string()))?;
        Ok(character)
    }
}

/// Parses the whole save in two passes: session block first (which
/// sizes the roster), then the character blocks. Unknown keys are
/// ignored in both.
fn parse_save(content: &str) -> CrawlResult<GameSession> {
    let mut lines = content.lines();

    // Pass 1: session fields up to the dungeon sentinel.
    let mut num_of_characters: Option<usize> = None;
    let mut dungeon_size: Option<u32> = None;
    let mut turn_counter = 0u32;
    let mut room_partner_raw = -1i64;
    let mut potion_turn_counter = 0u32;
    let mut can_retreat = true;
    let mut saw_dungeon_sentinel = false;

    for line in lines.by_ref() {
        if line.contains(DUNGEON_SENTINEL) {
            saw_dungeon_sentinel = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "numOfCharacters" => {
                let count = parse_int(key, value)?;
                if count < 1 {
                    return Err(CrawlError::MalformedSave(format!(
                        "numOfCharacters must be positive, got {count}"
                    )));
                }
                num_of_characters = Some(count as usize);
            }
            "dungeonSize" => {
                let size = parse_int(key, value)?;
                if size < 2 {
                    return Err(CrawlError::MalformedSave(format!(
                        "dungeonSize must be at least 2, got {size}"
                    )));
                }
                dungeon_size = Some(size as u32);
            }
            "turnCounter" => turn_counter = parse_int(key, value)?.max(0) as u32,
            "characterInSameRoom" => room_partner_raw = parse_int(key, value)?,
            "potionTurnCounter" => potion_turn_counter = parse_int(key, value)?.max(0) as u32,
            "canRetreat" => can_retreat = parse_bool(key, value)?,
            _ => {}
        }
    }

    if !saw_dungeon_sentinel {
        return Err(CrawlError::MalformedSave(
            "missing dungeon info sentinel".to_string(),
        ));
    }
    let num_of_characters = num_of_characters
        .ok_or_else(|| CrawlError::MalformedSave("missing numOfCharacters".to_string()))?;
    let dungeon_size =
        dungeon_size.ok_or_else(|| CrawlError::MalformedSave("missing dungeonSize".to_string()))?;

    // Pass 2: character blocks. Blocks past the declared count are
    // trimmed; fewer than declared means the file was truncated.
    let mut roster: Vec<Character> = Vec::with_capacity(num_of_characters);
    let mut current = RawCharacter::new();
    for line in lines {
        if line.contains(FILE_SENTINEL) {
            break;
        }
        if line.contains(CHARACTER_SENTINEL) {
            roster.push(current.build(dungeon_size)?);
            if roster.len() == num_of_characters {
                break;
            }
            current = RawCharacter::new();
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "name" => current.name = value.trim().to_string(),
            "health" => current.health = parse_int(key, value)?,
            "maxDamage" => current.max_damage = parse_int(key, value)?,
            "xCord" => current.x = parse_int(key, value)?,
            "yCord" => current.y = parse_int(key, value)?,
            "gold" => current.gold = parse_int(key, value)?,
            "type" => current.kind_index = parse_int(key, value)?,
            "healthPotionCondition" => current.has_health_potion = parse_bool(key, value)?,
            "strengthPotionCondition" => current.has_strength_potion = parse_bool(key, value)?,
            _ => {}
        }
    }

    if roster.len() < num_of_characters {
        return Err(CrawlError::MalformedSave(format!(
            "expected {num_of_characters} characters, found {}",
            roster.len()
        )));
    }
    if roster[0].kind != CharacterKind::Hero {
        return Err(CrawlError::MalformedSave(
            "first character is not the hero".to_string(),
        ));
    }

    let room_partner = match room_partner_raw {
        -1 => None,
        index if index >= 1 && (index as usize) < num_of_characters => Some(index as usize),
        index => {
            return Err(CrawlError::MalformedSave(format!(
                "characterInSameRoom index {index} out of range"
            )));
        }
    };

    let mut session = GameSession::new(dungeon_size);
    session.replace_roster(roster);
    session.turn_counter = turn_counter;
    session.potion_turn_counter = potion_turn_counter;
    session.can_retreat = can_retreat;
    session.room_partner = room_partner;
    Ok(session)
}
