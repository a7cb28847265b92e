//! # Generation Module
//!
//! Random dungeon sizing and population. The generator never touches
//! the grid itself (rooms are implicit), only how big the
//! square is and who stands where, with collision-free placement.

use crate::{config, Character, CharacterKind, GameSession, Position};
use log::debug;
use rand::{rngs::StdRng, Rng};

/// The four monster archetypes and their spawn weights.
///
/// A tier is picked with one `[0, 10)` roll: four faces goblin, three
/// skeleton, two mimic, one golem.
struct MonsterTier {
    name: &'static str,
    health: i32,
    kind: CharacterKind,
    max_damage: i32,
    gold: i32,
}

const GOBLIN: MonsterTier = MonsterTier {
    name: "Goblin",
    health: 15,
    kind: CharacterKind::Monster,
    max_damage: 5,
    gold: 5,
};
const SKELETON: MonsterTier = MonsterTier {
    name: "Skeleton",
    health: 30,
    kind: CharacterKind::Monster,
    max_damage: 10,
    gold: 8,
};
const MIMIC: MonsterTier = MonsterTier {
    name: "Mimic",
    health: 40,
    kind: CharacterKind::Mimic,
    max_damage: 15,
    gold: 13,
};
const GOLEM: MonsterTier = MonsterTier {
    name: "Golem",
    health: 50,
    kind: CharacterKind::Monster,
    max_damage: 20,
    gold: 0,
};

/// Rolls the side length of a new dungeon.
///
/// Rejection-sampled from `[0, 10)` until the draw exceeds 5, which
/// yields 6 through 9. Ten is nominally the ceiling but the sampling
/// can never produce it; kept as-is rather than silently widened.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let size = gloomcrawl::roll_dungeon_size(&mut rng);
/// assert!((6..=9).contains(&size));
/// ```
pub fn roll_dungeon_size(rng: &mut StdRng) -> u32 {
    loop {
        let roll = rng.gen_range(0..10);
        if roll > 5 {
            return roll;
        }
    }
}

/// Fills a hero-only session with merchants and monsters.
///
/// The number of placement rounds scales with the grid area; the first
/// round spawns the merchant contingent, every later round one monster.
/// Placement never lands on the entrance, the exit, or an occupied
/// room.
pub fn populate(session: &mut GameSession, rng: &mut StdRng) {
    debug_assert!(session.has_hero(), "populate needs the hero at index 0");
    debug_assert_eq!(session.roster().len(), 1, "populate starts from a bare roster");

    let size = session.dungeon_size;
    let spawn_rounds =
        ((size * size) as f64 / config::SPAWN_DENSITY_DIVISOR).floor() as u32;
    let mut spawned = SpawnCounters::default();

    for round in 0..spawn_rounds {
        if round == 0 {
            // Small dungeons support one merchant, larger ones two.
            let merchant_count = if (5..=7).contains(&size) { 1 } else { 2 };
            for _ in 0..merchant_count {
                let position = free_position(session, rng);
                spawned.merchants += 1;
                session.push_character(Character::merchant(spawned.merchants, position));
            }
        } else {
            let position = free_position(session, rng);
            let monster = spawn_monster(position, rng, &mut spawned);
            session.push_character(monster);
        }
    }

    debug!(
        "populated size-{size} dungeon: {} merchants, {} goblins, {} skeletons, {} mimics, {} golems",
        spawned.merchants, spawned.goblins, spawned.skeletons, spawned.mimics, spawned.golems
    );
}

/// Per-population naming counters, so every "Goblin 2" is unique
/// within one dungeon.
#[derive(Debug, Default)]
struct SpawnCounters {
    merchants: u32,
    goblins: u32,
    skeletons: u32,
    mimics: u32,
    golems: u32,
}

/// Draws a random monster from the tier table and names it.
fn spawn_monster(position: Position, rng: &mut StdRng, spawned: &mut SpawnCounters) -> Character {
    let (tier, ordinal) = match rng.gen_range(0..10) {
        0..=3 => {
            spawned.goblins += 1;
            (&GOBLIN, spawned.goblins)
        }
        4..=6 => {
            spawned.skeletons += 1;
            (&SKELETON, spawned.skeletons)
        }
        7..=8 => {
            spawned.mimics += 1;
            (&MIMIC, spawned.mimics)
        }
        _ => {
            spawned.golems += 1;
            (&GOLEM, spawned.golems)
        }
    };

    Character::new(
        format!("{} {}", tier.name, ordinal),
        tier.health,
        tier.kind,
        tier.max_damage,
        position,
        tier.gold,
        false,
        false,
    )
}

/// Rolls coordinates until they land on a free room.
///
/// The entrance and exit stay clear, and nobody spawns on top of
/// anybody else. Termination is guaranteed: the population is a small
/// fraction of the cell count at every legal dungeon size.
fn free_position(session: &GameSession, rng: &mut StdRng) -> Position {
    let size = session.dungeon_size;
    loop {
        let candidate = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
        if candidate == Position::entrance() || candidate == Position::exit(size) {
            continue;
        }
        if session
            .roster()
            .iter()
            .skip(1)
            .any(|other| other.position() == candidate)
        {
            continue;
        }
        return candidate;
    }
}
