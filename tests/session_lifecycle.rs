//! Integration tests driving the engine the way a front end would:
//! raw command strings in, events and snapshots out.

use gloomcrawl::{
    Character, CharacterKind, Direction, GameEngine, GameEvent, GameOutcome, GameSession, Position,
};

fn bare_engine(dungeon_size: u32, seed: u64) -> GameEngine {
    let mut session = GameSession::new(dungeon_size);
    session.push_character(Character::hero("Tester"));
    GameEngine::with_session(session, seed, "target/test-saves")
}

#[test]
fn test_initialize_session_invariants() {
    for seed in 0..20 {
        let engine = GameEngine::initialize("Aldric", Some(seed), "target/test-saves");
        let session = engine.session();
        let size = session.dungeon_size;

        assert!((6..=9).contains(&size), "seed {seed} gave size {size}");

        // Hero first, at the entrance, with starting stats.
        let hero = session.hero();
        assert_eq!(hero.kind, CharacterKind::Hero);
        assert_eq!(hero.name, "Aldric");
        assert_eq!(hero.position(), Position::new(0, 0));
        assert_eq!(hero.health(), 100);
        assert_eq!(hero.max_damage, 25);

        // Exactly one hero, and everyone stays inside the grid and off
        // the entrance and exit.
        let heroes = session
            .roster()
            .iter()
            .filter(|c| c.kind == CharacterKind::Hero)
            .count();
        assert_eq!(heroes, 1);
        for other in session.roster().iter().skip(1) {
            let pos = other.position();
            assert!(pos.x < size && pos.y < size);
            assert_ne!(pos, Position::new(0, 0));
            assert_ne!(pos, Position::new(size - 1, size - 1));
        }

        let merchants = session
            .roster()
            .iter()
            .filter(|c| c.kind == CharacterKind::Merchant)
            .count();
        assert_eq!(merchants, if size <= 7 { 1 } else { 2 });
    }
}

#[test]
fn test_move_command_advances_turn_and_decays_health() {
    let mut engine = bare_engine(8, 4);

    engine.issue_command("go east");

    let state = engine.display_state();
    assert_eq!(state.position, Position::new(1, 0));
    assert_eq!(state.turn, 1);
    assert_eq!(state.health, 98);

    // Localized synonym, different direction.
    engine.issue_command("geh süd");
    let state = engine.display_state();
    assert_eq!(state.position, Position::new(1, 1));
    assert_eq!(state.turn, 2);
}

#[test]
fn test_unknown_command_changes_nothing() {
    let mut engine = bare_engine(8, 4);
    let before = engine.session().clone();

    engine.issue_command("sing loudly");

    let events = engine.drain_events();
    assert_eq!(events, vec![GameEvent::InvalidCommand]);
    assert_eq!(engine.session().roster(), before.roster());
    assert_eq!(engine.session().turn_counter, before.turn_counter);
}

#[test]
fn test_edge_moves_are_rejected() {
    let mut engine = bare_engine(6, 4);

    engine.issue_command("go north");
    engine.issue_command("go west");

    let events = engine.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::MoveBlocked))
            .count(),
        2
    );
    let state = engine.display_state();
    assert_eq!(state.position, Position::new(0, 0));
    assert_eq!(state.turn, 0);
    assert_eq!(state.health, 100);
}

#[test]
fn test_walk_to_exit_escapes_then_rerun() {
    let mut engine = bare_engine(6, 4);

    // An empty dungeon: walk the south edge, then the east edge.
    for _ in 0..5 {
        engine.issue_command("go south");
    }
    for _ in 0..5 {
        engine.issue_command("go east");
    }

    assert_eq!(engine.outcome(), Some(GameOutcome::Escaped));
    let events = engine.drain_events();
    assert!(events.contains(&GameEvent::HeroEscaped));

    // Commands are dead after the run ends...
    engine.issue_command("go north");
    assert_eq!(engine.drain_events(), vec![GameEvent::InvalidCommand]);

    // ...until the player opts into a fresh dungeon.
    engine.rerun().unwrap();
    assert_eq!(engine.outcome(), None);
    let state = engine.display_state();
    assert_eq!(state.position, Position::new(0, 0));
    assert_eq!(state.turn, 0);
    assert_eq!(state.health, 100);
    assert!(engine.session().roster().len() > 1, "dungeon repopulated");
}

#[test]
fn test_state_flags_stay_consistent_under_random_play() {
    // Hammer a real dungeon with a scripted mix of commands; after
    // every single one the flag invariants must hold.
    let commands = [
        "go north", "go south", "go east", "go west", "fight", "retreat", "drink health",
        "drink strength", "leave", "buy health", "help",
    ];

    for seed in 0..6 {
        let mut engine = GameEngine::initialize("Aldric", Some(seed), "target/test-saves");
        for step in 0..300 {
            let command = commands[(step * 7 + seed as usize) % commands.len()];
            engine.issue_command(command);
            engine.drain_events();

            let session = engine.session();
            assert!(
                !(session.in_combat() && session.in_trade()),
                "combat and trade at once (seed {seed}, step {step})"
            );
            if session.room_partner.is_none() {
                assert!(!session.in_combat() && !session.in_trade());
            }
            let pos = session.hero().position();
            assert!(pos.x < session.dungeon_size && pos.y < session.dungeon_size);
            assert!(session.hero().health() >= 0);

            if engine.outcome().is_some() {
                break;
            }
        }
    }
}

#[test]
fn test_display_state_counts_adjacent_monsters() {
    let mut session = GameSession::new(6);
    let mut hero = Character::hero("Tester");
    hero.set_position(Position::new(2, 2), 6).unwrap();
    session.push_character(hero);
    session.push_character(Character::new(
        "Goblin 1",
        15,
        CharacterKind::Monster,
        5,
        Position::new(2, 3),
        5,
        false,
        false,
    ));
    session.push_character(Character::new(
        "Skeleton 1",
        30,
        CharacterKind::Monster,
        10,
        Position::new(1, 2),
        8,
        false,
        false,
    ));
    session.push_character(Character::merchant(1, Position::new(3, 2)));
    let engine = GameEngine::with_session(session, 1, "target/test-saves");

    assert_eq!(engine.display_state().nearby_monster_count, 2);
}

#[test]
fn test_retreat_toggle_reaches_combat_rules() {
    let mut session = GameSession::new(6);
    let mut hero = Character::hero("Tester");
    hero.set_position(Position::new(2, 2), 6).unwrap();
    session.push_character(hero);
    session.push_character(Character::new(
        "Golem 1",
        50,
        CharacterKind::Monster,
        20,
        Position::new(2, 2),
        0,
        false,
        false,
    ));
    session.detect_room_partner();
    session.set_in_combat(true);
    let mut engine = GameEngine::with_session(session, 13, "target/test-saves");

    engine.toggle_retreat();
    assert!(engine
        .drain_events()
        .contains(&GameEvent::RetreatToggled { enabled: false }));

    engine.issue_command("retreat");
    let events = engine.drain_events();
    assert!(events.contains(&GameEvent::RetreatBlocked));
    assert!(engine.session().in_combat(), "still locked in combat");
    assert_eq!(engine.session().hero().health(), 100);
}

#[test]
fn test_hero_can_step_each_direction() {
    let mut session = GameSession::new(6);
    let mut hero = Character::hero("Tester");
    hero.set_position(Position::new(3, 3), 6).unwrap();
    session.push_character(hero);
    let mut engine = GameEngine::with_session(session, 1, "target/test-saves");

    let expectations = [
        (Direction::North, Position::new(3, 2)),
        (Direction::East, Position::new(4, 2)),
        (Direction::South, Position::new(4, 3)),
        (Direction::West, Position::new(3, 3)),
    ];
    for (direction, expected) in expectations {
        let command = match direction {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        };
        engine.issue_command(command);
        assert_eq!(engine.display_state().position, expected);
    }
    assert_eq!(engine.display_state().turn, 4);
}
