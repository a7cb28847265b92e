//! # Encounter Engine
//!
//! [`GameEngine`] drives the whole game: it owns the session, the RNG,
//! and the event queue, and resolves exactly one atomic unit of work
//! per command. The presentation layer feeds it raw input through
//! [`GameEngine::issue_command`] and drains the queued [`GameEvent`]s
//! afterwards.
//!
//! State machine, per hero: Exploring, InCombat, InTrade, and
//! GameOver(Escaped | Dead). Transitions are documented on the
//! individual operations below.

use crate::input::{AdminCommand, Command, InputMode};
use crate::persistence::SaveStore;
use crate::{
    config, Character, CharacterKind, CrawlError, CrawlResult, Direction, GameEvent, GameOutcome,
    GameSession, HelpContext, Language, PotionKind, Position,
};
use log::{debug, error, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Snapshot of everything the status panel needs, decoupled from the
/// roster so the presentation layer never holds live references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    pub health: i32,
    pub max_damage: i32,
    pub position: Position,
    pub nearby_monster_count: usize,
    pub turn: u32,
    pub gold: i32,
    pub has_health_potion: bool,
    pub has_strength_potion: bool,
}

/// The engine: session state plus the machinery that mutates it.
///
/// There are no globals; everything an operation touches hangs off this
/// struct, and tests construct engines around hand-built sessions with
/// a fixed seed.
pub struct GameEngine {
    session: GameSession,
    rng: StdRng,
    events: VecDeque<GameEvent>,
    saves: SaveStore,
    is_admin: bool,
}

impl GameEngine {
    /// Starts a fresh run: rolls a dungeon size, creates the hero at
    /// the entrance, and populates the dungeon.
    ///
    /// A hero named `admin` (any casing) unlocks the diagnostic
    /// commands; this is a convenience switch, not a security boundary.
    pub fn initialize(hero_name: &str, seed: Option<u64>, save_dir: impl AsRef<Path>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let dungeon_size = crate::generation::roll_dungeon_size(&mut rng);
        let mut session = GameSession::new(dungeon_size);
        session.push_character(Character::hero(hero_name));
        crate::generation::populate(&mut session, &mut rng);

        info!(
            "new run: dungeon size {}, {} characters",
            dungeon_size,
            session.roster().len()
        );

        let mut engine = Self {
            is_admin: hero_name.eq_ignore_ascii_case("admin"),
            session,
            rng,
            events: VecDeque::new(),
            saves: SaveStore::new(save_dir),
        };
        engine.events.push_back(GameEvent::Welcome);
        engine
    }

    /// Wraps an existing session. Used by tests to pin the roster and
    /// the RNG seed.
    pub fn with_session(session: GameSession, seed: u64, save_dir: impl AsRef<Path>) -> Self {
        Self {
            session,
            rng: StdRng::seed_from_u64(seed),
            events: VecDeque::new(),
            saves: SaveStore::new(save_dir),
            is_admin: false,
        }
    }

    /// Read-only view of the session for the presentation layer.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Removes and returns all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    /// How the run ended, if it has.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.session.outcome
    }

    /// Snapshot for the status panel.
    pub fn display_state(&self) -> DisplayState {
        self.session.display_state()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn set_admin(&mut self, privilege: bool) {
        self.is_admin = privilege;
    }

    /// The command set currently accepted, derived from session flags.
    pub fn input_mode(&self) -> InputMode {
        if self.session.save_loading {
            InputMode::SaveSelect
        } else if self.session.in_trade() {
            InputMode::Trade
        } else if self.session.in_combat() {
            InputMode::Combat
        } else {
            InputMode::Exploring
        }
    }

    /// Uniform integer draw over `[0, bound)`; zero when the bound is
    /// not positive. Every random number in the game flows through
    /// here.
    fn rand_below(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Parses and executes one command, one atomic turn of engine
    /// work. Unknown input is reported and changes nothing.
    pub fn issue_command(&mut self, input: &str) {
        let mode = self.input_mode();
        let Some(command) = Command::parse(input, mode) else {
            if mode == InputMode::SaveSelect {
                self.events.push_back(GameEvent::InvalidSaveSelection);
            } else {
                self.events.push_back(GameEvent::InvalidCommand);
            }
            return;
        };
        debug!("command {:?} in mode {:?}", command, mode);

        // After the run ends only reloading and help stay live; the
        // front end drives a rerun through its own prompt.
        if self.session.outcome.is_some()
            && !matches!(
                command,
                Command::Load | Command::SaveSelection(_) | Command::Help
            )
        {
            self.events.push_back(GameEvent::InvalidCommand);
            return;
        }

        match command {
            Command::Go(direction) => self.move_hero(direction),
            Command::Fight => self.fight(),
            Command::Retreat => self.hero_retreat(),
            Command::DrinkHealth => self.drink_potion(PotionKind::Health),
            Command::DrinkStrength => self.drink_potion(PotionKind::Strength),
            Command::BuyHealth => self.buy_potion(PotionKind::Health),
            Command::BuyStrength => self.buy_potion(PotionKind::Strength),
            Command::LeaveTrade => self.leave_trade(),
            Command::KillMerchant => self.kill_merchant(),
            Command::Save => self.save_game(),
            Command::Load => self.open_load_menu(),
            Command::SaveSelection(index) => self.load_game(index),
            Command::Help => self.show_help(mode),
            Command::Admin(admin) => self.admin_command(admin),
        }
    }

    fn show_help(&mut self, mode: InputMode) {
        let context = match mode {
            InputMode::Exploring => HelpContext::Exploring,
            InputMode::Combat => HelpContext::Combat,
            InputMode::Trade => HelpContext::Trade,
            InputMode::SaveSelect => HelpContext::SaveSelect,
        };
        self.events.push_back(GameEvent::HelpShown { context });
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    /// Exploring → Exploring | InCombat | InTrade | GameOver.
    ///
    /// A successful step costs health and a turn; afterwards the hero
    /// either trips over a room-mate (an encounter) or, alone, has a
    /// chance of finding loose gold.
    fn move_hero(&mut self, direction: Direction) {
        let dungeon_size = self.session.dungeon_size;
        let hero = self.session.hero_mut();

        if hero.is_dead() || hero.has_escaped(dungeon_size) || !hero.try_step(direction, dungeon_size)
        {
            self.events.push_back(GameEvent::MoveBlocked);
            return;
        }

        self.session.hero_mut().apply_turn_health_decay();
        self.increment_turn();

        let hero = self.session.hero();
        if hero.is_dead() || hero.has_escaped(dungeon_size) {
            self.session.character_died = true;
            self.finish_command(false);
            return;
        }

        if self.session.detect_room_partner() {
            self.trigger_encounter();
        } else if self.rand_below(dungeon_size as i32) >= 5 {
            let mut reward = 0;
            while reward == 0 {
                reward = self.rand_below(dungeon_size as i32);
            }
            let hero = self.session.hero_mut();
            hero.gold += reward;
            let position = hero.position();
            self.events.push_back(GameEvent::GoldFound {
                amount: reward,
                position,
            });
        }

        self.finish_command(false);
    }

    /// Advances the turn counter and runs the strength-potion clock:
    /// while the boost is active each turn ticks the potion counter,
    /// and on the fifth tick the damage cap reverts.
    fn increment_turn(&mut self) {
        self.session.turn_counter += 1;

        if self.session.hero().max_damage == config::HERO_BOOSTED_DAMAGE {
            self.session.potion_turn_counter += 1;
            if self.session.potion_turn_counter >= config::STRENGTH_POTION_TURNS {
                let hero = self.session.hero_mut();
                hero.max_damage = config::HERO_BASE_DAMAGE;
                self.session.potion_turn_counter = 0;
                self.events.push_back(GameEvent::StrengthExpired {
                    max_damage: config::HERO_BASE_DAMAGE,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Encounters
    // ------------------------------------------------------------------

    /// Something shares the hero's room; dispatch on what it is.
    fn trigger_encounter(&mut self) {
        let Some(partner_index) = self.session.room_partner else {
            return;
        };
        let kind = self.session.roster()[partner_index].kind;

        match kind {
            CharacterKind::Merchant => {
                self.session.set_in_trade(true);
                let merchant = &self.session.roster()[partner_index];
                self.events.push_back(GameEvent::TradeOpened {
                    merchant: merchant.name.clone(),
                    sells_health: merchant.has_health_potion,
                    sells_strength: merchant.has_strength_potion,
                    price: config::POTION_PRICE,
                });
            }
            CharacterKind::Monster => self.monster_encounter(partner_index),
            CharacterKind::Mimic => self.mimic_encounter(partner_index),
            CharacterKind::Hero => {
                // Two heroes cannot exist; the generator and loader
                // both enforce it.
                error!("hero found as its own room partner");
            }
        }
    }

    /// A wounded hero, a no-retreat session, or a coin flip means the
    /// monster stands and fights. Otherwise it takes one parting hit
    /// from the hero and backs out of the room.
    fn monster_encounter(&mut self, monster_index: usize) {
        let dungeon_size = self.session.dungeon_size as i32;
        let forced = self.session.hero().health() < config::FORCED_COMBAT_THRESHOLD
            || !self.session.can_retreat;

        if forced || self.rand_below(dungeon_size) % 2 == 0 {
            self.begin_combat();
            return;
        }

        self.monster_retreat(monster_index);
        if self.session.roster()[monster_index].is_dead() {
            self.session.character_died = true;
        } else {
            let name = self.session.roster()[monster_index].name.clone();
            self.events.push_back(GameEvent::MonsterFled { name });
        }
        self.session.room_partner = None;
        self.session.set_in_combat(false);
        self.finish_command(false);
    }

    /// Half the time a mimic is just a chest full of gold; the other
    /// half it stops pretending, permanently.
    fn mimic_encounter(&mut self, mimic_index: usize) {
        let position = self.session.hero().position();

        if self.rand_below(10) % 2 == 0 {
            self.events.push_back(GameEvent::TreasureFound {
                position,
                reward: config::CHEST_REWARD,
            });
            self.session.hero_mut().gold += config::CHEST_REWARD;
            self.session.roster_mut().remove(mimic_index);
            self.session.room_partner = None;
        } else {
            self.events.push_back(GameEvent::MimicAttacks { position });
            self.session.roster_mut()[mimic_index].turn_hostile();
            self.begin_combat();
        }
    }

    /// Exploring | InTrade → InCombat.
    fn begin_combat(&mut self) {
        self.session.set_in_combat(true);
        let Some(opponent) = self.session.room_partner_character() else {
            return;
        };
        self.events.push_back(GameEvent::CombatStarted {
            opponent: opponent.name.clone(),
            opponent_position: opponent.position(),
            opponent_health: opponent.health(),
            hero_health: self.session.hero().health(),
        });
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// One full exchange. The hero strikes first; a kill ends the fight
    /// with no counter-attack, anything less invites one. Standing and
    /// swinging still costs the per-turn health toll.
    fn fight(&mut self) {
        let Some(opponent_index) = self.session.room_partner else {
            warn!("fight issued with no room partner");
            self.events.push_back(GameEvent::InvalidCommand);
            return;
        };

        let hero_damage = self.rand_below(self.session.hero().max_damage);
        let opponent = &mut self.session.roster_mut()[opponent_index];
        opponent.take_damage(hero_damage);
        let opponent_name = opponent.name.clone();
        let opponent_dead = opponent.is_dead();
        let opponent_max_damage = opponent.max_damage;
        self.events.push_back(GameEvent::HeroHit {
            target: opponent_name.clone(),
            damage: hero_damage,
        });

        if opponent_dead {
            self.session.character_died = true;
        } else {
            let counter_damage = self.rand_below(opponent_max_damage);
            self.session.hero_mut().take_damage(counter_damage);
            self.events.push_back(GameEvent::HeroStruck {
                attacker: opponent_name,
                damage: counter_damage,
            });
            if self.session.hero().is_dead() {
                self.session.character_died = true;
            }
        }

        self.session.hero_mut().apply_turn_health_decay();
        if self.session.hero().is_dead() {
            self.session.character_died = true;
        }

        self.finish_command(false);
    }

    /// InCombat → Exploring | GameOver(Dead).
    ///
    /// With retreat disabled this refuses outright and nothing changes.
    /// Otherwise the hero turns their back, takes one hit for it, and
    /// escapes the fight if still standing.
    fn hero_retreat(&mut self) {
        if !self.session.can_retreat {
            self.events.push_back(GameEvent::RetreatBlocked);
            return;
        }
        let Some(opponent_index) = self.session.room_partner else {
            warn!("retreat issued with no room partner");
            self.events.push_back(GameEvent::InvalidCommand);
            return;
        };

        let opponent = &self.session.roster()[opponent_index];
        let (attacker, opponent_max_damage) = (opponent.name.clone(), opponent.max_damage);
        let damage = self.rand_below(opponent_max_damage);
        self.session.hero_mut().take_damage(damage);
        self.events.push_back(GameEvent::HeroStruck { attacker, damage });

        let mut retreated = false;
        if self.session.hero().is_dead() {
            self.session.character_died = true;
        } else {
            self.events.push_back(GameEvent::HeroRetreated {
                health: self.session.hero().health(),
            });
            self.session.set_in_combat(false);
            retreated = true;
        }

        self.session.hero_mut().apply_turn_health_decay();
        if self.session.hero().is_dead() {
            self.session.character_died = true;
        }

        self.finish_command(retreated);
    }

    /// The fleeing monster eats one hero hit on the way out; whether it
    /// survives is the caller's problem.
    fn monster_retreat(&mut self, monster_index: usize) {
        let damage = self.rand_below(self.session.hero().max_damage);
        let hero_position = self.session.hero().position();
        let monster = &mut self.session.roster_mut()[monster_index];
        monster.take_damage(damage);
        let name = monster.name.clone();

        self.events.push_back(GameEvent::MonsterRetreating {
            name: name.clone(),
            position: hero_position,
        });
        self.events.push_back(GameEvent::HeroHit {
            target: name,
            damage,
        });
    }

    // ------------------------------------------------------------------
    // Trade
    // ------------------------------------------------------------------

    /// A purchase needs stock, an empty slot, and enough gold, each
    /// checked in turn; the first failure reports and aborts.
    fn buy_potion(&mut self, potion: PotionKind) {
        let Some(merchant_index) = self.session.room_partner else {
            warn!("buy issued with no room partner");
            self.events.push_back(GameEvent::InvalidCommand);
            return;
        };

        let merchant = &self.session.roster()[merchant_index];
        let stocked = match potion {
            PotionKind::Health => merchant.has_health_potion,
            PotionKind::Strength => merchant.has_strength_potion,
        };
        if !stocked {
            let merchant = merchant.name.clone();
            self.events
                .push_back(GameEvent::OutOfStock { merchant, potion });
            return;
        }

        let hero = self.session.hero();
        let owned = match potion {
            PotionKind::Health => hero.has_health_potion,
            PotionKind::Strength => hero.has_strength_potion,
        };
        if owned {
            self.events.push_back(GameEvent::AlreadyOwned { potion });
            return;
        }
        if hero.gold < config::POTION_PRICE {
            let gold = hero.gold;
            self.events
                .push_back(GameEvent::NotEnoughGold { gold, potion });
            return;
        }

        match potion {
            PotionKind::Health => {
                self.session.roster_mut()[merchant_index].has_health_potion = false;
                self.session.hero_mut().has_health_potion = true;
            }
            PotionKind::Strength => {
                self.session.roster_mut()[merchant_index].has_strength_potion = false;
                self.session.hero_mut().has_strength_potion = true;
            }
        }
        let hero = self.session.hero_mut();
        hero.gold -= config::POTION_PRICE;
        let gold_remaining = hero.gold;
        self.events.push_back(GameEvent::PotionBought {
            potion,
            gold_remaining,
        });
    }

    /// InTrade → InCombat. The merchant is reclassified as a monster
    /// for good; there is no apologizing afterwards.
    fn kill_merchant(&mut self) {
        let Some(merchant_index) = self.session.room_partner else {
            warn!("kill issued with no room partner");
            self.events.push_back(GameEvent::InvalidCommand);
            return;
        };
        let merchant = &mut self.session.roster_mut()[merchant_index];
        merchant.turn_hostile();
        let name = merchant.name.clone();
        self.events.push_back(GameEvent::MerchantProvoked { name });
        self.session.set_in_trade(false);
        self.begin_combat();
    }

    /// InTrade → Exploring.
    fn leave_trade(&mut self) {
        self.session.set_in_trade(false);
        self.events.push_back(GameEvent::TradeClosed);
    }

    // ------------------------------------------------------------------
    // Potions
    // ------------------------------------------------------------------

    /// Drinks an owned potion. The strength boost raises the damage cap
    /// immediately and runs on the turn clock in
    /// [`increment_turn`](Self::increment_turn); drinking again while
    /// boosted wastes the potion without restarting the clock.
    fn drink_potion(&mut self, potion: PotionKind) {
        let hero = self.session.hero_mut();
        match potion {
            PotionKind::Health => {
                if !hero.has_health_potion {
                    self.events.push_back(GameEvent::NoPotion);
                    return;
                }
                hero.heal(config::HEALTH_POTION_RESTORE);
                hero.has_health_potion = false;
                let stat = hero.health();
                self.events.push_back(GameEvent::PotionDrunk { potion, stat });
            }
            PotionKind::Strength => {
                if !hero.has_strength_potion {
                    self.events.push_back(GameEvent::NoPotion);
                    return;
                }
                hero.max_damage = config::HERO_BOOSTED_DAMAGE;
                hero.has_strength_potion = false;
                self.events.push_back(GameEvent::PotionDrunk {
                    potion,
                    stat: config::HERO_BOOSTED_DAMAGE,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Cleanup and terminal states
    // ------------------------------------------------------------------

    /// Tail of every state-changing command: leave combat if somebody
    /// died or the hero slipped away, then settle the consequences.
    fn finish_command(&mut self, retreated: bool) {
        if self.session.character_died || retreated {
            self.session.set_in_combat(false);
            self.run_cleanup();
        }
    }

    /// The game-over check and corpse sweep.
    ///
    /// A dead or escaped hero ends the run. Otherwise every dead
    /// non-hero is removed from the roster and its gold handed to the
    /// hero.
    fn run_cleanup(&mut self) {
        let dungeon_size = self.session.dungeon_size;

        if self.session.hero().is_dead() {
            self.session.outcome = Some(GameOutcome::Dead);
            info!("hero died on turn {}", self.session.turn_counter);
            self.events.push_back(GameEvent::HeroDied);
            return;
        }
        if self.session.hero().has_escaped(dungeon_size) {
            self.session.outcome = Some(GameOutcome::Escaped);
            info!("hero escaped on turn {}", self.session.turn_counter);
            self.events.push_back(GameEvent::HeroEscaped);
            return;
        }

        let mut index = 1;
        while index < self.session.roster().len() {
            if self.session.roster()[index].is_dead() {
                let fallen = self.session.roster_mut().remove(index);
                self.session.hero_mut().gold += fallen.gold;
                self.session.character_died = false;
                self.session.room_partner = None;
                self.events.push_back(GameEvent::CharacterPerished {
                    name: fallen.name,
                    gold: fallen.gold,
                });
            } else {
                index += 1;
            }
        }
    }

    /// GameOver(Escaped) → Exploring, by explicit player choice.
    ///
    /// The dungeon keeps its size but is repopulated from scratch; the
    /// hero keeps name, gold, and potions, and starts over at the
    /// entrance with fresh combat stats.
    pub fn rerun(&mut self) -> CrawlResult<()> {
        if self.session.outcome != Some(GameOutcome::Escaped) {
            return Err(CrawlError::InvalidState(
                "rerun is only available after an escape".to_string(),
            ));
        }

        self.session.roster_mut().truncate(1);
        let dungeon_size = self.session.dungeon_size;
        let hero = self.session.hero_mut();
        hero.set_health(config::HERO_STARTING_HEALTH);
        hero.max_damage = config::HERO_BASE_DAMAGE;
        hero.set_position(Position::entrance(), dungeon_size)?;

        self.session.turn_counter = 0;
        self.session.potion_turn_counter = 0;
        self.session.room_partner = None;
        self.session.character_died = false;
        self.session.set_in_combat(false);
        self.session.set_in_trade(false);
        self.session.save_loading = false;
        self.session.outcome = None;

        crate::generation::populate(&mut self.session, &mut self.rng);
        info!(
            "rerun: repopulated dungeon of size {} with {} characters",
            dungeon_size,
            self.session.roster().len()
        );
        self.events.push_back(GameEvent::Welcome);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence facade
    // ------------------------------------------------------------------

    /// Save file names in selection order, 1-indexed for the player.
    pub fn list_saves(&self) -> CrawlResult<Vec<String>> {
        self.saves.list()
    }

    /// Writes the session to a new save file. Mid-combat and mid-trade
    /// saving is refused; failures are reported, never fatal.
    pub fn save_game(&mut self) {
        if self.session.in_trade() {
            self.events
                .push_back(GameEvent::SaveUnavailable { in_combat: false });
            return;
        }
        if self.session.in_combat() {
            self.events
                .push_back(GameEvent::SaveUnavailable { in_combat: true });
            return;
        }

        match self.saves.write(&self.session) {
            Ok(file_name) => {
                info!("session saved as {file_name}");
                self.events.push_back(GameEvent::SaveCreated { file_name });
            }
            Err(err) => {
                error!("save failed: {err}");
                self.events.push_back(GameEvent::SaveFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Opens the save menu: lists files and switches input to numeric
    /// selection. With nothing to load the session is left untouched.
    fn open_load_menu(&mut self) {
        if self.session.in_trade() {
            self.events
                .push_back(GameEvent::LoadUnavailable { in_combat: false });
            return;
        }
        if self.session.in_combat() {
            self.events
                .push_back(GameEvent::LoadUnavailable { in_combat: true });
            return;
        }

        match self.saves.list() {
            Ok(files) if files.is_empty() => {
                self.events.push_back(GameEvent::NoSavesAvailable);
            }
            Ok(files) => {
                self.session.save_loading = true;
                self.events.push_back(GameEvent::SaveListing { files });
            }
            Err(err) => {
                error!("listing saves failed: {err}");
                self.events.push_back(GameEvent::SaveFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Restores the 1-indexed save file. The previous session survives
    /// any failure: the parsed state is committed only when the whole
    /// file read cleanly.
    pub fn load_game(&mut self, selection: usize) {
        let restored = match self.saves.read_selection(selection) {
            Ok(restored) => restored,
            Err(CrawlError::InvalidState(_)) => {
                self.events.push_back(GameEvent::InvalidSaveSelection);
                return;
            }
            Err(err) => {
                warn!("load failed: {err}");
                self.events.push_back(GameEvent::SaveFailed {
                    reason: err.to_string(),
                });
                return;
            }
        };

        let file_name = restored.file_name.clone();
        let language = self.session.language;
        self.session = restored.into_session();
        self.session.language = language;
        self.is_admin = self.session.hero().name.eq_ignore_ascii_case("admin");

        info!("session restored from {file_name}");
        self.events.push_back(GameEvent::SaveLoaded { file_name });
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Switches the presentation language, falling back to English
    /// (with a notice) for anything unsupported.
    pub fn set_language(&mut self, name: &str) {
        match Language::parse(name) {
            Some(language) => {
                self.session.language = language;
                self.events.push_back(GameEvent::LanguageChanged { language });
            }
            None => {
                warn!("unsupported language requested: {name}");
                self.session.language = Language::default();
                self.events.push_back(GameEvent::LanguageRejected);
            }
        }
    }

    /// Flips between the two supported languages.
    pub fn toggle_language(&mut self) {
        let language = self.session.language.toggled();
        self.session.language = language;
        self.events.push_back(GameEvent::LanguageChanged { language });
    }

    /// Flips whether either side may retreat from combat.
    pub fn toggle_retreat(&mut self) {
        self.session.can_retreat = !self.session.can_retreat;
        self.events.push_back(GameEvent::RetreatToggled {
            enabled: self.session.can_retreat,
        });
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    fn admin_command(&mut self, command: AdminCommand) {
        if !self.is_admin {
            self.events.push_back(GameEvent::AdminDenied);
            return;
        }

        match command {
            AdminCommand::Perish => {
                self.session.hero_mut().set_health(0);
                self.run_cleanup();
            }
            AdminCommand::Escape => {
                let dungeon_size = self.session.dungeon_size;
                let exit = Position::exit(dungeon_size);
                // The exit is always in range, so this cannot fail.
                if let Err(err) = self.session.hero_mut().set_position(exit, dungeon_size) {
                    error!("escape diagnostic failed: {err}");
                    return;
                }
                self.run_cleanup();
            }
            AdminCommand::ListRoster => {
                let lines = self
                    .session
                    .roster()
                    .iter()
                    .map(Character::status_line)
                    .collect();
                self.events.push_back(GameEvent::RosterListing { lines });
            }
            AdminCommand::ShowSize => {
                self.events.push_back(GameEvent::DungeonSizeReport {
                    size: self.session.dungeon_size,
                });
            }
            AdminCommand::ShowFlags => {
                self.events.push_back(GameEvent::FlagsReport {
                    in_combat: self.session.in_combat(),
                    in_trade: self.session.in_trade(),
                    save_loading: self.session.save_loading,
                });
            }
            AdminCommand::LanguageProbe => {
                self.set_language("non-valid-language-setting");
            }
            AdminCommand::GrantGold => {
                let hero = self.session.hero_mut();
                hero.gold += 100;
                let gold = hero.gold;
                self.events.push_back(GameEvent::GoldGranted { gold });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Character, CharacterKind, GameSession, Position};

    fn goblin(position: Position) -> Character {
        Character::new(
            "Goblin 1",
            15,
            CharacterKind::Monster,
            5,
            position,
            5,
            false,
            false,
        )
    }

    fn engine_with(session: GameSession, seed: u64) -> GameEngine {
        GameEngine::with_session(session, seed, "target/test-saves")
    }

    /// Hero and a goblin in one room, combat already joined.
    fn combat_session(hero_health: i32) -> GameSession {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_health(hero_health);
        hero.set_position(Position::new(2, 2), 6).unwrap();
        session.push_character(hero);
        session.push_character(goblin(Position::new(2, 2)));
        session.detect_room_partner();
        session.set_in_combat(true);
        session
    }

    #[test]
    fn test_fight_exchange_bounds() {
        let mut engine = engine_with(combat_session(100), 7);
        engine.fight();

        let events = engine.drain_events();
        let session = engine.session();
        let hero_hit = events.iter().find_map(|e| match e {
            GameEvent::HeroHit { damage, .. } => Some(*damage),
            _ => None,
        });
        let damage = hero_hit.expect("hero swings exactly once");
        assert!((0..25).contains(&damage));

        if damage >= 15 {
            // A kill: no counter-attack, goblin removed, gold awarded.
            assert!(!events
                .iter()
                .any(|e| matches!(e, GameEvent::HeroStruck { .. })));
            assert_eq!(session.roster().len(), 1);
            assert_eq!(session.hero().gold, 5);
            assert!(!session.in_combat());
        } else {
            // Goblin survived: counter-hit in [0, 5), plus the turn
            // toll of 2, and the fight goes on.
            let counter = events
                .iter()
                .find_map(|e| match e {
                    GameEvent::HeroStruck { damage, .. } => Some(*damage),
                    _ => None,
                })
                .expect("surviving goblin strikes back");
            assert!((0..5).contains(&counter));
            assert_eq!(session.hero().health(), 100 - counter - 2);
            assert!(session.in_combat());
        }
    }

    #[test]
    fn test_retreat_blocked_changes_nothing() {
        let mut session = combat_session(100);
        session.can_retreat = false;
        let mut engine = engine_with(session, 3);

        engine.hero_retreat();

        let events = engine.drain_events();
        assert_eq!(events, vec![GameEvent::RetreatBlocked]);
        assert_eq!(engine.session().hero().health(), 100);
        assert!(engine.session().in_combat());
    }

    #[test]
    fn test_hero_retreat_leaves_combat_or_ends_run() {
        let mut engine = engine_with(combat_session(100), 11);
        engine.hero_retreat();

        // Worst case the goblin hits for 4 plus the turn toll of 2, so
        // a 100-health hero always survives a retreat from a goblin.
        assert!(!engine.session().in_combat());
        assert!(engine.outcome().is_none());
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::HeroRetreated { .. })));
    }

    #[test]
    fn test_wounded_hero_forces_combat() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_health(60);
        hero.set_position(Position::new(1, 2), 6).unwrap();
        session.push_character(hero);
        session.push_character(goblin(Position::new(2, 2)));
        let mut engine = engine_with(session, 5);

        engine.move_hero(Direction::East);

        assert!(engine.session().in_combat());
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CombatStarted { .. })));
    }

    #[test]
    fn test_monster_event_fights_or_flees() {
        for seed in 0..8 {
            let mut session = GameSession::new(6);
            let mut hero = Character::hero("Tester");
            hero.set_position(Position::new(1, 2), 6).unwrap();
            session.push_character(hero);
            session.push_character(goblin(Position::new(2, 2)));
            let mut engine = engine_with(session, seed);

            engine.move_hero(Direction::East);

            let events = engine.drain_events();
            let session = engine.session();
            if session.in_combat() {
                assert!(events
                    .iter()
                    .any(|e| matches!(e, GameEvent::CombatStarted { .. })));
            } else {
                // Flee path: the goblin took a hit and either died
                // (roster shrank, gold moved) or ran.
                assert!(events.iter().any(|e| matches!(
                    e,
                    GameEvent::MonsterFled { .. } | GameEvent::CharacterPerished { .. }
                )));
                assert_eq!(session.room_partner, None);
            }
        }
    }

    #[test]
    fn test_mimic_treasure_or_reveal() {
        for seed in 0..8 {
            let mut session = GameSession::new(6);
            let mut hero = Character::hero("Tester");
            hero.set_position(Position::new(1, 2), 6).unwrap();
            session.push_character(hero);
            session.push_character(Character::new(
                "Mimic 1",
                40,
                CharacterKind::Mimic,
                15,
                Position::new(2, 2),
                13,
                false,
                false,
            ));
            let mut engine = engine_with(session, seed);

            engine.move_hero(Direction::East);

            let session = engine.session();
            if session.in_combat() {
                // Revealed: the kind change is permanent, so the
                // treasure branch can never run for this one again.
                assert_eq!(session.roster()[1].kind, CharacterKind::Monster);
                assert_eq!(session.hero().gold, 0);
            } else {
                assert_eq!(session.roster().len(), 1);
                assert_eq!(session.hero().gold, config::CHEST_REWARD);
            }
        }
    }

    #[test]
    fn test_merchant_opens_trade() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_position(Position::new(1, 2), 6).unwrap();
        session.push_character(hero);
        session.push_character(Character::merchant(1, Position::new(2, 2)));
        let mut engine = engine_with(session, 9);

        engine.move_hero(Direction::East);

        assert!(engine.session().in_trade());
        assert!(!engine.session().in_combat());
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TradeOpened {
                sells_health: true,
                sells_strength: true,
                ..
            }
        )));
    }

    fn trade_session(hero_gold: i32) -> GameSession {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.gold = hero_gold;
        hero.set_position(Position::new(2, 2), 6).unwrap();
        session.push_character(hero);
        session.push_character(Character::merchant(1, Position::new(2, 2)));
        session.detect_room_partner();
        session.set_in_trade(true);
        session
    }

    #[test]
    fn test_purchase_rejected_without_gold() {
        let mut engine = engine_with(trade_session(0), 1);
        engine.buy_potion(PotionKind::Health);

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::NotEnoughGold { gold: 0, .. })));
        let session = engine.session();
        assert_eq!(session.hero().gold, 0);
        assert!(!session.hero().has_health_potion);
        assert!(session.roster()[1].has_health_potion, "stock untouched");
    }

    #[test]
    fn test_purchase_moves_stock_and_gold() {
        let mut engine = engine_with(trade_session(60), 1);
        engine.buy_potion(PotionKind::Strength);

        let session = engine.session();
        assert_eq!(session.hero().gold, 10);
        assert!(session.hero().has_strength_potion);
        assert!(!session.roster()[1].has_strength_potion);

        // A second strength potion cannot be bought: sold out, and the
        // hero already holds one.
        engine.buy_potion(PotionKind::Strength);
        assert_eq!(engine.session().hero().gold, 10);
    }

    #[test]
    fn test_kill_merchant_is_permanent() {
        let mut engine = engine_with(trade_session(0), 1);
        engine.kill_merchant();

        let session = engine.session();
        assert_eq!(session.roster()[1].kind, CharacterKind::Monster);
        assert!(session.in_combat());
        assert!(!session.in_trade());
    }

    #[test]
    fn test_strength_potion_runs_out_after_five_turns() {
        let mut session = GameSession::new(9);
        let mut hero = Character::hero("Tester");
        hero.has_strength_potion = true;
        session.push_character(hero);
        let mut engine = engine_with(session, 21);

        engine.drink_potion(PotionKind::Strength);
        assert_eq!(engine.session().hero().max_damage, 50);

        // Pace the empty dungeon; the boost must hold through four
        // turn increments and lapse exactly on the fifth.
        for turn in 0..4 {
            let direction = if turn % 2 == 0 {
                Direction::East
            } else {
                Direction::West
            };
            engine.move_hero(direction);
            assert_eq!(engine.session().hero().max_damage, 50, "turn {turn}");
        }
        engine.move_hero(Direction::East);
        assert_eq!(engine.session().hero().max_damage, 25);
        assert_eq!(engine.session().potion_turn_counter, 0);
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::StrengthExpired { max_damage: 25 })));
    }

    #[test]
    fn test_health_potion_heals_and_is_consumed() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_health(40);
        hero.has_health_potion = true;
        session.push_character(hero);
        let mut engine = engine_with(session, 2);

        engine.drink_potion(PotionKind::Health);
        assert_eq!(engine.session().hero().health(), 65);
        assert!(!engine.session().hero().has_health_potion);

        engine.drink_potion(PotionKind::Health);
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::NoPotion));
        assert_eq!(engine.session().hero().health(), 65);
    }

    #[test]
    fn test_move_onto_exit_ends_run() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_position(Position::new(5, 4), 6).unwrap();
        session.push_character(hero);
        let mut engine = engine_with(session, 2);

        engine.move_hero(Direction::South);

        assert_eq!(engine.outcome(), Some(GameOutcome::Escaped));
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::HeroEscaped));
    }

    #[test]
    fn test_decay_death_ends_run() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_health(2);
        session.push_character(hero);
        let mut engine = engine_with(session, 2);

        engine.move_hero(Direction::East);

        assert_eq!(engine.outcome(), Some(GameOutcome::Dead));
        assert_eq!(engine.session().hero().health(), 0);
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::HeroDied));
    }

    #[test]
    fn test_edge_move_rejected_without_mutation() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_position(Position::new(4, 5), 6).unwrap();
        session.push_character(hero);
        let mut engine = engine_with(session, 2);

        engine.move_hero(Direction::South);

        assert_eq!(engine.session().hero().position(), Position::new(4, 5));
        assert_eq!(engine.session().turn_counter, 0);
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::MoveBlocked));
    }

    #[test]
    fn test_rerun_requires_escape() {
        let mut session = GameSession::new(6);
        session.push_character(Character::hero("Tester"));
        let mut engine = engine_with(session, 2);
        assert!(engine.rerun().is_err());
    }

    #[test]
    fn test_rerun_resets_session_but_keeps_loot() {
        let mut session = GameSession::new(6);
        let mut hero = Character::hero("Tester");
        hero.set_position(Position::new(5, 4), 6).unwrap();
        hero.gold = 77;
        hero.has_health_potion = true;
        session.push_character(hero);
        session.turn_counter = 40;
        let mut engine = engine_with(session, 2);

        engine.move_hero(Direction::South);
        assert_eq!(engine.outcome(), Some(GameOutcome::Escaped));

        engine.rerun().unwrap();
        let session = engine.session();
        assert_eq!(session.outcome, None);
        assert_eq!(session.turn_counter, 0);
        assert_eq!(session.hero().position(), Position::entrance());
        assert_eq!(session.hero().health(), 100);
        assert_eq!(session.hero().gold, 77);
        assert!(session.hero().has_health_potion);
        assert!(session.roster().len() > 1, "dungeon repopulated");
        assert_eq!(session.dungeon_size, 6);
    }

    #[test]
    fn test_admin_commands_are_gated() {
        let mut session = GameSession::new(6);
        session.push_character(Character::hero("Tester"));
        let mut engine = engine_with(session, 2);

        engine.issue_command("money");
        assert_eq!(engine.session().hero().gold, 0);
        assert!(engine.drain_events().contains(&GameEvent::AdminDenied));

        engine.set_admin(true);
        engine.issue_command("money");
        assert_eq!(engine.session().hero().gold, 100);
        assert!(engine
            .drain_events()
            .contains(&GameEvent::GoldGranted { gold: 100 }));
    }

    #[test]
    fn test_admin_perish_and_language_probe() {
        let mut session = GameSession::new(6);
        session.push_character(Character::hero("admin"));
        let mut engine = engine_with(session, 2);
        engine.set_admin(true);

        engine.issue_command("status");
        engine.issue_command("size");
        engine.issue_command("lang");
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::FlagsReport {
                in_combat: false,
                in_trade: false,
                save_loading: false
            }
        )));
        assert!(events.contains(&GameEvent::DungeonSizeReport { size: 6 }));
        assert!(events.contains(&GameEvent::LanguageRejected));
        assert_eq!(engine.session().language, Language::English);

        engine.issue_command("perish");
        assert_eq!(engine.outcome(), Some(GameOutcome::Dead));
    }

    #[test]
    fn test_invalid_input_reports_and_preserves_state() {
        let mut session = GameSession::new(6);
        session.push_character(Character::hero("Tester"));
        let mut engine = engine_with(session, 2);

        engine.issue_command("dance");

        let events = engine.drain_events();
        assert_eq!(events, vec![GameEvent::InvalidCommand]);
        assert_eq!(engine.session().turn_counter, 0);
        assert_eq!(engine.session().hero().health(), 100);
    }

    #[test]
    fn test_save_refused_in_combat() {
        let mut engine = engine_with(combat_session(100), 2);
        engine.issue_command("save");
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::SaveUnavailable { in_combat: true }));
    }
}
