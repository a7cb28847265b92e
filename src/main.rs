//! # Gloomcrawl Terminal Front End
//!
//! A stdin/stdout driver for the engine: reads one command per line,
//! hands it to the engine, and renders the queued events in the
//! session's language. All game rules live in the library; this file
//! only translates events to text.

use clap::Parser;
use gloomcrawl::{
    config, DisplayState, GameEngine, GameEvent, GameOutcome, HelpContext, Language, PotionKind,
};
use log::info;
use std::io::{self, BufRead, Write};

/// Command line arguments for the Gloomcrawl terminal front end.
#[derive(Parser, Debug)]
#[command(name = "gloomcrawl")]
#[command(about = "A turn-based dungeon crawler in your terminal")]
#[command(version)]
struct Args {
    /// Hero name; naming the hero "admin" unlocks diagnostic commands
    #[arg(short = 'n', long, default_value = "Hero")]
    hero: String,

    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Presentation language (english or german)
    #[arg(short, long, default_value = "english")]
    language: String,

    /// Directory for save files
    #[arg(long, default_value = config::DEFAULT_SAVE_DIR)]
    save_dir: String,
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    info!("starting gloomcrawl v{}", gloomcrawl::VERSION);
    let mut engine = GameEngine::initialize(&args.hero, args.seed, &args.save_dir);
    engine.set_language(&args.language);
    render_events(&mut engine);
    print_status(&engine);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let language = engine.session().language;
        if is_exit(input) {
            break;
        }

        // Settings toggles live in the front end, next to the prompt
        // that owns them.
        if input.eq_ignore_ascii_case("toggle retreat") {
            engine.toggle_retreat();
            render_events(&mut engine);
            continue;
        }
        if input.eq_ignore_ascii_case("toggle language") {
            engine.toggle_language();
            render_events(&mut engine);
            continue;
        }

        // After an escape the front end owns the "keep going?" prompt;
        // everything else goes straight to the engine.
        if engine.outcome() == Some(GameOutcome::Escaped) && is_affirmative(input) {
            if engine.rerun().is_ok() {
                render_events(&mut engine);
                print_status(&engine);
            }
            continue;
        }

        engine.issue_command(input);
        render_events(&mut engine);

        match engine.outcome() {
            None => print_status(&engine),
            Some(GameOutcome::Escaped) => println!(
                "{}",
                localize(
                    language,
                    "You escaped the dungeon! Keep exploring a fresh one? (yes / exit)",
                    "Sie sind aus dem Kerker entkommen! Weiter erkunden? (ja / beenden)",
                )
            ),
            Some(GameOutcome::Dead) => println!(
                "{}",
                localize(
                    language,
                    "You have perished. Type \"load\" to restore a save, or \"exit\".",
                    "Sie sind gestorben. Geben Sie \"laden\" oder \"beenden\" ein.",
                )
            ),
        }
    }

    info!("goodbye");
    Ok(())
}

fn is_exit(input: &str) -> bool {
    matches!(
        input.to_lowercase().as_str(),
        "exit" | "quit" | "beenden" | "ende"
    )
}

fn is_affirmative(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "yes" | "y" | "ja" | "j")
}

fn localize(language: Language, english: &str, german: &str) -> String {
    match language {
        Language::English => english.to_string(),
        Language::German => german.to_string(),
    }
}

fn potion_name(language: Language, potion: PotionKind) -> &'static str {
    match (language, potion) {
        (Language::English, PotionKind::Health) => "health potion",
        (Language::English, PotionKind::Strength) => "strength potion",
        (Language::German, PotionKind::Health) => "Heiltrank",
        (Language::German, PotionKind::Strength) => "Krafttrank",
    }
}

fn render_events(engine: &mut GameEngine) {
    let language = engine.session().language;
    for event in engine.drain_events() {
        for text in render_event(&event, language) {
            println!("{text}");
        }
    }
    let _ = io::stdout().flush();
}

fn print_status(engine: &GameEngine) {
    let language = engine.session().language;
    let DisplayState {
        health,
        max_damage,
        position,
        nearby_monster_count,
        turn,
        gold,
        has_health_potion,
        has_strength_potion,
    } = engine.display_state();

    let owned = |flag: bool| match (language, flag) {
        (Language::English, true) => "owned",
        (Language::English, false) => "none",
        (Language::German, true) => "besitzt",
        (Language::German, false) => "kein",
    };

    match language {
        Language::English => println!(
            "[turn {turn}] room {position} | health {health} | damage {max_damage} | gold {gold} | \
             monsters nearby: {nearby_monster_count} | potions: health {}, strength {}",
            owned(has_health_potion),
            owned(has_strength_potion),
        ),
        Language::German => println!(
            "[Zug {turn}] Raum {position} | Gesundheit {health} | Schaden {max_damage} | Geld {gold} | \
             Monster in der Nähe: {nearby_monster_count} | Tränke: Heil {}, Kraft {}",
            owned(has_health_potion),
            owned(has_strength_potion),
        ),
    }
}

/// Renders one event into zero or more output lines.
fn render_event(event: &GameEvent, language: Language) -> Vec<String> {
    use GameEvent::*;
    let line = |text: String| vec![text];

    match event {
        Welcome => line(localize(
            language,
            "Welcome to the Dungeon!",
            "Willkommen im Kerker!",
        )),
        MoveBlocked => line(localize(
            language,
            "You can't move that way!",
            "Sie können sich nicht in diese Richtung bewegen!",
        )),
        GoldFound { amount, position } => line(match language {
            Language::English => format!("You found {amount} gold at {position}"),
            Language::German => format!("Sie haben {amount} Geld an {position} gefunden"),
        }),
        TradeOpened {
            merchant,
            sells_health,
            sells_strength,
            price,
        } => {
            let mut lines = vec![localize(language, "~ Trade Menu ~", "~ Handelsmenü ~")];
            for (stocked, potion) in [
                (*sells_health, PotionKind::Health),
                (*sells_strength, PotionKind::Strength),
            ] {
                let potion = potion_name(language, potion);
                lines.push(match (language, stocked) {
                    (Language::English, true) => {
                        format!("{merchant} is selling a {potion} for {price} gold")
                    }
                    (Language::English, false) => {
                        format!("{merchant} does not have a {potion} for sale")
                    }
                    (Language::German, true) => {
                        format!("{merchant} verkauft einen {potion} für {price} Geld")
                    }
                    (Language::German, false) => format!("{merchant} verkauft keine {potion}e"),
                });
            }
            lines.push(localize(
                language,
                "What would you like to buy?",
                "Was möchten Sie kaufen?",
            ));
            lines
        }
        MonsterFled { name } => line(match language {
            Language::English => format!("{name} ran away from the fight!"),
            Language::German => format!("{name} hat sich aus dem Kampf zurückgezogen!"),
        }),
        MonsterRetreating { name, position } => line(match language {
            Language::English => format!("{name} is retreating from {position}!"),
            Language::German => format!("{name} zieht sich aus {position} zurück!"),
        }),
        HeroHit { target, damage } => line(match language {
            Language::English => format!("You hit {target} for {damage} damage"),
            Language::German => {
                format!("Sie haben {target} für {damage} Schadenspunkte geschlagen")
            }
        }),
        HeroStruck { attacker, damage } => line(match language {
            Language::English => format!("{attacker} hits you for {damage} damage"),
            Language::German => {
                format!("{attacker} hat Sie für {damage} Schadenspunkte geschlagen")
            }
        }),
        TreasureFound { position, reward } => line(match language {
            Language::English => {
                format!("At {position} you find a treasure chest and inside you find {reward} gold")
            }
            Language::German => format!(
                "An {position} gibt es eine Schatzkiste. Drinnen haben Sie {reward} Geld gefunden"
            ),
        }),
        MimicAttacks { position } => line(match language {
            Language::English => {
                format!("At {position} you find a treasure chest and it attacks you!")
            }
            Language::German => {
                format!("An {position} gibt es eine Schatzkiste und sie greift Sie an!")
            }
        }),
        CombatStarted {
            opponent,
            opponent_position,
            opponent_health,
            hero_health,
        } => match language {
            Language::English => vec![
                format!("~ Fight with {opponent} ~"),
                format!(
                    "You with {hero_health} health versus {opponent} at {opponent_position} \
                     with {opponent_health} health"
                ),
                "What would you like to do?".to_string(),
            ],
            Language::German => vec![
                format!("~ Kampf mit {opponent} ~"),
                format!(
                    "Sie mit {hero_health} Gesundheit gegen {opponent} an {opponent_position} \
                     mit {opponent_health} Gesundheit"
                ),
                "Was möchten Sie tun?".to_string(),
            ],
        },
        CharacterPerished { name, gold } => match language {
            Language::English => vec![
                format!("{name} has perished!"),
                format!("You gained {gold} gold from this fight"),
            ],
            Language::German => vec![
                format!("{name} ist gestorben!"),
                format!("Sie haben in diesem Kampf {gold} Geld erhalten"),
            ],
        },
        RetreatBlocked => line(localize(
            language,
            "You can't retreat from this battle!",
            "Sie können sich aus diesem Kampf nicht zurückziehen!",
        )),
        HeroRetreated { health } => line(match language {
            Language::English => {
                format!("You retreated from battle with {health} health remaining")
            }
            Language::German => format!(
                "Sie haben sich aus diesem Kampf zurückgezogen mit {health} Gesundheitspunkten übrig"
            ),
        }),
        PotionDrunk { potion, stat } => line(match (language, potion) {
            (Language::English, PotionKind::Health) => {
                format!("You consumed a health potion. Your health is now {stat}")
            }
            (Language::English, PotionKind::Strength) => {
                format!("You consumed a strength potion! Your max damage is now {stat}")
            }
            (Language::German, PotionKind::Health) => {
                format!("Sie haben einen Heiltrank getrunken. Ihre Gesundheit beträgt jetzt {stat}")
            }
            (Language::German, PotionKind::Strength) => {
                format!("Sie haben einen Krafttrank getrunken. Ihr maximaler Schaden beträgt jetzt {stat}")
            }
        }),
        NoPotion => line(localize(
            language,
            "You don't have a potion to consume",
            "Sie haben keinen Trank zu trinken",
        )),
        StrengthExpired { max_damage } => line(match language {
            Language::English => {
                format!("The strength potion ran out! Your max damage is now {max_damage}")
            }
            Language::German => format!(
                "Der Krafttrank ist aufgebraucht! Ihr maximaler Schaden beträgt jetzt {max_damage}"
            ),
        }),
        PotionBought {
            potion,
            gold_remaining,
        } => line(match language {
            Language::English => format!(
                "You bought a {} and have {gold_remaining} gold remaining",
                potion_name(language, *potion)
            ),
            Language::German => format!(
                "Sie haben einen {} gekauft und haben noch {gold_remaining} Geld übrig",
                potion_name(language, *potion)
            ),
        }),
        OutOfStock { merchant, potion } => line(match language {
            Language::English => format!(
                "{merchant} does not have a {} for sale",
                potion_name(language, *potion)
            ),
            Language::German => {
                format!("{merchant} verkauft keinen {}", potion_name(language, *potion))
            }
        }),
        AlreadyOwned { potion } => line(match language {
            Language::English => format!(
                "You already have a {} in your inventory",
                potion_name(language, *potion)
            ),
            Language::German => format!(
                "Sie haben schon einen {} im Inventar",
                potion_name(language, *potion)
            ),
        }),
        NotEnoughGold { gold, potion } => line(match language {
            Language::English => format!(
                "{gold} gold is not enough to purchase a {}",
                potion_name(language, *potion)
            ),
            Language::German => format!(
                "{gold} Geld ist nicht genug, um einen {} zu kaufen",
                potion_name(language, *potion)
            ),
        }),
        MerchantProvoked { name } => line(match language {
            Language::English => format!("{name} will remember this. Steel is drawn!"),
            Language::German => format!("{name} wird sich das merken. Die Klingen sind gezogen!"),
        }),
        TradeClosed => line(localize(
            language,
            "You leave the merchant behind.",
            "Sie lassen den Händler zurück.",
        )),
        HeroDied => line(localize(
            language,
            "Your journey ends here.",
            "Ihre Reise endet hier.",
        )),
        HeroEscaped => line(localize(
            language,
            "Daylight! You step out of the dungeon.",
            "Tageslicht! Sie treten aus dem Kerker.",
        )),
        SaveCreated { file_name } => line(match language {
            Language::English => format!("Your game has been saved as: {file_name}"),
            Language::German => format!("Das Spiel ist als {file_name} gespeichert"),
        }),
        SaveFailed { reason } => line(match language {
            Language::English => format!("Error: your game could not be saved or loaded ({reason})"),
            Language::German => {
                format!("Fehler: Das Spiel konnte nicht gespeichert oder geladen werden ({reason})")
            }
        }),
        SaveUnavailable { in_combat } => line(localize(
            language,
            if *in_combat {
                "You cannot save while in combat"
            } else {
                "You cannot save while trading"
            },
            if *in_combat {
                "Sie können nicht speichern, während Sie im Kampf sind"
            } else {
                "Sie können während des Handels nicht speichern"
            },
        )),
        LoadUnavailable { in_combat } => line(localize(
            language,
            if *in_combat {
                "You cannot load a save while in combat"
            } else {
                "You cannot load a save while trading"
            },
            if *in_combat {
                "Sie können nicht laden, während Sie im Kampf sind"
            } else {
                "Sie können während des Handels nicht laden"
            },
        )),
        SaveListing { files } => {
            let mut lines = vec![localize(language, "~ Save Menu ~", "~ Speicherdateien Menü ~")];
            for (index, file) in files.iter().enumerate() {
                lines.push(format!("{}: {}", index + 1, file));
            }
            lines.push(match language {
                Language::English => format!(
                    "Which save file would you like to load from (select from 1-{})?",
                    files.len()
                ),
                Language::German => format!(
                    "Welche Speicherdatei möchten Sie laden (wählen Sie 1-{})?",
                    files.len()
                ),
            });
            lines
        }
        NoSavesAvailable => line(localize(
            language,
            "There are no saves to load from. Make sure to save regularly!",
            "Es gibt keine Speicherdateien, die Sie laden können.",
        )),
        SaveLoaded { file_name } => line(match language {
            Language::English => format!("Successfully loaded from {file_name}"),
            Language::German => format!("Erfolgreich geladen aus {file_name}"),
        }),
        InvalidSaveSelection => line(localize(
            language,
            "That's not a valid save file!",
            "Das ist keine gültige Speicherdatei!",
        )),
        InvalidCommand => line(localize(
            language,
            "That's not a valid input!",
            "Das ist keine gültige Eingabe!",
        )),
        AdminDenied => line(localize(
            language,
            "This command is not available to non-admin users",
            "Dieser Befehl ist für Nicht-Admin-Benutzer nicht verfügbar",
        )),
        // Diagnostic output stays English, like the logs.
        RosterListing { lines } => lines.clone(),
        DungeonSizeReport { size } => line(format!("Size: {size}")),
        FlagsReport {
            in_combat,
            in_trade,
            save_loading,
        } => line(format!(
            "Combat: {in_combat}, Trade: {in_trade}, Loading Save: {save_loading}"
        )),
        GoldGranted { gold } => line(format!("The hero's purse now holds {gold} gold")),
        LanguageRejected => line(
            "That language is not supported; falling back to English.".to_string(),
        ),
        LanguageChanged { language } => line(match language {
            Language::English => "The game language is set to English.".to_string(),
            Language::German => "Die Spielsprache wurde auf Deutsch gesetzt.".to_string(),
        }),
        RetreatToggled { enabled } => line(match (language, *enabled) {
            (Language::English, true) => "Characters can retreat: Yes".to_string(),
            (Language::English, false) => "Characters can retreat: No".to_string(),
            (Language::German, true) => "Charaktere können sich zurückziehen: Ja".to_string(),
            (Language::German, false) => "Charaktere können sich zurückziehen: Nein".to_string(),
        }),
        HelpShown { context } => help_lines(language, *context),
    }
}

fn help_lines(language: Language, context: HelpContext) -> Vec<String> {
    let text = match (language, context) {
        (Language::English, HelpContext::Exploring) => {
            "Commands: go north / go south / go east / go west, drink health potion, \
             drink strength potion, save, load, help"
        }
        (Language::English, HelpContext::Combat) => {
            "Commands: fight, retreat, drink health potion, drink strength potion, help"
        }
        (Language::English, HelpContext::Trade) => {
            "Commands: buy health potion, buy strength potion, leave, kill merchant, help"
        }
        (Language::English, HelpContext::SaveSelect) => {
            "Enter the number of the save file you wish to load from."
        }
        (Language::German, HelpContext::Exploring) => {
            "Befehle: geh nord / geh süd / geh ost / geh west, trink heiltrank, \
             trink krafttrank, speichern, laden, hilfe"
        }
        (Language::German, HelpContext::Combat) => {
            "Befehle: kampf, zurückziehen, trink heiltrank, trink krafttrank, hilfe"
        }
        (Language::German, HelpContext::Trade) => {
            "Befehle: kaufe heiltrank, kaufe krafttrank, verlassen, töten, hilfe"
        }
        (Language::German, HelpContext::SaveSelect) => {
            "Geben Sie die Nummer der Speicherdatei ein, die Sie laden möchten."
        }
    };
    vec![text.to_string()]
}
