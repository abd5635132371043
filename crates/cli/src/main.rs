use sixtakes_core::{
    Engine, Event, EventBus, GameError, GameId, GameStatus, MemoryStore, Placement, PlayerId,
    RngState,
};
use sixtakes_data::{load_game_config, populate};
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Catalog,
    Simulate,
    Help,
}

#[derive(Debug, Clone)]
struct CliOptions {
    command: Command,
    seed: u64,
    bots: usize,
    config: PathBuf,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let command = match args.next().as_deref() {
            None | Some("help") | Some("-h") | Some("--help") => Command::Help,
            Some("catalog") => Command::Catalog,
            Some("simulate") => Command::Simulate,
            Some(other) => return Err(format!("unknown command {other:?}")),
        };
        let mut options = Self {
            command,
            seed: 1,
            bots: 3,
            config: PathBuf::from("config.json"),
        };
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--seed" => {
                    let raw = expect_value(&mut args, "--seed")?;
                    options.seed = raw
                        .parse()
                        .map_err(|_| format!("--seed expects a number, got {raw:?}"))?;
                }
                "--bots" => {
                    let raw = expect_value(&mut args, "--bots")?;
                    options.bots = raw
                        .parse()
                        .map_err(|_| format!("--bots expects a number, got {raw:?}"))?;
                }
                "--config" => {
                    options.config = PathBuf::from(expect_value(&mut args, "--config")?);
                }
                other => return Err(format!("unknown option {other:?}")),
            }
        }
        Ok(options)
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} expects a value"))
}

fn print_usage() {
    println!("sixtakes <command> [options]");
    println!();
    println!("commands:");
    println!("  catalog          print the seeded card catalog as JSON");
    println!("  simulate         play a full game against bots and print the log");
    println!("  help             show this message");
    println!();
    println!("options:");
    println!("  --seed <n>       RNG seed (default 1)");
    println!("  --bots <n>       bots at the table for simulate (default 3)");
    println!("  --config <path>  JSON config file (default config.json)");
}

fn main() {
    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            std::process::exit(2);
        }
    };
    let outcome = match options.command {
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Catalog => run_catalog(&options),
        Command::Simulate => run_simulate(&options),
    };
    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_catalog(options: &CliOptions) -> Result<(), Box<dyn Error>> {
    let config = load_game_config(&options.config)?;
    let cards = sixtakes_core::full_deck(config.max_card_number);
    println!("{}", serde_json::to_string_pretty(&cards)?);
    Ok(())
}

fn run_simulate(options: &CliOptions) -> Result<(), Box<dyn Error>> {
    if options.bots == 0 {
        return Err("simulate needs at least one bot at the table".into());
    }
    let config = load_game_config(&options.config)?;
    if options.bots + 1 > config.max_player_number {
        return Err(format!(
            "{} bots plus the owner exceed the {}-player table",
            options.bots, config.max_player_number
        )
        .into());
    }
    let mut store = MemoryStore::new();
    let admin = populate(&mut store, &config);
    let mut engine = Engine::new(store, config, RngState::from_seed(options.seed));
    let mut events = EventBus::default();

    let game = engine.create_game(admin, &mut events)?;
    let bots: Vec<PlayerId> = engine
        .available_bots(game)?
        .into_iter()
        .take(options.bots)
        .map(|bot| bot.id)
        .collect();
    if bots.len() < options.bots {
        return Err(format!("only {} bots are seeded", bots.len()).into());
    }
    for bot in bots {
        engine.add_bot(game, bot, admin, &mut events)?;
    }
    engine.setup(game, admin, &mut events)?;
    println!("seed {}", engine.rng.seed());
    report(&engine, &mut events);

    let mut round = 0;
    while engine.game(game)?.status == GameStatus::Started {
        round += 1;
        println!("-- round {round}");
        engine.choose_card(game, admin, None, &mut events)?;
        engine.fill_bot_selections(game, admin, &mut events)?;
        resolve_round(&mut engine, game, admin, &mut events)?;
        report(&engine, &mut events);
    }

    println!("-- results");
    let results = engine.results(game)?;
    let mut scores: Vec<(PlayerId, u32)> = results.into_iter().collect();
    scores.sort_by_key(|&(_, value)| value);
    for (player, value) in scores {
        println!("{:>4}  {}", value, player_name(&engine, player));
    }
    Ok(())
}

/// Places cards until the round is fully resolved, picking the
/// cheapest column whenever the owner's card fits nowhere.
fn resolve_round(
    engine: &mut Engine<MemoryStore>,
    game: GameId,
    owner: PlayerId,
    events: &mut EventBus,
) -> Result<(), Box<dyn Error>> {
    loop {
        match engine.place_next_card(game, owner, events) {
            Ok(Placement::Placed { .. }) => {}
            Ok(Placement::ColumnChoiceRequired { player }) => {
                let target = engine
                    .columns(game)?
                    .into_iter()
                    .min_by_key(|column| column.value())
                    .map(|column| column.id)
                    .ok_or("board has no columns")?;
                engine.choose_column(game, player, target, events)?;
            }
            Err(GameError::NoCardToPlace) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

fn report(engine: &Engine<MemoryStore>, events: &mut EventBus) {
    let drained: Vec<Event> = events.drain().collect();
    for event in drained {
        println!("   {}", describe(engine, &event));
    }
}

fn player_name(engine: &Engine<MemoryStore>, player: PlayerId) -> String {
    engine
        .player(player)
        .map(|player| player.name.clone())
        .unwrap_or_else(|_| player.to_string())
}

fn describe(engine: &Engine<MemoryStore>, event: &Event) -> String {
    match event {
        Event::GameCreated { game, owner } => {
            format!("game {game} created by {}", player_name(engine, *owner))
        }
        Event::PlayerJoined { player, .. } => {
            format!("{} joined", player_name(engine, *player))
        }
        Event::PlayerLeft { player, .. } => format!("{} left", player_name(engine, *player)),
        Event::OwnerChanged { owner, .. } => {
            format!("{} now owns the game", player_name(engine, *owner))
        }
        Event::GameStarted { members, .. } => format!("game started with {members} players"),
        Event::CardChosen { player, .. } => {
            format!("{} committed a card", player_name(engine, *player))
        }
        Event::BotsChose { count, .. } => format!("{count} bots committed cards"),
        Event::CardPlaced {
            player,
            card,
            column,
            ..
        } => format!(
            "{} placed card {card} on column {column}",
            player_name(engine, *player)
        ),
        Event::ColumnSwept {
            player,
            column,
            penalty,
            ..
        } => format!(
            "{} swept column {column} for {penalty} penalty",
            player_name(engine, *player)
        ),
        Event::ColumnChosen { player, column, .. } => format!(
            "{} took column {column}",
            player_name(engine, *player)
        ),
        Event::TurnResolved { .. } => "turn resolved".to_string(),
        Event::GameFinished { .. } => "game finished".to_string(),
        Event::GameDeleted { game } => format!("game {game} deleted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions, String> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn no_arguments_means_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
    }

    #[test]
    fn simulate_options_parse() {
        let options = parse(&["simulate", "--seed", "9", "--bots", "4"]).unwrap();
        assert_eq!(options.command, Command::Simulate);
        assert_eq!(options.seed, 9);
        assert_eq!(options.bots, 4);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse(&["simulate", "--fast"]).is_err());
        assert!(parse(&["dance"]).is_err());
        assert!(parse(&["simulate", "--seed"]).is_err());
    }
}
