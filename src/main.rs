use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use league_standings::error::EngineError;
use league_standings::model::{DivisionOutcome, Leaderboards, Round, RoundOutcome};
use league_standings::scoring::SeasonConfig;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA_INTEGRITY: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_IO: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the round standings
    Standings {
        /// Round document (.json or .yaml)
        round: PathBuf,
        /// Only show this division
        #[arg(short, long)]
        division: Option<String>,
    },
    /// Print qualifying, race time and fastest lap leaderboards
    Leaderboards {
        /// Round document (.json or .yaml)
        round: PathBuf,
        /// Only show this division (defaults to the round-wide boards)
        #[arg(short, long)]
        division: Option<String>,
    },
    /// Compute the round and write the outcome as JSON
    Compute {
        /// Round document (.json or .yaml)
        round: PathBuf,
        /// Output file, replaced atomically
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check a round and the season config, reporting every problem
    Validate {
        /// Round document (.json or .yaml)
        round: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Format {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "league-standings")]
#[command(about = "Sim-racing league round standings calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/league-standings/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output format for printed results
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();
    league_standings::logging::init(cli.verbose);
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match league_standings::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate season config at startup
    let season = config.effective_season();
    if let Err(errors) = league_standings::scoring::validate_season(&season) {
        eprintln!("Season config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = config
        .colors
        .unwrap_or_else(league_standings::output::should_use_colors);

    match cli.command {
        Commands::Standings { round, division } => {
            let round = load_round_or_exit(&round);
            let outcome = compute_or_exit(&round, &season);
            let selected = select_divisions(&outcome, division.as_deref());
            print_standings(&round, &selected, cli.format, use_colors);
        }
        Commands::Leaderboards { round, division } => {
            let round = load_round_or_exit(&round);
            let outcome = compute_or_exit(&round, &season);
            let selected = select_divisions(&outcome, division.as_deref());
            let boards = match (division.as_deref(), selected.first()) {
                (Some(_), Some(selected)) => &selected.leaderboards,
                _ => &outcome.cross_division,
            };
            print_leaderboards(&round, boards, cli.format, use_colors);
        }
        Commands::Compute { round, output } => {
            let round = load_round_or_exit(&round);
            let outcome = compute_or_exit(&round, &season);
            if let Err(e) = league_standings::storage::save_outcome(&output, &outcome) {
                eprintln!("Failed to save outcome: {:#}", e);
                std::process::exit(EXIT_IO);
            }
            if cli.verbose {
                eprintln!(
                    "Computed {} ({} divisions) in {:?}",
                    round.label(),
                    outcome.divisions.len(),
                    start_time.elapsed()
                );
            }
            println!("Wrote {}", output.display());
        }
        Commands::Validate { round } => {
            let round = load_round_or_exit(&round);
            if let Err(e) = league_standings::scoring::validate_round(&round, &season) {
                exit_with_engine_error(&e);
            }
            println!(
                "{}: {} races, {} results, no problems found",
                round.label(),
                round.races.len(),
                round.results.len()
            );
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

fn load_round_or_exit(path: &Path) -> Round {
    match league_standings::storage::load_round(path) {
        Ok(round) => round,
        Err(e) => {
            eprintln!("Failed to load round: {:#}", e);
            std::process::exit(EXIT_IO);
        }
    }
}

fn compute_or_exit(round: &Round, season: &SeasonConfig) -> RoundOutcome {
    match league_standings::scoring::compute_round(round, season) {
        Ok(outcome) => outcome,
        Err(e) => exit_with_engine_error(&e),
    }
}

fn exit_with_engine_error(error: &EngineError) -> ! {
    let (heading, code) = match error {
        EngineError::Configuration(_) => ("Configuration errors:", EXIT_CONFIG),
        EngineError::DataIntegrity(_) => ("Data integrity errors:", EXIT_DATA_INTEGRITY),
    };
    eprintln!("{}", heading);
    for message in error.messages() {
        eprintln!("  - {}", message);
    }
    std::process::exit(code);
}

/// Every division, or just the requested one.
fn select_divisions<'a>(outcome: &'a RoundOutcome, id: Option<&str>) -> Vec<&'a DivisionOutcome> {
    let Some(id) = id else {
        return outcome.divisions.iter().collect();
    };
    match outcome.division(Some(id)) {
        Some(division) => vec![division],
        None => {
            let known: Vec<&str> = outcome
                .divisions
                .iter()
                .filter_map(|d| d.division.as_deref())
                .collect();
            if known.is_empty() {
                eprintln!("Division '{}' not found: this round has no divisions", id);
            } else {
                eprintln!("Division '{}' not found (known: {})", id, known.join(", "));
            }
            std::process::exit(EXIT_DATA_INTEGRITY);
        }
    }
}

fn print_standings(
    round: &Round,
    divisions: &[&DivisionOutcome],
    format: Format,
    use_colors: bool,
) {
    use league_standings::output::{format_standings, format_standings_tsv};

    match format {
        Format::Json => print_json(&divisions),
        Format::Tsv => {
            for division in divisions {
                let output = format_standings_tsv(&division.round_results, round);
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
        }
        Format::Table => {
            for (i, division) in divisions.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                if let Some(ref id) = division.division {
                    let name = round
                        .division(id)
                        .and_then(|d| d.name.as_deref())
                        .unwrap_or(id);
                    println!("{}", name);
                }
                println!("{}", format_standings(&division.round_results, round, use_colors));
            }
        }
    }
}

fn print_leaderboards(round: &Round, boards: &Leaderboards, format: Format, use_colors: bool) {
    use league_standings::output::{format_leaderboard, format_leaderboard_tsv};

    let sections = [
        ("qualifying", "Qualifying", &boards.qualifying_results),
        ("race_time", "Race time", &boards.race_time_results),
        ("fastest_lap", "Fastest lap", &boards.fastest_lap_results),
    ];

    match format {
        Format::Json => print_json(boards),
        Format::Tsv => {
            for (key, _, entries) in sections {
                let output = format_leaderboard_tsv(key, entries, round);
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
        }
        Format::Table => {
            let output = sections
                .iter()
                .map(|(_, title, entries)| format_leaderboard(title, entries, round, use_colors))
                .collect::<Vec<_>>()
                .join("\n\n");
            println!("{}", output);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_IO);
        }
    }
}
