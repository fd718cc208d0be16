use std::{
    fmt::Write as _,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamir_engine::{
    Category, EngineConfig, GameSession, GameTelemetry, PredictionEntry, PredictionSet,
    Simulator, SymbolCatalog,
};
use serde::Serialize;
use shared_event_bus::{read_event_log, FileEventPublisher};
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "gamir", version, about = "Balanced symbol prediction game")]
struct Cli {
    /// Engine configuration (TOML). Defaults to the reference game.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plays interactively: type the symbol that came up, `reset`, or `quit`.
    Play {
        /// Opening observations, comma separated glyphs or names.
        #[arg(long)]
        seed: String,
        /// JSON-lines log file.
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Minimum level written to the log file.
        #[arg(long, default_value = "info")]
        log_level: LogLevel,
        /// JSON-lines event log.
        #[arg(long)]
        event_log: Option<PathBuf>,
    },
    /// Plays against a random outcome stream and prints accuracy.
    Simulate {
        /// Opening observations, comma separated glyphs or names.
        #[arg(long)]
        seed: String,
        /// Number of observations to play.
        #[arg(long, default_value_t = 100)]
        rounds: usize,
        /// Seed for the outcome stream.
        #[arg(long, default_value_t = 0)]
        rng_seed: u64,
        /// JSON-lines event log.
        #[arg(long)]
        event_log: Option<PathBuf>,
    },
    /// Lists events from an event log.
    Events {
        /// Event log written by `play` or `simulate`.
        #[arg(long)]
        event_log: PathBuf,
        /// Most recent events to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Prints the symbol catalog.
    Catalog,
}

#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    category: &'a str,
    glyph: &'a str,
    name: &'a str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Play {
            seed,
            log_file,
            log_level,
            event_log,
        } => {
            let telemetry = build_telemetry("session", log_file, log_level, event_log)?;
            let mut builder = GameSession::builder().config(config);
            if let Some(telemetry) = telemetry {
                builder = builder.telemetry(telemetry);
            }
            let mut session = builder.build()?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            play(&mut session, &seed, stdin.lock(), stdout.lock())
        }
        Commands::Simulate {
            seed,
            rounds,
            rng_seed,
            event_log,
        } => {
            let seed = config.catalog.parse_list(&seed)?;
            let mut simulator = Simulator::new(config, rng_seed);
            let telemetry = build_telemetry("simulator", None, LogLevel::Info, event_log)?;
            if let Some(telemetry) = telemetry {
                simulator = simulator.with_telemetry(telemetry);
            }
            let report = simulator.run(&seed, rounds)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Events { event_log, limit } => {
            let events = read_event_log(&event_log)?;
            let skip = events.len().saturating_sub(limit);
            for event in events.into_iter().skip(skip) {
                println!(
                    "{} | {} | {} | {}",
                    event.timestamp, event.source, event.event_type, event.payload
                );
            }
            Ok(())
        }
        Commands::Catalog => {
            let catalog = &config.catalog;
            let rows: Vec<_> = Category::ALL
                .into_iter()
                .flat_map(|category| {
                    let spec = catalog.spec(category);
                    spec.symbols.iter().map(move |symbol| CatalogRow {
                        category: spec.label.as_str(),
                        glyph: symbol.glyph.as_str(),
                        name: symbol.name.as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn build_telemetry(
    module: &str,
    log_file: Option<PathBuf>,
    log_level: LogLevel,
    event_log: Option<PathBuf>,
) -> Result<Option<GameTelemetry>> {
    if log_file.is_none() && event_log.is_none() {
        return Ok(None);
    }
    let mut builder = GameTelemetry::builder(module).min_level(log_level);
    if let Some(path) = log_file {
        builder = builder.log_path(path);
    }
    if let Some(path) = event_log {
        let publisher = FileEventPublisher::new(&path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        builder = builder.event_publisher(Arc::new(publisher));
    }
    Ok(Some(builder.build()?))
}

fn play<R: BufRead, W: Write>(
    session: &mut GameSession,
    seed: &str,
    input: R,
    mut out: W,
) -> Result<()> {
    let seed = session.catalog().parse_list(seed)?;
    session.seed(&seed)?;
    let prediction = session.predict();
    write!(out, "{}", render(session, &prediction))?;
    writeln!(out, "enter the symbol that came up (`reset`, `quit`):")?;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        match command {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                session.reset();
                writeln!(out, "round cleared, predictions are random until history builds up")?;
            }
            raw => match session.catalog().parse(raw) {
                Ok(symbol) => {
                    let outcome = session.record(symbol);
                    match outcome.hit {
                        Some(true) => writeln!(out, "✔ {} was predicted", outcome.symbol)?,
                        Some(false) => writeln!(out, "✘ {} was not predicted", outcome.symbol)?,
                        None => {}
                    }
                }
                Err(err) => {
                    writeln!(out, "⚠ {err}")?;
                    continue;
                }
            },
        }
        let prediction = session.predict();
        write!(out, "{}", render(session, &prediction))?;
    }
    out.flush()?;
    Ok(())
}

fn render(session: &GameSession, prediction: &PredictionSet) -> String {
    let catalog = session.catalog();
    let mut text = String::new();
    let round: Vec<_> = session.round_history().iter().map(ToString::to_string).collect();
    let _ = writeln!(text, "round ({}): {}", round.len(), round.join(" "));
    render_tier(&mut text, catalog, prediction.high());
    render_tier(&mut text, catalog, prediction.medium());
    let missed: Vec<_> = session.missed().iter().map(ToString::to_string).collect();
    let _ = writeln!(text, "missed: {}", missed.join(" "));
    text
}

fn render_tier(text: &mut String, catalog: &SymbolCatalog, entries: &[PredictionEntry]) {
    for entry in entries {
        let bar = "█".repeat(usize::try_from(entry.confidence / 5).unwrap_or_default());
        let _ = writeln!(
            text,
            "  {} {} {:<8} {:<6} {:>3}% {}",
            entry.symbol,
            catalog.badge(entry.category),
            catalog.display_name(&entry.symbol),
            entry.tier.label(),
            entry.confidence,
            bar
        );
    }
}
