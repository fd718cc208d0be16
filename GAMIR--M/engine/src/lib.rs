#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Gamir prediction engine – turns a rolling history of observed symbols into
//! a category-balanced, ranked prediction set and tracks missed predictions.

/// Engine error taxonomy.
#[path = "../error.rs"]
pub mod error;

/// Symbol universe and its two categories.
#[path = "../catalog.rs"]
pub mod catalog;

/// Rolling window and round history.
#[path = "../history.rs"]
pub mod history;

/// Engine configuration loaded from TOML.
#[path = "../config.rs"]
pub mod config;

/// Heuristic scoring passes and the bootstrap draw.
#[path = "../scoring.rs"]
pub mod scoring;

/// Top-K selection and confidence assignment.
#[path = "../ranker.rs"]
pub mod ranker;

/// Missed prediction bookkeeping.
#[path = "../miss_tracker.rs"]
pub mod miss_tracker;

/// Telemetry for sessions and simulations.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Session facade consumed by front ends.
#[path = "../session.rs"]
pub mod session;

/// Accuracy simulator.
#[path = "../simulator.rs"]
pub mod simulator;

pub use catalog::{Category, Symbol, SymbolCatalog};
pub use config::EngineConfig;
pub use error::GameError;
pub use history::HistoryStore;
pub use miss_tracker::MissTracker;
pub use ranker::{ConfidenceTier, PredictionEntry, PredictionSet, PredictionSource, Ranker};
pub use scoring::{ScoreTable, ScoringEngine};
pub use session::{GameSession, GameSessionBuilder, RecordOutcome, SessionSnapshot};
pub use simulator::{SimulationReport, Simulator};
pub use telemetry::{GameTelemetry, GameTelemetryBuilder};
