use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    catalog::Symbol,
    config::EngineConfig,
    error::GameError,
    ranker::ConfidenceTier,
    session::GameSession,
    telemetry::GameTelemetry,
};

/// Accuracy summary for a simulated game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Observations played after the seed.
    pub rounds: usize,
    /// Observations contained in the live prediction.
    pub hits: usize,
    /// `hits / rounds`, zero for an empty run.
    pub hit_rate: f64,
    /// Hits landing in the high list.
    pub high_hits: usize,
    /// Hits landing in the medium list.
    pub medium_hits: usize,
    /// Size of the missed set at the end.
    pub missed: usize,
    /// Seed that drove the outcome stream.
    pub outcome_seed: u64,
}

/// Plays a session against a uniform random outcome stream.
pub struct Simulator {
    config: EngineConfig,
    outcome_seed: u64,
    telemetry: Option<GameTelemetry>,
}

impl Simulator {
    /// Creates a simulator. The same seed replays the same outcomes.
    #[must_use]
    pub fn new(config: EngineConfig, outcome_seed: u64) -> Self {
        Self {
            config,
            outcome_seed,
            telemetry: None,
        }
    }

    /// Attaches telemetry for the summary event.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: GameTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Seeds a fresh session and plays `rounds` predict/record cycles.
    pub fn run(&self, seed: &[Symbol], rounds: usize) -> Result<SimulationReport, GameError> {
        let mut session = GameSession::builder()
            .config(self.config.clone())
            .rng_seed(self.outcome_seed.wrapping_add(1))
            .build()?;
        session.seed(seed)?;

        let universe = self.config.catalog.universe();
        let mut rng = SmallRng::seed_from_u64(self.outcome_seed);
        let mut report = SimulationReport {
            rounds,
            hits: 0,
            hit_rate: 0.0,
            high_hits: 0,
            medium_hits: 0,
            missed: 0,
            outcome_seed: self.outcome_seed,
        };

        for _ in 0..rounds {
            let prediction = session.predict();
            let Some(actual) = universe.choose(&mut rng).cloned() else {
                break;
            };
            if let Some(entry) = prediction.entry(&actual) {
                report.hits += 1;
                match entry.tier {
                    ConfidenceTier::High => report.high_hits += 1,
                    ConfidenceTier::Medium => report.medium_hits += 1,
                }
            }
            session.record(actual);
        }

        report.missed = session.missed().len();
        if rounds > 0 {
            #[allow(clippy::cast_precision_loss)]
            let rate = report.hits as f64 / rounds as f64;
            report.hit_rate = rate;
        }

        if let Some(tel) = &self.telemetry {
            let payload = json!({
                "rounds": report.rounds,
                "hits": report.hits,
                "hit_rate": report.hit_rate,
                "outcome_seed": report.outcome_seed,
            });
            let _ = tel.log(LogLevel::Info, "simulation.completed", payload.clone());
            let _ = tel.event("simulation.completed", payload);
        }
        Ok(report)
    }
}
