use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    catalog::{Symbol, SymbolCatalog},
    config::EngineConfig,
    error::GameError,
    history::HistoryStore,
    miss_tracker::MissTracker,
    ranker::{PredictionSet, Ranker},
    scoring::{bootstrap_order, ScoringEngine},
    telemetry::{session_rng, GameTelemetry},
};

/// Result of recording one observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Observed symbol.
    pub symbol: Symbol,
    /// Whether the live prediction contained the symbol. `None` when no
    /// prediction was live.
    pub hit: Option<bool>,
    /// Symbols added to the missed set by this observation.
    pub newly_missed: Vec<Symbol>,
}

/// Serializable view of a session for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: Uuid,
    /// Start of the current round, if seeded.
    pub round_started_at: Option<DateTime<Utc>>,
    /// Full round log, oldest first.
    pub round: Vec<Symbol>,
    /// Rolling window, oldest first.
    pub window: Vec<Symbol>,
    /// Missed symbols in first-miss order.
    pub missed: Vec<Symbol>,
    /// Live prediction, if any.
    pub prediction: Option<PredictionSet>,
}

/// One player's game: history, misses and the live prediction.
///
/// Sessions own all their state; run several by creating several.
#[derive(Debug)]
pub struct GameSession {
    id: Uuid,
    config: EngineConfig,
    ranker: Ranker,
    history: HistoryStore,
    misses: MissTracker,
    live_prediction: Option<PredictionSet>,
    round_started_at: Option<DateTime<Utc>>,
    rng: SmallRng,
    telemetry: Option<GameTelemetry>,
}

impl GameSession {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> GameSessionBuilder {
        GameSessionBuilder::default()
    }

    /// Session with the reference configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = EngineConfig::default();
        Self::from_parts(config, None)
    }

    fn from_parts(config: EngineConfig, telemetry: Option<GameTelemetry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ranker: Ranker::from_config(&config),
            history: HistoryStore::new(config.window_size),
            misses: MissTracker::new(),
            live_prediction: None,
            round_started_at: None,
            rng: session_rng(config.rng_seed),
            telemetry,
            config,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Symbol universe.
    #[must_use]
    pub const fn catalog(&self) -> &SymbolCatalog {
        &self.config.catalog
    }

    /// Starts a round from exactly `window_size` observations.
    ///
    /// On error nothing changes. The missed set survives seeding; only
    /// [`reset`](Self::reset) clears it.
    pub fn seed(&mut self, symbols: &[Symbol]) -> Result<(), GameError> {
        if let Err(err) = self.history.seed(symbols) {
            self.log(
                LogLevel::Warn,
                "session.seed.rejected",
                json!({ "expected": self.history.window_size(), "actual": symbols.len() }),
            );
            return Err(err);
        }
        self.live_prediction = None;
        self.round_started_at = Some(Utc::now());
        let seeded: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        self.log(LogLevel::Info, "session.seeded", json!({ "symbols": seeded }));
        self.emit("session.seeded", json!({ "symbols": seeded }));
        Ok(())
    }

    /// Computes the next prediction and makes it the live one.
    ///
    /// History is never mutated. An empty round yields a random balanced
    /// draw; otherwise the result is fully determined by the history.
    pub fn predict(&mut self) -> PredictionSet {
        let catalog = &self.config.catalog;
        let prediction = if self.history.is_empty() {
            let order = bootstrap_order(catalog, self.config.top_k, &mut self.rng);
            self.ranker.rank_bootstrap(catalog, &order)
        } else {
            let engine = ScoringEngine::new(
                catalog,
                self.config.balance_target(),
                self.config.rarity_window,
            );
            let table = engine.score(self.history.round(), &self.history.window());
            self.ranker.select(catalog, &table)
        };
        let payload = json!({
            "source": prediction.source(),
            "high": prediction.high().iter().map(|e| e.symbol.as_str()).collect::<Vec<_>>(),
            "medium": prediction.medium().iter().map(|e| e.symbol.as_str()).collect::<Vec<_>>(),
        });
        self.log(LogLevel::Debug, "session.predicted", payload.clone());
        self.emit("session.predicted", payload);
        self.live_prediction = Some(prediction.clone());
        prediction
    }

    /// Records an observation, scoring misses against the live prediction,
    /// which is then discarded.
    ///
    /// Callers are expected to pass symbols from the catalog; use
    /// [`SymbolCatalog::parse`] at the input boundary.
    pub fn record(&mut self, symbol: Symbol) -> RecordOutcome {
        let previous = self.live_prediction.take();
        let (hit, newly_missed) = previous.as_ref().map_or((None, Vec::new()), |prediction| {
            (
                Some(prediction.contains(&symbol)),
                self.misses.evaluate(prediction, &symbol),
            )
        });
        self.history.record(symbol.clone());

        self.log(
            LogLevel::Info,
            "session.recorded",
            json!({
                "symbol": symbol.as_str(),
                "hit": hit,
                "round_len": self.history.round().len(),
            }),
        );
        self.emit(
            "session.recorded",
            json!({ "symbol": symbol.as_str(), "hit": hit }),
        );
        if !newly_missed.is_empty() {
            let missed: Vec<&str> = newly_missed.iter().map(Symbol::as_str).collect();
            self.emit("session.missed", json!({ "symbols": missed }));
        }
        RecordOutcome {
            symbol,
            hit,
            newly_missed,
        }
    }

    /// Clears history, misses and the live prediction. Idempotent.
    pub fn reset(&mut self) {
        self.history.reset();
        self.misses.clear();
        self.live_prediction = None;
        self.round_started_at = None;
        self.log(LogLevel::Info, "session.reset", json!({}));
        self.emit("session.reset", json!({}));
    }

    /// Missed symbols in first-miss order.
    #[must_use]
    pub fn missed(&self) -> Vec<Symbol> {
        self.misses.missed()
    }

    /// Full round log.
    #[must_use]
    pub fn round_history(&self) -> &[Symbol] {
        self.history.round()
    }

    /// Rolling window.
    #[must_use]
    pub fn rolling_window(&self) -> Vec<Symbol> {
        self.history.window()
    }

    /// Prediction that the next `record` will be checked against.
    #[must_use]
    pub const fn last_prediction(&self) -> Option<&PredictionSet> {
        self.live_prediction.as_ref()
    }

    /// Display snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            round_started_at: self.round_started_at,
            round: self.history.round().to_vec(),
            window: self.history.window(),
            missed: self.misses.missed(),
            prediction: self.live_prediction.clone(),
        }
    }

    fn log(&self, level: LogLevel, message: &str, mut metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            if let Some(map) = metadata.as_object_mut() {
                map.insert("session_id".into(), json!(self.id));
            }
            let _ = tel.log(level, message, metadata);
        }
    }

    fn emit(&self, event_type: &str, mut payload: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            if let Some(map) = payload.as_object_mut() {
                map.insert("session_id".into(), json!(self.id));
            }
            let _ = tel.event(event_type, payload);
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Builder for `GameSession`.
#[derive(Debug, Default)]
pub struct GameSessionBuilder {
    config: Option<EngineConfig>,
    rng_seed: Option<u64>,
    telemetry: Option<GameTelemetry>,
}

impl GameSessionBuilder {
    /// Uses a custom configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the configured bootstrap seed.
    #[must_use]
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: GameTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Validates the configuration and builds the session.
    pub fn build(self) -> Result<GameSession, GameError> {
        let mut config = self.config.unwrap_or_default();
        if self.rng_seed.is_some() {
            config.rng_seed = self.rng_seed;
        }
        config.validate()?;
        Ok(GameSession::from_parts(config, self.telemetry))
    }
}
