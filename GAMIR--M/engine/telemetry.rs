use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Telemetry builder for game sessions and simulations.
pub struct GameTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
    sink: Option<Arc<dyn LogSink>>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl GameTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Info,
            sink: None,
            event_publisher: None,
        }
    }

    /// Writes JSON lines to a file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Minimum level written to the log file.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sends records to a custom sink instead of a file.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds telemetry, opening the log file if one was requested.
    pub fn build(self) -> Result<GameTelemetry> {
        let sink = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => {
                let logger = JsonLogger::with_min_level(path, self.min_level)?;
                Some(Arc::new(logger) as Arc<dyn LogSink>)
            }
            (None, None) => None,
        };
        Ok(GameTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sink,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Telemetry handle shared across engine components.
#[derive(Clone)]
pub struct GameTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for GameTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameTelemetry")
            .field("module", &self.inner.module)
            .field("logs", &self.inner.sink.is_some())
            .field("events", &self.inner.publisher.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl GameTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> GameTelemetryBuilder {
        GameTelemetryBuilder::new(module)
    }

    /// Module label stamped on records and events.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Logs a message with JSON metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(sink) = &self.inner.sink {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            sink.log(&record)?;
        }
        Ok(())
    }

    /// Publishes an event.
    ///
    /// Inside a tokio runtime the publish is spawned; otherwise it runs to
    /// completion on a throwaway current-thread runtime.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let record = EventRecord::new(self.inner.module.as_str(), event_type, payload);
        if tokio::runtime::Handle::try_current().is_ok() {
            let publisher = Arc::clone(publisher);
            tokio::spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("telemetry event publish failed: {err:?}");
                }
            });
            Ok(())
        } else {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(publisher.publish(record))
        }
    }
}

/// Returns a reproducible RNG, or an entropy-seeded one when `seed` is absent.
#[must_use]
pub fn session_rng(seed: Option<u64>) -> SmallRng {
    seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use shared_logging::MemoryLogSink;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_log_and_event() {
        let tmp = tempdir().unwrap();
        let bus = Arc::new(MemoryEventBus::new(4));
        let log_path = tmp.path().join("game.log");
        let telemetry = GameTelemetry::builder("session")
            .log_path(&log_path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "session.seeded", json!({ "length": 6 }))
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "session.filtered", json!({}))
            .unwrap();
        telemetry
            .event("session.predicted", json!({ "source": "heuristic" }))
            .unwrap();
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("session.seeded"));
        assert!(!content.contains("session.filtered"));
        let events = bus.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, "session");
    }

    #[test]
    fn custom_sink_takes_precedence() {
        let sink = Arc::new(MemoryLogSink::new());
        let telemetry = GameTelemetry::builder("simulator")
            .log_sink(sink.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "simulation.round", json!({ "round": 1 }))
            .unwrap();
        assert_eq!(sink.messages(), vec!["simulation.round".to_string()]);
        assert!(telemetry.event("ignored", json!({})).is_ok());
    }

    #[tokio::test]
    async fn event_inside_runtime_is_spawned() {
        let bus = Arc::new(MemoryEventBus::new(4));
        let telemetry = GameTelemetry::builder("session")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .event("session.reset", json!({ "round": 0 }))
            .unwrap();
        for _ in 0..50 {
            if !bus.snapshot().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let events = bus.events_of_type("session.reset");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["round"], 0);
    }

    #[test]
    fn seeded_rngs_repeat() {
        use rand::Rng;
        let a: u64 = session_rng(Some(5)).gen();
        let b: u64 = session_rng(Some(5)).gen();
        assert_eq!(a, b);
    }
}
