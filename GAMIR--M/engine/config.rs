use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{catalog::SymbolCatalog, error::GameError};

/// Tunable engine parameters. Every field has a default, so an empty TOML
/// document yields the reference game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rolling window capacity and required seed length.
    pub window_size: usize,
    /// Symbols selected per category.
    pub top_k: usize,
    /// Round-history suffix scanned by the rarity pass.
    pub rarity_window: usize,
    /// Confidence of the first high-tier entry.
    pub high_confidence_base: u32,
    /// Confidence of the first medium-tier entry.
    pub medium_confidence_base: u32,
    /// Confidence decrement per rank.
    pub confidence_step: u32,
    /// Fixed seed for the bootstrap shuffle; entropy when absent.
    pub rng_seed: Option<u64>,
    /// Symbol universe.
    pub catalog: SymbolCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 6,
            top_k: 3,
            rarity_window: 10,
            high_confidence_base: 85,
            medium_confidence_base: 75,
            confidence_step: 8,
            rng_seed: None,
            catalog: SymbolCatalog::reference(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Target count per category inside the rolling window.
    #[must_use]
    pub const fn balance_target(&self) -> usize {
        self.window_size / 2
    }

    /// Rejects parameters the engine cannot work with.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.window_size == 0 {
            return Err(GameError::InvalidConfig("window_size must be positive".into()));
        }
        if self.top_k == 0 {
            return Err(GameError::InvalidConfig("top_k must be positive".into()));
        }
        if self.rarity_window == 0 {
            return Err(GameError::InvalidConfig("rarity_window must be positive".into()));
        }
        self.catalog.validate(self.top_k)
    }
}
