use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Category, Symbol, SymbolCatalog},
    config::EngineConfig,
    scoring::ScoreTable,
};

/// Display tier of a prediction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// Category A picks.
    High,
    /// Category B picks.
    Medium,
}

impl ConfidenceTier {
    /// Label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }

    /// Category feeding this tier.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::High => Category::A,
            Self::Medium => Category::B,
        }
    }
}

/// How a prediction set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// Ranked from a score table.
    Heuristic,
    /// Random balanced draw over an empty round.
    Bootstrap,
}

/// One ranked prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// Predicted symbol.
    pub symbol: Symbol,
    /// Symbol category.
    pub category: Category,
    /// List the entry belongs to.
    pub tier: ConfidenceTier,
    /// Zero-based rank within the list.
    pub rank: usize,
    /// Cosmetic confidence percentage.
    pub confidence: u32,
    /// Heuristic score; absent for bootstrap draws.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

/// Ranked high and medium lists, `top_k` entries each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSet {
    high: Vec<PredictionEntry>,
    medium: Vec<PredictionEntry>,
    source: PredictionSource,
}

impl PredictionSet {
    /// High-confidence list (category A).
    #[must_use]
    pub fn high(&self) -> &[PredictionEntry] {
        &self.high
    }

    /// Medium-confidence list (category B).
    #[must_use]
    pub fn medium(&self) -> &[PredictionEntry] {
        &self.medium
    }

    /// Origin of the set.
    #[must_use]
    pub const fn source(&self) -> PredictionSource {
        self.source
    }

    /// Entries of both lists, high first.
    pub fn iter(&self) -> impl Iterator<Item = &PredictionEntry> {
        self.high.iter().chain(&self.medium)
    }

    /// Predicted symbols, high first.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.iter().map(|entry| entry.symbol.clone()).collect()
    }

    /// Whether any list predicts `symbol`.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.iter().any(|entry| &entry.symbol == symbol)
    }

    /// Entry predicting `symbol`, if any.
    #[must_use]
    pub fn entry(&self, symbol: &Symbol) -> Option<&PredictionEntry> {
        self.iter().find(|entry| &entry.symbol == symbol)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len()
    }

    /// True when both lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects the top symbols per category and assigns confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranker {
    top_k: usize,
    high_base: u32,
    medium_base: u32,
    step: u32,
}

impl Ranker {
    /// Ranker with explicit parameters.
    #[must_use]
    pub const fn new(top_k: usize, high_base: u32, medium_base: u32, step: u32) -> Self {
        Self {
            top_k,
            high_base,
            medium_base,
            step,
        }
    }

    /// Ranker configured from engine settings.
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.top_k,
            config.high_confidence_base,
            config.medium_confidence_base,
            config.confidence_step,
        )
    }

    /// Confidence for a rank inside a tier, floored at zero.
    #[must_use]
    pub fn confidence(&self, tier: ConfidenceTier, rank: usize) -> u32 {
        let base = match tier {
            ConfidenceTier::High => self.high_base,
            ConfidenceTier::Medium => self.medium_base,
        };
        let drop = u32::try_from(rank)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.step);
        base.saturating_sub(drop)
    }

    /// Builds the set from a score table.
    #[must_use]
    pub fn select(&self, catalog: &SymbolCatalog, table: &ScoreTable) -> PredictionSet {
        let build = |tier: ConfidenceTier| -> Vec<PredictionEntry> {
            table
                .ranked(catalog, tier.category())
                .into_iter()
                .take(self.top_k)
                .enumerate()
                .map(|(rank, (symbol, score))| PredictionEntry {
                    symbol,
                    category: tier.category(),
                    tier,
                    rank,
                    confidence: self.confidence(tier, rank),
                    score: Some(score),
                })
                .collect()
        };
        PredictionSet {
            high: build(ConfidenceTier::High),
            medium: build(ConfidenceTier::Medium),
            source: PredictionSource::Heuristic,
        }
    }

    /// Builds the set from a shuffled bootstrap order. Ranks follow each
    /// category's position within the order.
    #[must_use]
    pub fn rank_bootstrap(&self, catalog: &SymbolCatalog, order: &[Symbol]) -> PredictionSet {
        let build = |tier: ConfidenceTier| -> Vec<PredictionEntry> {
            order
                .iter()
                .filter(|symbol| catalog.is_in(symbol, tier.category()))
                .take(self.top_k)
                .enumerate()
                .map(|(rank, symbol)| PredictionEntry {
                    symbol: symbol.clone(),
                    category: tier.category(),
                    tier,
                    rank,
                    confidence: self.confidence(tier, rank),
                    score: None,
                })
                .collect()
        };
        PredictionSet {
            high: build(ConfidenceTier::High),
            medium: build(ConfidenceTier::Medium),
            source: PredictionSource::Bootstrap,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
