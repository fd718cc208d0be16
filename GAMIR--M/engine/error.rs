use thiserror::Error;

/// Errors surfaced by the prediction engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    /// Seed sequence length does not match the rolling window size.
    #[error("invalid seed: expected {expected} symbols, got {actual}")]
    InvalidSeed {
        /// Required number of symbols.
        expected: usize,
        /// Number of symbols supplied.
        actual: usize,
    },
    /// Input did not match any symbol glyph or display name in the catalog.
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    /// Catalog categories are empty, unequal, or overlapping.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    /// Engine parameters are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
