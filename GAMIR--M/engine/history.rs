use std::collections::VecDeque;

use crate::{catalog::Symbol, error::GameError};

/// Rolling window plus the full round log.
///
/// The window is always the suffix of the round of length
/// `min(window_size, round.len())`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    window_size: usize,
    round: Vec<Symbol>,
    window: VecDeque<Symbol>,
}

impl HistoryStore {
    /// Creates an empty store. A zero size is treated as one.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            round: Vec::new(),
            window: VecDeque::with_capacity(window_size + 1),
        }
    }

    /// Window capacity, also the required seed length.
    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Replaces the round with exactly `window_size` symbols.
    ///
    /// Leaves the store untouched on error.
    pub fn seed(&mut self, symbols: &[Symbol]) -> Result<(), GameError> {
        if symbols.len() != self.window_size {
            return Err(GameError::InvalidSeed {
                expected: self.window_size,
                actual: symbols.len(),
            });
        }
        self.round = symbols.to_vec();
        self.window = symbols.iter().cloned().collect();
        Ok(())
    }

    /// Appends an observation, evicting the oldest window entry on overflow.
    pub fn record(&mut self, symbol: Symbol) {
        self.round.push(symbol.clone());
        self.window.push_back(symbol);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
    }

    /// Clears both sequences.
    pub fn reset(&mut self) {
        self.round.clear();
        self.window.clear();
    }

    /// Every observation this round, oldest first.
    #[must_use]
    pub fn round(&self) -> &[Symbol] {
        &self.round
    }

    /// Copy of the rolling window, oldest first.
    #[must_use]
    pub fn window(&self) -> Vec<Symbol> {
        self.window.iter().cloned().collect()
    }

    /// Most recent observation.
    #[must_use]
    pub fn last(&self) -> Option<&Symbol> {
        self.window.back()
    }

    /// True when nothing has been seeded or recorded since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.round.is_empty()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(glyphs: &[&str]) -> Vec<Symbol> {
        glyphs.iter().map(|g| Symbol::new(*g)).collect()
    }

    #[test]
    fn seed_requires_exact_length() {
        let mut store = HistoryStore::new(6);
        store.record("🐤".into());
        let err = store.seed(&symbols(&["🍅", "🐮"])).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidSeed {
                expected: 6,
                actual: 2
            }
        );
        assert_eq!(store.round(), symbols(&["🐤"]).as_slice());
    }

    #[test]
    fn window_tracks_round_suffix() {
        let mut store = HistoryStore::new(6);
        store
            .seed(&symbols(&["🍅", "🐮", "🫑", "🐟", "🥕", "🍤"]))
            .unwrap();
        let extra = symbols(&["🐤", "🌽", "🐮", "🍅", "🐟", "🫑", "🍤", "🐤"]);
        for (n, symbol) in extra.into_iter().enumerate() {
            store.record(symbol);
            let round = store.round();
            assert_eq!(round.len(), 7 + n);
            assert_eq!(store.window(), round[round.len() - 6..].to_vec());
        }
        assert_eq!(store.last(), Some(&Symbol::new("🐤")));
    }

    #[test]
    fn window_grows_until_capacity_after_reset() {
        let mut store = HistoryStore::new(6);
        store.reset();
        assert!(store.is_empty());
        for n in 1..=9 {
            store.record("🌽".into());
            assert_eq!(store.window().len(), n.min(6));
            assert_eq!(store.round().len(), n);
        }
        store.reset();
        store.reset();
        assert!(store.window().is_empty());
        assert!(store.round().is_empty());
    }
}
