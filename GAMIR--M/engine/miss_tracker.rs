use indexmap::IndexSet;

use crate::{catalog::Symbol, ranker::PredictionSet};

/// Predicted-but-not-observed symbols for the current round, in first-miss order.
#[derive(Debug, Clone, Default)]
pub struct MissTracker {
    missed: IndexSet<Symbol>,
}

impl MissTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every predicted symbol that differs from `actual`.
    ///
    /// Returns the symbols that were not already marked missed.
    pub fn evaluate(&mut self, previous: &PredictionSet, actual: &Symbol) -> Vec<Symbol> {
        previous
            .iter()
            .filter(|entry| &entry.symbol != actual)
            .filter_map(|entry| {
                self.missed
                    .insert(entry.symbol.clone())
                    .then(|| entry.symbol.clone())
            })
            .collect()
    }

    /// Missed symbols in insertion order.
    #[must_use]
    pub fn missed(&self) -> Vec<Symbol> {
        self.missed.iter().cloned().collect()
    }

    /// Whether `symbol` was missed this round.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.missed.contains(symbol)
    }

    /// Number of missed symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.missed.len()
    }

    /// True when nothing was missed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missed.is_empty()
    }

    /// Forgets every miss.
    pub fn clear(&mut self) {
        self.missed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::SymbolCatalog, ranker::Ranker, scoring::ScoreTable};

    fn default_prediction() -> PredictionSet {
        let catalog = SymbolCatalog::reference();
        Ranker::default().select(&catalog, &ScoreTable::zeroed(&catalog))
    }

    #[test]
    fn records_every_prediction_except_actual() {
        let prediction = default_prediction();
        let mut tracker = MissTracker::new();
        let added = tracker.evaluate(&prediction, &"🫑".into());
        assert_eq!(added.len(), 5);
        assert!(!tracker.contains(&"🫑".into()));
        assert!(tracker.contains(&"🐮".into()));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let prediction = default_prediction();
        let mut once = MissTracker::new();
        once.evaluate(&prediction, &"🐤".into());
        let mut twice = MissTracker::new();
        twice.evaluate(&prediction, &"🐤".into());
        let second = twice.evaluate(&prediction, &"🐤".into());
        assert!(second.is_empty());
        assert_eq!(once.missed(), twice.missed());
        assert_eq!(twice.len(), 6);
    }

    #[test]
    fn keeps_first_miss_order_and_clears() {
        let prediction = default_prediction();
        let mut tracker = MissTracker::new();
        tracker.evaluate(&prediction, &"🍅".into());
        tracker.evaluate(&prediction, &"🐮".into());
        let missed: Vec<_> = tracker.missed().iter().map(|s| s.to_string()).collect();
        assert_eq!(missed, vec!["🫑", "🥕", "🐮", "🐟", "🍤", "🍅"]);
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
