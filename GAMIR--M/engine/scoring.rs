//! Heuristic desirability scores for the next observation.
//!
//! Four additive passes run over a zeroed table: category balance, short-run
//! repetition, alternation pattern and rarity. An empty round skips all of
//! them in favour of a random balanced draw (see [`bootstrap_order`]).

use indexmap::IndexMap;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Category, Symbol, SymbolCatalog};

const IMBALANCE_WEIGHT: i32 = 4;
const LAST_HIT_OPPOSITE_BONUS: i32 = 3;
const SHORT_RUN_LEN: usize = 3;
const SHORT_RUN_WEIGHT: i32 = 3;
const RECENCY_STEP: i32 = 2;
const SAME_CATEGORY_BREAK_BONUS: i32 = 4;
const ALTERNATION_VARIETY_BONUS: i32 = 2;
const REPEAT_PENALTY: i32 = -3;
const UNSEEN_BONUS: i32 = 4;
const SEEN_ONCE_BONUS: i32 = 2;
const SCARCE_CATEGORY_BONUS: i32 = 3;

/// Per-symbol scores covering the whole universe in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    scores: IndexMap<Symbol, i32>,
}

impl ScoreTable {
    /// Zeroed table for every symbol in the catalog.
    #[must_use]
    pub fn zeroed(catalog: &SymbolCatalog) -> Self {
        Self {
            scores: catalog.universe().into_iter().map(|s| (s, 0)).collect(),
        }
    }

    /// Score of a symbol; zero when it is outside the universe.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> i32 {
        self.scores.get(symbol).copied().unwrap_or_default()
    }

    /// Adds `delta` to a symbol. Symbols outside the universe are ignored.
    pub fn add(&mut self, symbol: &Symbol, delta: i32) {
        if let Some(score) = self.scores.get_mut(symbol) {
            *score += delta;
        }
    }

    fn add_where(&mut self, delta: i32, mut predicate: impl FnMut(&Symbol) -> bool) {
        for (symbol, score) in &mut self.scores {
            if predicate(symbol) {
                *score += delta;
            }
        }
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, i32)> {
        self.scores.iter().map(|(symbol, score)| (symbol, *score))
    }

    /// Symbols of `category` sorted by descending score.
    ///
    /// The sort is stable, so ties keep catalog declaration order.
    #[must_use]
    pub fn ranked(&self, catalog: &SymbolCatalog, category: Category) -> Vec<(Symbol, i32)> {
        let mut entries: Vec<_> = self
            .scores
            .iter()
            .filter(|(symbol, _)| catalog.is_in(symbol, category))
            .map(|(symbol, score)| (symbol.clone(), *score))
            .collect();
        entries.sort_by(|(_, a), (_, b)| b.cmp(a));
        entries
    }
}

/// Scoring engine bound to a catalog and its window parameters.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'a> {
    catalog: &'a SymbolCatalog,
    balance_target: usize,
    rarity_window: usize,
}

impl<'a> ScoringEngine<'a> {
    /// Creates an engine. `balance_target` is half the window size.
    #[must_use]
    pub const fn new(
        catalog: &'a SymbolCatalog,
        balance_target: usize,
        rarity_window: usize,
    ) -> Self {
        Self {
            catalog,
            balance_target,
            rarity_window,
        }
    }

    /// Runs the four passes over the current history.
    ///
    /// `round` is the whole round log and `window` its rolling suffix, both
    /// oldest first.
    #[must_use]
    pub fn score(&self, round: &[Symbol], window: &[Symbol]) -> ScoreTable {
        let mut table = ScoreTable::zeroed(self.catalog);
        self.category_balance(&mut table, window);
        self.short_run(&mut table, window);
        self.alternation(&mut table, window);
        self.rarity(&mut table, round);
        table
    }

    fn count_in(&self, symbols: &[Symbol], category: Category) -> usize {
        symbols
            .iter()
            .filter(|symbol| self.catalog.is_in(symbol, category))
            .count()
    }

    fn boost_category(&self, table: &mut ScoreTable, category: Category, delta: i32) {
        let catalog = self.catalog;
        table.add_where(delta, |symbol| catalog.is_in(symbol, category));
    }

    /// Pass 1: push the window back toward an even split, and favour the
    /// category opposite the last observation.
    pub fn category_balance(&self, table: &mut ScoreTable, window: &[Symbol]) {
        let count_a = self.count_in(window, Category::A);
        let count_b = self.count_in(window, Category::B);
        debug!(count_a, count_b, "window category balance");

        let target = self.balance_target;
        if count_a > target {
            let surplus = to_score(count_a - target);
            self.boost_category(table, Category::B, surplus * IMBALANCE_WEIGHT);
        } else if count_b > target {
            let surplus = to_score(count_b - target);
            self.boost_category(table, Category::A, surplus * IMBALANCE_WEIGHT);
        }

        if let Some(category) = window.last().and_then(|last| self.catalog.category_of(last)) {
            self.boost_category(table, category.opposite(), LAST_HIT_OPPOSITE_BONUS);
        }
    }

    /// Pass 2: counter a category run in the last three entries and give each
    /// of them a recency weight of 6, 4 and 2, most recent first.
    pub fn short_run(&self, table: &mut ScoreTable, window: &[Symbol]) {
        let tail = suffix(window, SHORT_RUN_LEN);
        for category in Category::ALL {
            let count = self.count_in(tail, category);
            if count >= 2 {
                debug!(?category, count, "short run detected");
                let boost = to_score(count) * SHORT_RUN_WEIGHT;
                self.boost_category(table, category.opposite(), boost);
            }
        }

        for (offset, symbol) in tail.iter().rev().enumerate() {
            let weight = (to_score(SHORT_RUN_LEN) - to_score(offset)) * RECENCY_STEP;
            table.add(symbol, weight);
        }
    }

    /// Pass 3: react to the last two entries and penalise an exact repeat.
    pub fn alternation(&self, table: &mut ScoreTable, window: &[Symbol]) {
        let Some(last) = window.last() else {
            return;
        };
        if let [.., previous, _] = window {
            let categories = (
                self.catalog.category_of(previous),
                self.catalog.category_of(last),
            );
            match categories {
                (Some(before), Some(current)) if before == current => {
                    self.boost_category(table, current.opposite(), SAME_CATEGORY_BREAK_BONUS);
                }
                (Some(_), Some(current)) => {
                    let catalog = self.catalog;
                    table.add_where(ALTERNATION_VARIETY_BONUS, |symbol| {
                        symbol != last && catalog.is_in(symbol, current)
                    });
                }
                _ => {}
            }
        }
        table.add(last, REPEAT_PENALTY);
    }

    /// Pass 4: favour symbols absent or rare in the recent round, with an
    /// extra push for absent members of an under-represented category.
    pub fn rarity(&self, table: &mut ScoreTable, round: &[Symbol]) {
        let recent = suffix(round, self.rarity_window);
        let mut appearances: IndexMap<&Symbol, usize> = IndexMap::new();
        for symbol in recent {
            *appearances.entry(symbol).or_default() += 1;
        }
        let seen = |symbol: &Symbol| appearances.get(symbol).copied().unwrap_or_default();

        for symbol in self.catalog.universe() {
            match seen(&symbol) {
                0 => table.add(&symbol, UNSEEN_BONUS),
                1 => table.add(&symbol, SEEN_ONCE_BONUS),
                _ => {}
            }
        }

        for category in Category::ALL {
            if self.count_in(recent, category) < self.balance_target {
                for symbol in self.catalog.symbols_in(category) {
                    if seen(&symbol) == 0 {
                        table.add(&symbol, SCARCE_CATEGORY_BONUS);
                    }
                }
            }
        }
    }
}

/// Random balanced draw used when the round is empty: `top_k` symbols from
/// each category, then the combined list shuffled again.
pub fn bootstrap_order<R: Rng + ?Sized>(
    catalog: &SymbolCatalog,
    top_k: usize,
    rng: &mut R,
) -> Vec<Symbol> {
    let mut order = Vec::with_capacity(top_k * 2);
    for category in Category::ALL {
        let mut members = catalog.symbols_in(category);
        members.shuffle(rng);
        order.extend(members.into_iter().take(top_k));
    }
    order.shuffle(rng);
    order
}

fn suffix(symbols: &[Symbol], len: usize) -> &[Symbol] {
    &symbols[symbols.len().saturating_sub(len)..]
}

fn to_score(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn symbols(glyphs: &[&str]) -> Vec<Symbol> {
        glyphs.iter().map(|g| Symbol::new(*g)).collect()
    }

    fn engine(catalog: &SymbolCatalog) -> ScoringEngine<'_> {
        ScoringEngine::new(catalog, 3, 10)
    }

    fn scores_of(table: &ScoreTable, glyphs: &[&str]) -> Vec<i32> {
        glyphs.iter().map(|g| table.get(&Symbol::new(*g))).collect()
    }

    #[test]
    fn balance_pass_boosts_underrepresented_category() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // Five vegetables, one meat, last observation is a vegetable.
        let window = symbols(&["🍅", "🫑", "🐮", "🥕", "🌽", "🍅"]);
        engine(&catalog).category_balance(&mut table, &window);
        // (5 - 3) * 4 + 3 for every meat.
        assert_eq!(scores_of(&table, &["🐮", "🐟", "🍤", "🐤"]), vec![11; 4]);
        assert_eq!(scores_of(&table, &["🍅", "🫑", "🥕", "🌽"]), vec![0; 4]);
    }

    #[test]
    fn balanced_window_only_gets_edge_bonus() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // Three of each, last observation is a meat.
        let window = symbols(&["🍅", "🐮", "🫑", "🐟", "🥕", "🐤"]);
        engine(&catalog).category_balance(&mut table, &window);
        assert_eq!(scores_of(&table, &["🍅", "🫑", "🥕", "🌽"]), vec![3; 4]);
        assert_eq!(scores_of(&table, &["🐮", "🐟", "🍤", "🐤"]), vec![0; 4]);
    }

    #[test]
    fn short_run_weights_most_recent_highest_and_accumulates() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // Last three: 🐮 (oldest), 🍅, 🐮 (most recent).
        let window = symbols(&["🥕", "🐟", "🐮", "🍅", "🐮"]);
        engine(&catalog).short_run(&mut table, &window);
        // Two meats in the last three: vegetables +6.
        // 🐮 gets 6 (most recent) + 2 (third most recent); 🍅 gets 6 + 4.
        assert_eq!(table.get(&"🐮".into()), 8);
        assert_eq!(table.get(&"🍅".into()), 10);
        assert_eq!(table.get(&"🫑".into()), 6);
        assert_eq!(table.get(&"🐟".into()), 0);
    }

    #[test]
    fn short_run_handles_short_windows() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        engine(&catalog).short_run(&mut table, &symbols(&["🌽"]));
        assert_eq!(table.get(&"🌽".into()), 6);
        assert_eq!(table.iter().map(|(_, s)| s).sum::<i32>(), 6);
    }

    #[test]
    fn alternation_breaks_same_category_runs() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        engine(&catalog).alternation(&mut table, &symbols(&["🐮", "🐟"]));
        assert_eq!(scores_of(&table, &["🍅", "🫑", "🥕", "🌽"]), vec![4; 4]);
        assert_eq!(table.get(&"🐟".into()), -3);
        assert_eq!(table.get(&"🐮".into()), 0);
    }

    #[test]
    fn alternation_varies_symbol_within_last_category() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // Vegetable then meat: the other meats get the variety bonus.
        engine(&catalog).alternation(&mut table, &symbols(&["🍅", "🐤"]));
        assert_eq!(scores_of(&table, &["🐮", "🐟", "🍤"]), vec![2; 3]);
        assert_eq!(table.get(&"🐤".into()), -3);
        assert_eq!(scores_of(&table, &["🍅", "🫑", "🥕", "🌽"]), vec![0; 4]);
    }

    #[test]
    fn single_entry_only_gets_repeat_penalty() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        engine(&catalog).alternation(&mut table, &symbols(&["🥕"]));
        assert_eq!(table.get(&"🥕".into()), -3);
        assert_eq!(table.iter().map(|(_, s)| s).sum::<i32>(), -3);
    }

    #[test]
    fn rarity_prefers_absent_symbols() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // Only meats are recent, and 🐮 appears twice.
        let round = symbols(&["🐮", "🐟", "🐮", "🍤"]);
        engine(&catalog).rarity(&mut table, &round);
        assert_eq!(table.get(&"🐮".into()), 0);
        assert_eq!(table.get(&"🐟".into()), 2);
        assert_eq!(table.get(&"🐤".into()), 4);
        // Vegetables are absent and their category is under target: 4 + 3.
        assert_eq!(scores_of(&table, &["🍅", "🫑", "🥕", "🌽"]), vec![7; 4]);
        assert!(table.get(&"🐤".into()) > table.get(&"🐮".into()));
    }

    #[test]
    fn scarce_category_bonus_skips_present_members() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        // One vegetable against a target of three.
        let round = symbols(&["🍅", "🐮", "🐟", "🍤"]);
        engine(&catalog).rarity(&mut table, &round);
        assert_eq!(table.get(&"🍅".into()), 2);
        assert_eq!(scores_of(&table, &["🫑", "🥕", "🌽"]), vec![7; 3]);
        assert_eq!(table.get(&"🐤".into()), 4);
    }

    #[test]
    fn rarity_only_looks_at_recent_round() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        let mut round = symbols(&["🌽", "🌽"]);
        round.extend(symbols(&[
            "🐮", "🐟", "🍤", "🐮", "🐟", "🍤", "🍅", "🫑", "🥕", "🍅",
        ]));
        engine(&catalog).rarity(&mut table, &round);
        // 🌽 fell out of the ten-entry window.
        assert_eq!(table.get(&"🌽".into()), 4);
        assert_eq!(table.get(&"🍅".into()), 0);
    }

    #[test]
    fn full_score_combines_passes() {
        let catalog = SymbolCatalog::reference();
        let window = symbols(&["🐮", "🫑", "🐟", "🥕", "🍤", "🐤"]);
        let round = {
            let mut round = symbols(&["🍅"]);
            round.extend(window.iter().cloned());
            round
        };
        let table = engine(&catalog).score(&round, &window);
        // 🐤: recency 6, repeat -3, seen once +2.
        assert_eq!(table.get(&"🐤".into()), 5);
        // 🌽: meat surplus 4, edge 3, short run 6, run break 4, unseen 4.
        assert_eq!(table.get(&"🌽".into()), 21);
        // 🍤: recency 4, seen once 2.
        assert_eq!(table.get(&"🍤".into()), 6);
    }

    #[test]
    fn ranked_is_stable_on_ties() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        table.add(&"🌽".into(), 5);
        let ranked: Vec<_> = table
            .ranked(&catalog, Category::A)
            .into_iter()
            .map(|(symbol, _)| symbol)
            .collect();
        assert_eq!(ranked, symbols(&["🌽", "🍅", "🫑", "🥕"]));
    }

    #[test]
    fn unknown_symbols_do_not_enter_the_table() {
        let catalog = SymbolCatalog::reference();
        let mut table = ScoreTable::zeroed(&catalog);
        table.add(&"🍕".into(), 10);
        assert_eq!(table.get(&"🍕".into()), 0);
        assert_eq!(table.iter().count(), 8);
    }

    #[test]
    fn bootstrap_draws_balanced_sets() {
        let catalog = SymbolCatalog::reference();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let order = bootstrap_order(&catalog, 3, &mut rng);
            assert_eq!(order.len(), 6);
            for category in Category::ALL {
                let members: Vec<_> = order
                    .iter()
                    .filter(|s| catalog.is_in(s, category))
                    .collect();
                assert_eq!(members.len(), 3);
                for (idx, symbol) in members.iter().enumerate() {
                    assert!(!members[idx + 1..].contains(symbol));
                }
            }
        }
    }
}
