use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Opaque game token, identified by its glyph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Wraps a glyph.
    #[must_use]
    pub fn new(glyph: impl Into<String>) -> Self {
        Self(glyph.into())
    }

    /// Glyph text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(glyph: &str) -> Self {
        Self::new(glyph)
    }
}

/// One of the two disjoint groups partitioning the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// First category (vegetables in the reference catalog).
    A,
    /// Second category (meats in the reference catalog).
    B,
}

impl Category {
    /// Both categories in declaration order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The other category.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Symbol declaration with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Glyph used as the symbol identity.
    pub glyph: String,
    /// Human readable name.
    pub name: String,
}

impl SymbolSpec {
    fn new(glyph: &str, name: &str) -> Self {
        Self {
            glyph: glyph.into(),
            name: name.into(),
        }
    }
}

/// Declaration of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Category label (e.g. `Vegetables`).
    pub label: String,
    /// Badge glyph shown next to predictions of this category.
    pub badge: String,
    /// Member symbols in declaration order.
    pub symbols: Vec<SymbolSpec>,
}

/// Static two-category symbol universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    /// Category A declaration.
    pub a: CategorySpec,
    /// Category B declaration.
    pub b: CategorySpec,
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

impl SymbolCatalog {
    /// Four vegetables against four meats.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            a: CategorySpec {
                label: "Vegetables".into(),
                badge: "🥦".into(),
                symbols: vec![
                    SymbolSpec::new("🍅", "Tomato"),
                    SymbolSpec::new("🫑", "Pepper"),
                    SymbolSpec::new("🥕", "Carrot"),
                    SymbolSpec::new("🌽", "Corn"),
                ],
            },
            b: CategorySpec {
                label: "Meats".into(),
                badge: "🍖".into(),
                symbols: vec![
                    SymbolSpec::new("🐮", "Cow"),
                    SymbolSpec::new("🐟", "Fish"),
                    SymbolSpec::new("🍤", "Shrimp"),
                    SymbolSpec::new("🐤", "Chick"),
                ],
            },
        }
    }

    /// Declaration for a category.
    #[must_use]
    pub const fn spec(&self, category: Category) -> &CategorySpec {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
        }
    }

    /// Category label.
    #[must_use]
    pub fn label(&self, category: Category) -> &str {
        &self.spec(category).label
    }

    /// Category badge glyph.
    #[must_use]
    pub fn badge(&self, category: Category) -> &str {
        &self.spec(category).badge
    }

    /// Number of symbols per category.
    #[must_use]
    pub fn category_size(&self) -> usize {
        self.a.symbols.len()
    }

    /// Category owning `symbol`, or `None` for glyphs outside the universe.
    #[must_use]
    pub fn category_of(&self, symbol: &Symbol) -> Option<Category> {
        Category::ALL.into_iter().find(|category| {
            self.spec(*category)
                .symbols
                .iter()
                .any(|spec| spec.glyph == symbol.as_str())
        })
    }

    /// Whether `symbol` belongs to `category`.
    #[must_use]
    pub fn is_in(&self, symbol: &Symbol, category: Category) -> bool {
        self.category_of(symbol) == Some(category)
    }

    /// Symbols of a category in declaration order.
    #[must_use]
    pub fn symbols_in(&self, category: Category) -> Vec<Symbol> {
        self.spec(category)
            .symbols
            .iter()
            .map(|spec| Symbol::new(spec.glyph.as_str()))
            .collect()
    }

    /// Every symbol, category A first.
    #[must_use]
    pub fn universe(&self) -> Vec<Symbol> {
        Category::ALL
            .into_iter()
            .flat_map(|category| self.symbols_in(category))
            .collect()
    }

    /// Display name, falling back to the glyph.
    #[must_use]
    pub fn display_name(&self, symbol: &Symbol) -> String {
        Category::ALL
            .into_iter()
            .flat_map(|category| self.spec(category).symbols.iter())
            .find(|spec| spec.glyph == symbol.as_str())
            .map_or_else(|| symbol.to_string(), |spec| spec.name.clone())
    }

    /// Resolves user input given as a glyph or a case-insensitive display name.
    pub fn parse(&self, input: &str) -> Result<Symbol, GameError> {
        let needle = input.trim();
        Category::ALL
            .into_iter()
            .flat_map(|category| self.spec(category).symbols.iter())
            .find(|spec| spec.glyph == needle || spec.name.eq_ignore_ascii_case(needle))
            .map(|spec| Symbol::new(spec.glyph.as_str()))
            .ok_or_else(|| GameError::UnknownSymbol(needle.to_string()))
    }

    /// Parses a comma or whitespace separated list of symbols.
    pub fn parse_list(&self, input: &str) -> Result<Vec<Symbol>, GameError> {
        input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| self.parse(part))
            .collect()
    }

    /// Checks the partition: equal, non-empty, disjoint, and deep enough for `top_k`.
    pub fn validate(&self, top_k: usize) -> Result<(), GameError> {
        let size = self.a.symbols.len();
        if size == 0 || self.b.symbols.is_empty() {
            return Err(GameError::InvalidCatalog("categories must not be empty".into()));
        }
        if self.b.symbols.len() != size {
            return Err(GameError::InvalidCatalog(format!(
                "categories must be equal sized ({} vs {})",
                size,
                self.b.symbols.len()
            )));
        }
        if top_k > size {
            return Err(GameError::InvalidCatalog(format!(
                "top_k {top_k} exceeds category size {size}"
            )));
        }
        let mut seen = IndexSet::new();
        for spec in self.a.symbols.iter().chain(&self.b.symbols) {
            if spec.glyph.trim().is_empty() {
                return Err(GameError::InvalidCatalog("empty glyph".into()));
            }
            if !seen.insert(spec.glyph.as_str()) {
                return Err(GameError::InvalidCatalog(format!(
                    "glyph `{}` declared twice",
                    spec.glyph
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_catalog_partitions_universe() {
        let catalog = SymbolCatalog::reference();
        let universe = catalog.universe();
        assert_eq!(universe.len(), 8);
        assert_eq!(catalog.category_of(&"🌽".into()), Some(Category::A));
        assert_eq!(catalog.category_of(&"🐤".into()), Some(Category::B));
        assert_eq!(catalog.category_of(&"🍕".into()), None);
        for symbol in &universe {
            let owners = Category::ALL
                .iter()
                .filter(|category| catalog.is_in(symbol, **category))
                .count();
            assert_eq!(owners, 1);
        }
        assert!(catalog.validate(3).is_ok());
    }

    #[test]
    fn parses_glyphs_and_names() {
        let catalog = SymbolCatalog::reference();
        assert_eq!(catalog.parse("🐟").unwrap(), Symbol::new("🐟"));
        assert_eq!(catalog.parse(" shrimp ").unwrap(), Symbol::new("🍤"));
        assert_eq!(
            catalog.parse("pizza"),
            Err(GameError::UnknownSymbol("pizza".into()))
        );
        let list = catalog.parse_list("🍅, cow 🫑,Fish").unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[1], Symbol::new("🐮"));
    }

    #[test]
    fn display_name_falls_back_to_glyph() {
        let catalog = SymbolCatalog::reference();
        assert_eq!(catalog.display_name(&"🥕".into()), "Carrot");
        assert_eq!(catalog.display_name(&"🍕".into()), "🍕");
        assert_eq!(catalog.badge(Category::B), "🍖");
    }

    #[test]
    fn rejects_unbalanced_or_overlapping_catalogs() {
        let mut catalog = SymbolCatalog::reference();
        catalog.b.symbols.pop();
        assert!(matches!(
            catalog.validate(3),
            Err(GameError::InvalidCatalog(_))
        ));

        let mut catalog = SymbolCatalog::reference();
        catalog.b.symbols[0].glyph = "🍅".into();
        assert!(catalog.validate(3).is_err());

        assert!(SymbolCatalog::reference().validate(5).is_err());
    }
}
