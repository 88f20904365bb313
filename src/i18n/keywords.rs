//! Keyword tables: the per-language vocabulary of a feature file.
//!
//! A [`KeywordTable`] maps each structural [`Concept`] to a pipe-delimited
//! alternation of literal keywords, e.g. `"*|Given"`. A [`KeywordRegistry`]
//! holds one table per language identifier and is read-only once built.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::{Error, Result};

const BUILTIN_YAML: &str = include_str!("languages.yml");

/// Separator between keyword alternatives.
pub const ALTERNATIVE_SEPARATOR: char = '|';

/// Marker on an alternative that glues the keyword to the next word.
pub const GLUE_MARKER: char = '<';

// ============================================================================
// CONCEPTS
// ============================================================================

/// One structural role in a feature file that every language names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Concept {
    Name,
    Native,
    Feature,
    Background,
    Scenario,
    ScenarioOutline,
    Examples,
    Given,
    When,
    Then,
    And,
    But,
}

impl Concept {
    /// Every concept a complete table defines, in canonical order.
    pub const ALL: [Concept; 12] = [
        Concept::Name,
        Concept::Native,
        Concept::Feature,
        Concept::Background,
        Concept::Scenario,
        Concept::ScenarioOutline,
        Concept::Examples,
        Concept::Given,
        Concept::When,
        Concept::Then,
        Concept::And,
        Concept::But,
    ];

    /// The step-leading adverbs.
    pub const STEPS: [Concept; 5] = [
        Concept::Given,
        Concept::When,
        Concept::Then,
        Concept::And,
        Concept::But,
    ];

    /// The key used for this concept in keyword tables.
    pub const fn as_str(self) -> &'static str {
        match self {
            Concept::Name => "name",
            Concept::Native => "native",
            Concept::Feature => "feature",
            Concept::Background => "background",
            Concept::Scenario => "scenario",
            Concept::ScenarioOutline => "scenario_outline",
            Concept::Examples => "examples",
            Concept::Given => "given",
            Concept::When => "when",
            Concept::Then => "then",
            Concept::And => "and",
            Concept::But => "but",
        }
    }

    /// Whether this concept leads a step line.
    pub fn is_step(self) -> bool {
        Self::STEPS.contains(&self)
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Concept {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Concept::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown keyword concept: {s:?}"))
    }
}

// ============================================================================
// KEYWORD TABLE
// ============================================================================

/// One language's keyword table.
///
/// Entries keep their insertion order. Keys that are not concept names are
/// kept but never consulted; `null` values count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "IndexMap<SmolStr, Option<String>>")]
pub struct KeywordTable {
    entries: IndexMap<SmolStr, String>,
}

impl KeywordTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly for tests and programmatic tables.
    pub fn with(mut self, concept: Concept, alternation: impl Into<String>) -> Self {
        self.insert(concept, alternation);
        self
    }

    /// Set the alternation string for a concept.
    pub fn insert(&mut self, concept: Concept, alternation: impl Into<String>) {
        self.entries
            .insert(SmolStr::new_static(concept.as_str()), alternation.into());
    }

    /// Remove a concept, returning its alternation string.
    pub fn remove(&mut self, concept: Concept) -> Option<String> {
        self.entries.shift_remove(concept.as_str())
    }

    /// The raw alternation string for a concept.
    pub fn get(&self, concept: Concept) -> Option<&str> {
        self.entries.get(concept.as_str()).map(String::as_str)
    }

    /// Check whether a concept is defined.
    pub fn contains(&self, concept: Concept) -> bool {
        self.entries.contains_key(concept.as_str())
    }

    /// Number of entries, including unknown keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<IndexMap<SmolStr, Option<String>>> for KeywordTable {
    fn from(raw: IndexMap<SmolStr, Option<String>>) -> Self {
        let entries = raw
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        Self { entries }
    }
}

impl FromIterator<(Concept, String)> for KeywordTable {
    fn from_iter<I: IntoIterator<Item = (Concept, String)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (concept, alternation) in iter {
            table.insert(concept, alternation);
        }
        table
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Language identifier → keyword table, sorted by identifier.
#[derive(Clone, Debug, Default)]
pub struct KeywordRegistry {
    tables: BTreeMap<SmolStr, Arc<KeywordTable>>,
}

impl KeywordRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_YAML)
    }

    /// Load a registry in the shape of Cucumber's `languages.yml`.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: BTreeMap<SmolStr, KeywordTable> =
            serde_yaml::from_str(yaml).map_err(|e| Error::InvalidLanguageDefinition {
                language: "<registry>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(raw.into_iter().collect())
    }

    /// Register a table, replacing any previous one for the identifier.
    pub fn insert(&mut self, identifier: impl Into<SmolStr>, table: KeywordTable) {
        self.tables.insert(identifier.into(), Arc::new(table));
    }

    /// Builder-style insertion.
    pub fn with(mut self, identifier: impl Into<SmolStr>, table: KeywordTable) -> Self {
        self.insert(identifier, table);
        self
    }

    /// Look up the table for a language.
    pub fn get(&self, identifier: &str) -> Option<&Arc<KeywordTable>> {
        self.tables.get(identifier)
    }

    /// Check if a language is registered.
    pub fn contains(&self, identifier: &str) -> bool {
        self.tables.contains_key(identifier)
    }

    /// All registered identifiers, sorted.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(SmolStr::as_str)
    }

    /// Get the number of languages.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<(SmolStr, KeywordTable)> for KeywordRegistry {
    fn from_iter<I: IntoIterator<Item = (SmolStr, KeywordTable)>>(iter: I) -> Self {
        let tables = iter
            .into_iter()
            .map(|(id, table)| (id, Arc::new(table)))
            .collect();
        Self { tables }
    }
}
