//! Language descriptors: one keyword table plus everything derived from it.
//!
//! A [`NaturalLanguage`] is created once per language identifier by the
//! [`LanguageCache`](super::LanguageCache). It derives the grammar identifier
//! at construction, derives keyword lists on demand, and owns the compiled
//! grammar parser once the grammar backend has been used.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use once_cell::sync::OnceCell;
use smol_str::SmolStr;
use tracing::debug;

use super::keywords::{ALTERNATIVE_SEPARATOR, Concept, GLUE_MARKER, KeywordTable};
use crate::error::{Error, Result};
use crate::parser::{Backend, CompiledParser, ParseDispatcher};
use crate::syntax::{Feature, Filter};

/// Characters stripped from keywords to form adverbs.
const ADVERB_PUNCTUATION: [char; 2] = [GLUE_MARKER, '\''];

/// Normalize a keyword for embedding before step text.
///
/// A keyword ending in the glue marker loses the marker and gets no space;
/// any other keyword ends in exactly one space.
pub fn keyword_space(keyword: &str) -> String {
    let keyword = keyword.trim_end();
    match keyword.strip_suffix(GLUE_MARKER) {
        Some(glued) => glued.to_string(),
        None => format!("{keyword} "),
    }
}

/// A supported language and its keyword vocabulary.
pub struct NaturalLanguage {
    identifier: SmolStr,
    grammar_identifier: SmolStr,
    keywords: Arc<KeywordTable>,
    dispatcher: Arc<ParseDispatcher>,
    step_keywords: OnceCell<Vec<String>>,
    parser: OnceCell<CompiledParser>,
}

impl NaturalLanguage {
    /// Build a descriptor; fails if the table has no `name`.
    pub(crate) fn new(
        identifier: impl Into<SmolStr>,
        keywords: Arc<KeywordTable>,
        dispatcher: Arc<ParseDispatcher>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let name = keywords
            .get(Concept::Name)
            .ok_or_else(|| Error::InvalidLanguageDefinition {
                language: identifier.to_string(),
                reason: "missing `name` entry".to_string(),
            })?;
        let grammar_identifier: SmolStr = name.chars().filter(|c| !c.is_whitespace()).collect();
        debug!(language = %identifier, grammar = %grammar_identifier, "created language");

        Ok(Self {
            identifier,
            grammar_identifier,
            keywords,
            dispatcher,
            step_keywords: OnceCell::new(),
            parser: OnceCell::new(),
        })
    }

    /// The identifier this language is registered under, e.g. `"fr"`.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whitespace-free form of the language name, e.g. `"Chinesesimplified"`.
    pub fn grammar_identifier(&self) -> &str {
        &self.grammar_identifier
    }

    /// English name of the language.
    pub fn name(&self) -> &str {
        self.keywords.get(Concept::Name).unwrap_or_default()
    }

    /// Native name of the language, if the table provides one.
    pub fn native(&self) -> Option<&str> {
        self.keywords.get(Concept::Native)
    }

    /// The keyword table this language was built from.
    pub fn table(&self) -> &KeywordTable {
        &self.keywords
    }

    /// The first required concept the table lacks, if any.
    ///
    /// Advisory only: an incomplete language can still be constructed and
    /// parse documents that avoid the missing concept.
    pub fn is_incomplete(&self) -> Option<Concept> {
        Concept::ALL
            .into_iter()
            .find(|concept| !self.keywords.contains(*concept))
    }

    /// The literal keywords for a concept.
    ///
    /// With `with_trailing_space`, keywords are normalized by [`keyword_space`].
    pub fn keywords_for(&self, concept: Concept, with_trailing_space: bool) -> Result<Vec<String>> {
        let alternation = self
            .keywords
            .get(concept)
            .ok_or_else(|| Error::MissingConcept {
                language: self.identifier.to_string(),
                concept,
            })?;
        Ok(alternation
            .split(ALTERNATIVE_SEPARATOR)
            .map(|kw| {
                if with_trailing_space {
                    keyword_space(kw)
                } else {
                    kw.to_string()
                }
            })
            .collect())
    }

    pub fn feature_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::Feature, false)
    }

    pub fn background_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::Background, false)
    }

    pub fn scenario_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::Scenario, false)
    }

    pub fn scenario_outline_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::ScenarioOutline, false)
    }

    pub fn examples_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::Examples, false)
    }

    pub fn and_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::And, true)
    }

    pub fn but_keywords(&self) -> Result<Vec<String>> {
        self.keywords_for(Concept::But, true)
    }

    /// Every step keyword, space-normalized, without duplicates, in
    /// given/when/then/and/but order.
    pub fn step_keywords(&self) -> Result<&[String]> {
        self.step_keywords
            .get_or_try_init(|| {
                let mut unique = IndexSet::new();
                for concept in Concept::STEPS {
                    unique.extend(self.keywords_for(concept, true)?);
                }
                Ok(unique.into_iter().collect())
            })
            .map(Vec::as_slice)
    }

    /// Bare step words: keywords with whitespace, glue markers and
    /// apostrophes removed. Used by tooling that matches plain tokens.
    pub fn adverbs(&self) -> Result<Vec<String>> {
        let mut adverbs = IndexSet::new();
        for concept in Concept::STEPS {
            for keyword in self.keywords_for(concept, false)? {
                let bare: String = keyword
                    .chars()
                    .filter(|c| !c.is_whitespace() && !ADVERB_PUNCTUATION.contains(c))
                    .collect();
                adverbs.insert(bare);
            }
        }
        Ok(adverbs.into_iter().collect())
    }

    /// The compiled grammar parser, compiling it on first use.
    pub fn parser(&self) -> Result<&CompiledParser> {
        self.parser
            .get_or_try_init(|| self.dispatcher.grammar().compile(self))
    }

    /// Whether the grammar for this language has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.parser.get().is_some()
    }

    /// Parse a document with the backend currently configured for this
    /// language's cache, and tag the result with this language.
    pub fn parse(self: &Arc<Self>, source: &str, path: &str, filter: &Filter) -> Result<Option<Feature>> {
        self.dispatcher.parse(self, source, path, filter)
    }

    /// Parse with an explicit backend, ignoring the configured one.
    pub fn parse_with(
        self: &Arc<Self>,
        backend: Backend,
        source: &str,
        path: &str,
        filter: &Filter,
    ) -> Result<Option<Feature>> {
        self.dispatcher.parse_with(backend, self, source, path, filter)
    }
}

impl fmt::Debug for NaturalLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaturalLanguage")
            .field("identifier", &self.identifier)
            .field("grammar_identifier", &self.grammar_identifier)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}
