//! Parsing backends and the dispatcher that selects between them.
//!
//! Two interchangeable backends turn feature-file text into a [`Feature`]:
//!
//! - [`Backend::Treetop`] renders a grammar from the language's keywords,
//!   compiles it at runtime with `pest_meta` and runs it on a `pest_vm`
//!   ([`grammar`], [`walker`]).
//! - [`Backend::Gherkin`] scans the text line by line against the keyword
//!   table ([`lexer`], [`tokens`]).
//!
//! Both feed the same [`AstBuilder`](crate::syntax::AstBuilder), so they
//! accept the same documents and produce equal trees.

pub mod grammar;
pub mod lexer;
pub mod tokens;
pub mod walker;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

pub use grammar::{CompiledParser, GrammarCompiler};
pub use lexer::GherkinLexer;

use crate::error::Result;
use crate::i18n::{Concept, NaturalLanguage};
use crate::syntax::{Feature, Filter};

/// The grammar template shipped with the crate.
pub const DEFAULT_GRAMMAR_TEMPLATE: &str = include_str!("i18n.pest.jinja");

/// Which backend turns text into a tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Runtime-compiled grammar.
    #[default]
    Treetop,
    /// Line lexer.
    Gherkin,
}

impl Backend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Backend::Treetop => "treetop",
            Backend::Gherkin => "gherkin",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "treetop" => Ok(Backend::Treetop),
            "gherkin" => Ok(Backend::Gherkin),
            other => Err(format!("unknown parser backend: {other:?}")),
        }
    }
}

/// Settings shared by every language of a [`LanguageCache`](crate::i18n::LanguageCache).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub backend: Backend,
    /// Jinja template rendering a pest grammar for one language.
    pub grammar_template: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            grammar_template: DEFAULT_GRAMMAR_TEMPLATE.to_string(),
        }
    }
}

impl ParserConfig {
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_grammar_template(mut self, template: impl Into<String>) -> Self {
        self.grammar_template = template.into();
        self
    }
}

/// Routes parse requests to the selected backend and stamps the language on
/// the result.
pub struct ParseDispatcher {
    backend: RwLock<Backend>,
    grammar: GrammarCompiler,
}

impl ParseDispatcher {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            backend: RwLock::new(config.backend),
            grammar: GrammarCompiler::new(config.grammar_template),
        }
    }

    pub fn backend(&self) -> Backend {
        *self.backend.read()
    }

    pub fn set_backend(&self, backend: Backend) {
        debug!(%backend, "switching parser backend");
        *self.backend.write() = backend;
    }

    pub fn grammar(&self) -> &GrammarCompiler {
        &self.grammar
    }

    /// Parse with the currently selected backend.
    pub fn parse(
        &self,
        language: &Arc<NaturalLanguage>,
        source: &str,
        path: &str,
        filter: &Filter,
    ) -> Result<Option<Feature>> {
        self.parse_with(self.backend(), language, source, path, filter)
    }

    pub fn parse_with(
        &self,
        backend: Backend,
        language: &Arc<NaturalLanguage>,
        source: &str,
        path: &str,
        filter: &Filter,
    ) -> Result<Option<Feature>> {
        debug!(%backend, language = language.identifier(), path, "parsing");
        let feature = match backend {
            Backend::Treetop => language.parser()?.parse_or_fail(source, path, filter)?,
            Backend::Gherkin => lexer::parse(language, source, path, filter)?,
        };
        Ok(feature.map(|mut feature| {
            feature.language = Some(Arc::clone(language));
            feature
        }))
    }
}

impl fmt::Debug for ParseDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseDispatcher")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

/// Keywords of a concept, or none if the table lacks it.
pub(crate) fn present_keywords(
    language: &NaturalLanguage,
    concept: Concept,
    with_trailing_space: bool,
) -> Vec<String> {
    language
        .keywords_for(concept, with_trailing_space)
        .unwrap_or_default()
}

/// Spaced step keywords of every step concept the table defines.
pub(crate) fn present_step_keywords(language: &NaturalLanguage) -> Vec<String> {
    let mut unique = IndexSet::new();
    for concept in Concept::STEPS {
        unique.extend(present_keywords(language, concept, true));
    }
    unique.into_iter().collect()
}

/// Strip up to `indent` leading whitespace characters from every line of a
/// doc string body.
pub(crate) fn dedent(lines: &[&str], indent: usize) -> String {
    lines
        .iter()
        .map(|line| {
            let skip: usize = line
                .chars()
                .take(indent)
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum();
            &line[skip..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line number reported to the builder at end of input.
pub(crate) fn eof_line(source: &str) -> usize {
    source.lines().count() + 1
}
