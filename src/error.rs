//! Error types for language lookup, grammar compilation and parsing.

use std::fmt;

use thiserror::Error;

use crate::base::LineCol;
use crate::i18n::Concept;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a language identifier and a syntax tree.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The identifier has no entry in the keyword registry.
    #[error("language not supported: {0:?}")]
    UnsupportedLanguage(String),

    /// A keyword table is unusable, e.g. it has no `name` entry.
    #[error("invalid definition for language {language:?}: {reason}")]
    InvalidLanguageDefinition { language: String, reason: String },

    /// A keyword accessor was called for a concept the table does not define.
    #[error("no {concept} keywords defined for language {language:?}")]
    MissingConcept { language: String, concept: Concept },

    /// The rendered grammar could not be produced or compiled.
    #[error("grammar for language {language:?} failed to compile: {message}")]
    GrammarCompilation { language: String, message: String },

    /// The compiled grammar does not define the expected entry rule.
    #[error("generated parser {expected} not found in grammar for language {language:?}")]
    GeneratedParserNotFound { language: String, expected: String },

    /// The document itself is malformed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// A parse-time diagnostic naming the offending document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub struct SyntaxError {
    /// Path of the document, as supplied by the caller.
    pub path: String,
    /// Where the problem was detected, when known.
    pub position: Option<LineCol>,
    /// What was expected and what was found.
    pub message: String,
}

impl SyntaxError {
    pub fn new(path: impl Into<String>, position: Option<LineCol>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            position,
            message: message.into(),
        }
    }

    /// Diagnostic at a 1-indexed line, column 1.
    pub fn at_line(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::new(
            path,
            Some(LineCol::from_one_indexed(line as u32, 1)),
            message,
        )
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{}:{}: {}", self.path, pos, self.message),
            None => write!(f, "{}: {}", self.path, self.message),
        }
    }
}
