//! # polyglot-base
//!
//! Multi-language feature-file parsing: pick the keyword table for a natural
//! language, build a grammar or lexer for it, and parse documents into a
//! syntax tree tagged with the language used.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser  → Backends (runtime pest grammar, line lexer) + dispatcher
//!   ↓
//! i18n    → Keyword tables, language descriptors, language cache
//!   ↓
//! syntax  → Syntax tree, tree builder, scenario filters
//!   ↓
//! base    → Primitives (LineCol)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use polyglot::syntax::Filter;
//!
//! let english = polyglot::get("en")?;
//! let feature = english.parse("Feature: Login\n", "login.feature", &Filter::new())?;
//! assert_eq!(feature.unwrap().language_identifier(), Some("en"));
//! # Ok::<(), polyglot::Error>(())
//! ```

/// Foundation types: LineCol
pub mod base;

/// Error and result types
pub mod error;

/// Keyword tables, language descriptors and the language cache
pub mod i18n;

/// Parsing backends and the dispatcher
pub mod parser;

/// Syntax tree, builder and filters
pub mod syntax;

// Re-export commonly needed items
pub use i18n::keywords;
pub use i18n::{LanguageCache, NaturalLanguage, all, get};
pub use parser::{Backend, ParserConfig};

pub use base::LineCol;
pub use error::{Error, Result, SyntaxError};
