//! Foundation types shared by both parsing backends.
//!
//! - [`LineCol`] - Line/column positions for diagnostics and tree nodes
//!
//! This module has NO dependencies on other polyglot modules.

mod span;

pub use span::LineCol;
