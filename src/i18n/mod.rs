//! Natural-language support: keyword tables, language descriptors and the
//! cache that hands them out.

pub mod keywords;

mod cache;
mod language;

pub use cache::{LanguageCache, all, get, global};
pub use keywords::{Concept, KeywordRegistry, KeywordTable};
pub use language::{NaturalLanguage, keyword_space};
