//! Memoized language descriptors.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, error, info};

use super::keywords::KeywordRegistry;
use super::language::NaturalLanguage;
use crate::error::{Error, Result};
use crate::parser::{Backend, ParseDispatcher, ParserConfig};

/// Identifier → descriptor, filled on first request.
///
/// Thread-safe via internal locking. Descriptors are never evicted, so every
/// `get` for an identifier returns the same `Arc`.
pub struct LanguageCache {
    registry: KeywordRegistry,
    dispatcher: Arc<ParseDispatcher>,
    languages: RwLock<FxHashMap<SmolStr, Arc<NaturalLanguage>>>,
}

impl LanguageCache {
    pub fn new(registry: KeywordRegistry, config: ParserConfig) -> Self {
        Self {
            registry,
            dispatcher: Arc::new(ParseDispatcher::new(config)),
            languages: RwLock::new(FxHashMap::default()),
        }
    }

    /// A cache over the embedded keyword tables with default settings.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(KeywordRegistry::builtin()?, ParserConfig::default()))
    }

    /// The descriptor for `identifier`, built on first request.
    pub fn get(&self, identifier: &str) -> Result<Arc<NaturalLanguage>> {
        // Fast path: already built (read lock)
        if let Some(language) = self.languages.read().get(identifier) {
            return Ok(Arc::clone(language));
        }

        let table = self
            .registry
            .get(identifier)
            .ok_or_else(|| Error::UnsupportedLanguage(identifier.to_string()))?;

        // Slow path: build under the write lock
        let mut languages = self.languages.write();

        // Double-check after acquiring write lock
        if let Some(language) = languages.get(identifier) {
            return Ok(Arc::clone(language));
        }

        let language = Arc::new(NaturalLanguage::new(
            identifier,
            Arc::clone(table),
            Arc::clone(&self.dispatcher),
        )?);
        languages.insert(SmolStr::new(identifier), Arc::clone(&language));
        Ok(language)
    }

    /// Every registered language, sorted by identifier.
    ///
    /// Fails on the first table that cannot form a descriptor.
    pub fn all(&self) -> Result<Vec<Arc<NaturalLanguage>>> {
        self.registry.identifiers().map(|id| self.get(id)).collect()
    }

    /// The backend used by [`NaturalLanguage::parse`].
    pub fn backend(&self) -> Backend {
        self.dispatcher.backend()
    }

    /// Switch the backend for every language of this cache.
    ///
    /// Cached descriptors and compiled grammars are kept.
    pub fn set_backend(&self, backend: Backend) {
        self.dispatcher.set_backend(backend);
    }

    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// Number of descriptors built so far.
    pub fn len(&self) -> usize {
        self.languages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a descriptor has been built for `identifier`.
    pub fn is_cached(&self, identifier: &str) -> bool {
        self.languages.read().contains_key(identifier)
    }

    /// Compile the grammar of every language in parallel.
    pub fn precompile_all(&self) -> Result<()> {
        let languages = self.all()?;
        let start = std::time::Instant::now();

        languages
            .par_iter()
            .try_for_each(|language| language.parser().map(|_| ()))?;

        info!(
            count = languages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "precompiled grammars"
        );
        Ok(())
    }
}

impl fmt::Debug for LanguageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageCache")
            .field("registered", &self.registry.len())
            .field("cached", &self.len())
            .field("backend", &self.backend())
            .finish()
    }
}

static GLOBAL: Lazy<Result<LanguageCache>> = Lazy::new(|| {
    let cache = LanguageCache::builtin();
    match &cache {
        Ok(cache) => debug!(languages = cache.registry().len(), "initialized global language cache"),
        Err(err) => error!(%err, "builtin keyword tables failed to load"),
    }
    cache
});

/// The process-wide cache over the embedded keyword tables.
///
/// Fails with the load error if the embedded tables could not be read.
pub fn global() -> Result<&'static LanguageCache> {
    loaded(&GLOBAL)
}

fn loaded(cache: &Result<LanguageCache>) -> Result<&LanguageCache> {
    cache.as_ref().map_err(Clone::clone)
}

/// Shorthand for `global()?.get(identifier)`.
pub fn get(identifier: &str) -> Result<Arc<NaturalLanguage>> {
    global()?.get(identifier)
}

/// Shorthand for `global()?.all()`.
pub fn all() -> Result<Vec<Arc<NaturalLanguage>>> {
    global()?.all()
}
