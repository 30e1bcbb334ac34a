use crate::error::LoadError;
use crate::source::{load, LoadOptions, TableSource};
use lru::LruCache;
use polars::prelude::DataFrame;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::SystemTime;

/// Identity of a loaded table. Two loads with equal keys produce the same table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// A file on disk, identified without reading it. A rewrite that keeps
    /// the size and lands within the filesystem's timestamp granularity is
    /// not noticed, and the earlier table is served.
    Path {
        path: PathBuf,
        len: u64,
        modified: Option<SystemTime>,
        options: LoadOptions,
    },
    /// Uploaded contents, identified by their hash.
    Upload {
        name: String,
        digest: [u8; 32],
        options: LoadOptions,
    },
}

impl SourceKey {
    pub fn of(source: &TableSource, options: &LoadOptions) -> Result<Self, LoadError> {
        match source {
            TableSource::Path(path) => {
                let io_err = |e| LoadError::Io {
                    path: path.clone(),
                    source: e,
                };
                let canonical = path.canonicalize().map_err(io_err)?;
                let meta = std::fs::metadata(&canonical).map_err(io_err)?;
                Ok(Self::Path {
                    path: canonical,
                    len: meta.len(),
                    modified: meta.modified().ok(),
                    options: options.clone(),
                })
            }
            TableSource::Upload { name, bytes } => Ok(Self::Upload {
                name: name.clone(),
                digest: *blake3::hash(bytes).as_bytes(),
                options: options.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Memoized loader. Bounded LRU; a capacity of 0 means unbounded.
pub struct TableCache {
    entries: LruCache<SourceKey, DataFrame>,
    stats: CacheStats,
}

impl TableCache {
    pub fn new(capacity: usize) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            entries,
            stats: CacheStats::default(),
        }
    }

    /// Return the cached table for this source, loading it on a miss.
    pub fn load(&mut self, source: &TableSource, options: &LoadOptions) -> Result<DataFrame, LoadError> {
        let key = SourceKey::of(source, options)?;
        if let Some(df) = self.entries.get(&key) {
            self.stats.hits += 1;
            tracing::debug!(source = %source.name(), "table cache hit");
            return Ok(df.clone());
        }

        self.stats.misses += 1;
        tracing::debug!(source = %source.name(), "table cache miss");
        let df = load(source, options)?;
        if self.entries.len() == self.entries.cap().get() && !self.entries.contains(&key) {
            self.stats.evictions += 1;
        }
        self.entries.put(key, df.clone());
        Ok(df)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
