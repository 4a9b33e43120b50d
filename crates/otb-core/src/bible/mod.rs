//! Bible verse corpus: a Zefania XML document flattened into a line-per-verse
//! cache with a small metadata index and an ordinal -> byte offset table.
//!
//! The cache files are derived artifacts. They are rebuilt from the XML
//! whenever the XML is newer than the cache and can be deleted at any time.

pub mod freshness;
pub mod indexer;
pub mod reader;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::picker::UniformPicker;

pub use freshness::{CacheState, FileClock, SystemClock};
pub use indexer::CorpusIndexer;

/// A single retained verse. One JSON object per cache line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl Verse {
    pub fn is_valid(&self) -> bool {
        self.chapter > 0 && self.verse > 0 && !self.text.trim().is_empty()
    }

    /// `Матфея 1:1`
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse)
    }

    /// Verse text followed by its reference in parentheses.
    pub fn to_quote_text(&self) -> String {
        format!("{}\n\n({})", self.text, self.reference())
    }
}

/// Metadata describing the verse cache, stored separately from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusIndex {
    pub verse_count: usize,
    /// Unix seconds when the cache was written.
    pub built_at: i64,
    /// Unix seconds of the source document's mtime at build time.
    pub source_mtime: i64,
}

/// Locations of the source document and its derived files.
#[derive(Clone, Debug)]
pub struct CorpusPaths {
    pub source: PathBuf,
    pub cache: PathBuf,
    pub index: PathBuf,
}

impl CorpusPaths {
    pub fn new(
        source: impl Into<PathBuf>,
        cache: impl Into<PathBuf>,
        index: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            cache: cache.into(),
            index: index.into(),
        }
    }

    pub fn offsets(&self) -> PathBuf {
        offsets_path(&self.cache)
    }
}

/// Offset table sidecar of a verse cache (`bible_verses.jsonl` -> `bible_verses.offsets`).
pub fn offsets_path(cache: &Path) -> PathBuf {
    cache.with_extension("offsets")
}

/// Why a verse could not be produced. Always recoverable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerseUnavailable {
    #[error("bible source document is missing")]
    CorpusMissing,

    #[error("bible source document could not be indexed: {0}")]
    CorpusUnreadable(String),

    #[error("bible index is empty")]
    EmptyIndex,

    #[error("verse #{0} could not be read from the cache")]
    VerseNotFound(usize),
}

impl VerseUnavailable {
    /// User-facing text shown instead of a verse.
    pub fn sentinel(&self) -> &'static str {
        match self {
            VerseUnavailable::CorpusMissing => "Файл Библии не найден.",
            VerseUnavailable::CorpusUnreadable(_) | VerseUnavailable::EmptyIndex => {
                "Не удалось загрузить индекс Библии."
            }
            VerseUnavailable::VerseNotFound(_) => "Не удалось загрузить стих.",
        }
    }
}

/// Random verse lookup over an indexed corpus.
pub struct VerseSource {
    paths: CorpusPaths,
    indexer: CorpusIndexer,
}

impl VerseSource {
    pub fn new(paths: CorpusPaths) -> Self {
        Self::with_clock(paths, Arc::new(SystemClock))
    }

    pub fn with_clock(paths: CorpusPaths, clock: Arc<dyn FileClock>) -> Self {
        Self {
            paths,
            indexer: CorpusIndexer::new(clock),
        }
    }

    pub fn ensure_fresh(&self) -> Result<CorpusIndex, VerseUnavailable> {
        self.indexer.ensure_fresh(&self.paths)
    }

    /// Uniform draw over all retained verses. No weighting by book or chapter.
    pub fn random_verse(&self, picker: &dyn UniformPicker) -> Result<Verse, VerseUnavailable> {
        let index = self.ensure_fresh()?;
        let ordinal = picker
            .pick(index.verse_count)
            .ok_or(VerseUnavailable::EmptyIndex)?;
        reader::read_by_ordinal(&self.paths.cache, ordinal)
            .ok_or(VerseUnavailable::VerseNotFound(ordinal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_reference_and_quote() {
        let v = Verse {
            book: "Матфея".to_string(),
            chapter: 5,
            verse: 8,
            text: "Блаженны чистые сердцем".to_string(),
        };
        assert_eq!(v.reference(), "Матфея 5:8");
        assert_eq!(v.to_quote_text(), "Блаженны чистые сердцем\n\n(Матфея 5:8)");
    }

    #[test]
    fn offsets_sidecar_sits_next_to_cache() {
        let p = CorpusPaths::new("a.xml", "/var/otb/bible_verses.jsonl", "i.json");
        assert_eq!(p.offsets(), PathBuf::from("/var/otb/bible_verses.offsets"));
    }

    #[test]
    fn sentinels_match_failure_kind() {
        assert_eq!(
            VerseUnavailable::CorpusMissing.sentinel(),
            "Файл Библии не найден."
        );
        assert_eq!(
            VerseUnavailable::EmptyIndex.sentinel(),
            VerseUnavailable::CorpusUnreadable("x".into()).sentinel()
        );
        assert_eq!(
            VerseUnavailable::VerseNotFound(3).sentinel(),
            "Не удалось загрузить стих."
        );
    }
}
