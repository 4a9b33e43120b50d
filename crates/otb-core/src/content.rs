//! Random content selection: prayers, Bible verses and saint quotations.
//!
//! Nothing here fails across the module boundary. When content cannot be
//! produced the caller gets a fixed user-facing sentinel text instead.

use std::sync::Arc;

use crate::{
    bible::{CorpusIndex, Verse, VerseSource, VerseUnavailable},
    catalog::{ContentCatalog, Quotation, PRIMARY_LANGUAGE},
    domain::{PrayerText, Quote},
    picker::UniformPicker,
};

pub const NO_PRAYERS: &str = "Список молитв пуст.";
pub const PRAYER_TEXT_MISSING: &str = "Текст молитвы не найден.";
pub const NO_QUOTES: &str = "Список цитат пуст.";
pub const NO_SAINT_QUOTES: &str = "Цитаты святых не найдены.";

/// Result of a saint quotation lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaintQuote {
    Found(Quote),
    /// Nothing matched; callers usually follow up with the list of saints.
    NotFound { message: String },
}

pub struct ContentSelector {
    catalog: Arc<ContentCatalog>,
    verses: VerseSource,
    picker: Arc<dyn UniformPicker>,
}

impl ContentSelector {
    pub fn new(
        catalog: Arc<ContentCatalog>,
        verses: VerseSource,
        picker: Arc<dyn UniformPicker>,
    ) -> Self {
        Self {
            catalog,
            verses,
            picker,
        }
    }

    /// Random prayer in `language`, falling back to the primary language.
    pub fn random_prayer(&self, language: &str) -> PrayerText {
        let prayers = &self.catalog.prayers;
        let Some(idx) = self.picker.pick(prayers.len()) else {
            return PrayerText {
                title: None,
                text: NO_PRAYERS.to_string(),
            };
        };

        let prayer = &prayers[idx];
        let title = prayer.name.clone();
        let text = prayer
            .data
            .get(language)
            .or_else(|| prayer.data.get(PRIMARY_LANGUAGE))
            .map(|t| t.trim())
            .unwrap_or_default();

        if text.is_empty() {
            return PrayerText {
                title,
                text: PRAYER_TEXT_MISSING.to_string(),
            };
        }
        PrayerText {
            title,
            text: text.to_string(),
        }
    }

    /// Build or validate the verse cache ahead of the first draw.
    pub fn warm_verse_cache(&self) -> Result<CorpusIndex, VerseUnavailable> {
        self.verses.ensure_fresh()
    }

    /// Uniformly drawn New Testament verse, with the tagged failure reason.
    pub fn try_random_verse(&self) -> Result<Verse, VerseUnavailable> {
        self.verses.random_verse(self.picker.as_ref())
    }

    /// Random verse formatted as `<text>\n\n(<book> <chapter>:<verse>)`, or a sentinel.
    pub fn random_verse(&self) -> Quote {
        let text = match self.try_random_verse() {
            Ok(v) => v.to_quote_text(),
            Err(e) => {
                tracing::warn!(reason = %e, "random verse unavailable");
                e.sentinel().to_string()
            }
        };
        Quote { author: None, text }
    }

    /// Distinct quotation authors in first-seen order (exact, case-sensitive).
    pub fn list_saint_authors(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for author in self.catalog.quotes.iter().filter_map(Quotation::author) {
            if !out.iter().any(|a| a == author) {
                out.push(author.to_string());
            }
        }
        out
    }

    /// Random saint quotation, optionally restricted to authors containing `filter`
    /// (case-insensitive). Anonymous quotations are never drawn.
    pub fn random_saint_quotation(&self, filter: Option<&str>) -> SaintQuote {
        let quotes = &self.catalog.quotes;
        if quotes.is_empty() {
            return SaintQuote::Found(Quote {
                author: None,
                text: NO_QUOTES.to_string(),
            });
        }

        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        let pool: Vec<&Quotation> = match filter {
            Some(needle) => {
                let needle = needle.to_lowercase();
                quotes
                    .iter()
                    .filter(|q| {
                        q.author()
                            .is_some_and(|a| a.to_lowercase().contains(&needle))
                    })
                    .collect()
            }
            None => quotes.iter().filter(|q| q.author().is_some()).collect(),
        };

        let Some(idx) = self.picker.pick(pool.len()) else {
            let message = match filter {
                Some(name) => format!("Цитаты святого '{name}' не найдены."),
                None => NO_SAINT_QUOTES.to_string(),
            };
            return SaintQuote::NotFound { message };
        };

        let q = pool[idx];
        SaintQuote::Found(Quote {
            author: q.author().map(str::to_string),
            text: q.text.clone(),
        })
    }
}
