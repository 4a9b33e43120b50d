//! Static devotional content loaded once at startup.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use serde::Deserialize;

use crate::{errors::Error, Result};

/// Primary prayer language; the fallback for every other language.
pub const PRIMARY_LANGUAGE: &str = "русский";
/// Church Slavonic.
pub const CHURCH_SLAVONIC: &str = "цс";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Prayer {
    #[serde(default)]
    pub name: Option<String>,
    /// Language code -> prayer text.
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Quotation {
    /// Author (a saint); `None` for anonymous sayings.
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
}

impl Quotation {
    pub fn author(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Immutable content shared by every handler.
#[derive(Clone, Debug, Default)]
pub struct ContentCatalog {
    pub prayers: Vec<Prayer>,
    pub quotes: Vec<Quotation>,
    /// `MM-DD` -> feast name.
    pub fixed_holidays: BTreeMap<String, String>,
}

impl ContentCatalog {
    pub fn load(prayers: &Path, quotes: &Path, holidays: &Path) -> Result<Self> {
        let catalog = Self {
            prayers: read_json(prayers)?,
            quotes: read_json(quotes)?,
            fixed_holidays: read_json(holidays)?,
        };
        validate_holiday_keys(holidays, &catalog.fixed_holidays)?;

        tracing::info!(
            prayers = catalog.prayers.len(),
            quotes = catalog.quotes.len(),
            holidays = catalog.fixed_holidays.len(),
            "content catalog loaded"
        );
        Ok(catalog)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let txt = fs::read_to_string(path).map_err(|e| Error::Data {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&txt).map_err(|e| Error::Data {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn validate_holiday_keys(path: &Path, table: &BTreeMap<String, String>) -> Result<()> {
    for key in table.keys() {
        let valid = key
            .split_once('-')
            .and_then(|(m, d)| Some((m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)))
            .is_some_and(|(m, d)| key.len() == 5 && (1..=12).contains(&m) && (1..=31).contains(&d));
        if !valid {
            return Err(Error::Data {
                path: path.to_path_buf(),
                reason: format!("holiday key must be MM-DD, got {key:?}"),
            });
        }
    }
    Ok(())
}
