use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{bible::CorpusPaths, errors::Error, newsletter::DEFAULT_SEND_DELAY, Result};

/// Typed configuration shared by the bot and the newsletter job.
///
/// Values come from the process environment, with an optional `.env` file in
/// the working directory filling in keys that are not already set.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Storage (generated files)
    pub storage_dir: PathBuf,
    pub bible_xml: PathBuf,
    pub verse_cache: PathBuf,
    pub verse_index: PathBuf,
    pub subscribers_file: PathBuf,

    // Static content
    pub data_dir: PathBuf,
    pub prayers_file: PathBuf,
    pub quotes_file: PathBuf,
    pub holidays_file: PathBuf,

    // Runtime
    pub newsletter_delay: Duration,
    pub client_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str)
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let path = |key: &str| get(key).and_then(non_empty).map(PathBuf::from);

        let storage_dir = path("OTB_STORAGE_DIR").unwrap_or_else(|| PathBuf::from("storage"));
        let bible_xml =
            path("OTB_BIBLE_XML").unwrap_or_else(|| storage_dir.join("rus-synodal.zefania.xml"));
        let verse_cache =
            path("OTB_VERSE_CACHE").unwrap_or_else(|| storage_dir.join("bible_verses.jsonl"));
        let verse_index =
            path("OTB_VERSE_INDEX").unwrap_or_else(|| storage_dir.join("bible_index.json"));
        let subscribers_file =
            path("OTB_SUBSCRIBERS_FILE").unwrap_or_else(|| storage_dir.join("subscribers.json"));

        let data_dir = path("OTB_DATA_DIR").unwrap_or_else(|| PathBuf::from("data"));
        let prayers_file = path("OTB_PRAYERS_FILE").unwrap_or_else(|| data_dir.join("prayers.json"));
        let quotes_file = path("OTB_QUOTES_FILE").unwrap_or_else(|| data_dir.join("quotes.json"));
        let holidays_file =
            path("OTB_HOLIDAYS_FILE").unwrap_or_else(|| data_dir.join("holidays.json"));

        let newsletter_delay = parse_u64(&get, "OTB_NEWSLETTER_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SEND_DELAY);
        let client_timeout =
            Duration::from_secs(parse_u64(&get, "OTB_CLIENT_TIMEOUT_SECS")?.unwrap_or(60));

        Ok(Self {
            telegram_bot_token,
            storage_dir,
            bible_xml,
            verse_cache,
            verse_index,
            subscribers_file,
            data_dir,
            prayers_file,
            quotes_file,
            holidays_file,
            newsletter_delay,
            client_timeout,
        })
    }

    pub fn corpus_paths(&self) -> CorpusPaths {
        CorpusPaths::new(
            self.bible_xml.clone(),
            self.verse_cache.clone(),
            self.verse_index.clone(),
        )
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
