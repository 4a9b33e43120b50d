//! Zefania XML -> verse cache + offset table + index.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write},
    path::Path,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use super::{
    freshness::{unix_seconds, CacheState, FileClock},
    CorpusIndex, CorpusPaths, Verse, VerseUnavailable,
};
use crate::utils::{persist, temp_sibling, write_atomic};

/// Books numbered below this are Old Testament and are not indexed.
pub const NEW_TESTAMENT_FIRST_BOOK: u32 = 40;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("xml: {0}")]
    Xml(String),

    #[error("i/o: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] crate::Error),
}

fn xml_err(e: impl std::fmt::Display) -> IndexError {
    IndexError::Xml(e.to_string())
}

pub struct CorpusIndexer {
    clock: Arc<dyn FileClock>,
    rebuild_lock: Mutex<()>,
}

impl CorpusIndexer {
    pub fn new(clock: Arc<dyn FileClock>) -> Self {
        Self {
            clock,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Rebuild the cache if it is missing or older than the source, then return its index.
    ///
    /// Callers are serialized: whoever waits behind a rebuild finds the fresh cache.
    pub fn ensure_fresh(&self, paths: &CorpusPaths) -> Result<CorpusIndex, VerseUnavailable> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(|p| p.into_inner());

        let Some(state) = CacheState::observe(self.clock.as_ref(), paths) else {
            tracing::warn!(source = %paths.source.display(), "bible source document not found");
            return Err(VerseUnavailable::CorpusMissing);
        };

        if state.is_fresh() {
            match load_index(&paths.index) {
                Ok(index) => return Ok(index),
                Err(e) => {
                    tracing::warn!(index = %paths.index.display(), error = %e, "bible index unreadable, rebuilding");
                }
            }
        }

        self.rebuild(paths, state.source_version).map_err(|e| {
            match &e {
                IndexError::Xml(_) => {
                    tracing::warn!(source = %paths.source.display(), error = %e, "failed to parse bible source")
                }
                _ => {
                    tracing::error!(cache = %paths.cache.display(), error = %e, "failed to write bible cache")
                }
            }
            VerseUnavailable::CorpusUnreadable(e.to_string())
        })
    }

    /// Parse the source and replace cache, offsets and index.
    ///
    /// Output goes to uniquely named temp files that are renamed into place,
    /// so concurrent rebuilds (other processes included) never share a file.
    /// On failure the temp files are removed and the published files are left untouched.
    pub fn rebuild(
        &self,
        paths: &CorpusPaths,
        source_version: SystemTime,
    ) -> Result<CorpusIndex, IndexError> {
        let offsets_path = paths.offsets();
        let mut cache_tmp = temp_sibling(&paths.cache)?;
        let mut offsets_tmp = temp_sibling(&offsets_path)?;

        let verse_count = write_cache_files(
            &paths.source,
            cache_tmp.as_file_mut(),
            offsets_tmp.as_file_mut(),
        )?;

        // The offset table records the cache length, so readers ignore a
        // table that does not belong to the cache they opened.
        persist(cache_tmp, &paths.cache)?;
        persist(offsets_tmp, &offsets_path)?;

        let index = CorpusIndex {
            verse_count,
            built_at: unix_seconds(self.clock.now()),
            source_mtime: unix_seconds(source_version),
        };
        let json = serde_json::to_string_pretty(&index)?;
        write_atomic(&paths.index, json.as_bytes())?;

        tracing::info!(
            verses = verse_count,
            cache = %paths.cache.display(),
            "bible cache rebuilt"
        );
        Ok(index)
    }
}

pub fn load_index(path: &Path) -> Result<CorpusIndex, IndexError> {
    let txt = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&txt)?)
}

/// Offset table layout: cache length, then one byte offset per verse line (all LE u64).
fn write_cache_files(
    source: &Path,
    cache: &mut File,
    offsets: &mut File,
) -> Result<usize, IndexError> {
    let input = BufReader::new(File::open(source)?);
    let mut cache_out = BufWriter::new(cache);
    let mut offsets_out = BufWriter::new(&mut *offsets);
    offsets_out.write_all(&0u64.to_le_bytes())?;
    let mut offset: u64 = 0;

    let count = parse_corpus(input, |verse| {
        let mut line = serde_json::to_string(&verse)?;
        line.push('\n');
        offsets_out.write_all(&offset.to_le_bytes())?;
        cache_out.write_all(line.as_bytes())?;
        offset += line.len() as u64;
        Ok(())
    })?;

    cache_out.flush()?;
    offsets_out.flush()?;
    drop(offsets_out);

    offsets.seek(SeekFrom::Start(0))?;
    offsets.write_all(&offset.to_le_bytes())?;
    Ok(count)
}

#[derive(Debug)]
struct BookCtx {
    name: String,
    retained: bool,
}

#[derive(Debug)]
struct OpenVerse {
    number: u32,
    text: String,
}

/// Stream a Zefania document, passing every retained New Testament verse to `sink`.
///
/// Returns the number of verses emitted.
pub fn parse_corpus<R: BufRead>(
    input: R,
    mut sink: impl FnMut(Verse) -> Result<(), IndexError>,
) -> Result<usize, IndexError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut book: Option<BookCtx> = None;
    let mut chapter: u32 = 0;
    let mut verse: Option<OpenVerse> = None;
    let mut note_depth = 0usize;
    let mut count = 0usize;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) => match e.name().as_ref() {
                b"BIBLEBOOK" => book = Some(open_book(&e)?),
                b"CHAPTER" => chapter = number_attr(&e, "cnumber")?,
                b"VERS" => {
                    verse = Some(OpenVerse {
                        number: number_attr(&e, "vnumber")?,
                        text: String::new(),
                    })
                }
                b"NOTE" if verse.is_some() => note_depth += 1,
                _ => {}
            },
            Event::Empty(e) => {
                // `<BR/>` and friends inside a verse separate words.
                if let Some(v) = verse.as_mut() {
                    if e.name().as_ref() != b"NOTE".as_slice() {
                        v.text.push(' ');
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"BIBLEBOOK" => book = None,
                b"CHAPTER" => chapter = 0,
                b"NOTE" if note_depth > 0 => note_depth -= 1,
                b"VERS" => {
                    note_depth = 0;
                    if let Some(v) = finish_verse(verse.take(), book.as_ref(), chapter) {
                        sink(v)?;
                        count += 1;
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(v) = verse.as_mut() {
                    if note_depth == 0 {
                        v.text.push_str(&t.unescape().map_err(xml_err)?);
                    }
                }
            }
            Event::CData(t) => {
                if let Some(v) = verse.as_mut() {
                    if note_depth == 0 {
                        v.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(count)
}

fn finish_verse(open: Option<OpenVerse>, book: Option<&BookCtx>, chapter: u32) -> Option<Verse> {
    let open = open?;
    let book = book.filter(|b| b.retained)?;
    let v = Verse {
        book: book.name.clone(),
        chapter,
        verse: open.number,
        text: collapse_whitespace(&open.text),
    };
    v.is_valid().then_some(v)
}

fn open_book(e: &BytesStart<'_>) -> Result<BookCtx, IndexError> {
    let number = number_attr(e, "bnumber")?;
    let name = string_attr(e, "bname")?.unwrap_or_default();
    Ok(BookCtx {
        retained: number >= NEW_TESTAMENT_FIRST_BOOK,
        name,
    })
}

fn string_attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, IndexError> {
    match e.try_get_attribute(name).map_err(xml_err)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_err)?.into_owned())),
        None => Ok(None),
    }
}

/// Missing or malformed numbers read as 0 (never retained).
fn number_attr(e: &BytesStart<'_>, name: &str) -> Result<u32, IndexError> {
    Ok(string_attr(e, name)?
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
