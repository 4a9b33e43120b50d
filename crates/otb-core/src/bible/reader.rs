//! Random access into the verse cache by ordinal.
//!
//! At most one cache line is held in memory. With the offset table present a
//! read is two seeks; without it the cache is streamed line by line up to the
//! requested ordinal.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use super::{offsets_path, Verse};

const OFFSET_WIDTH: u64 = 8;

/// Read the verse at `ordinal` (0-based). `None` when out of range or unreadable.
pub fn read_by_ordinal(cache: &Path, ordinal: usize) -> Option<Verse> {
    let file = File::open(cache).ok()?;
    let cache_len = file.metadata().ok()?.len();
    match offset_of(&offsets_path(cache), ordinal, cache_len) {
        Ok(Some(offset)) => read_line_at(file, offset),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "offset table unavailable, scanning cache");
            scan_to(file, ordinal)
        }
    }
}

/// `Ok(None)` means the table matches the cache but `ordinal` is past its end.
///
/// The table starts with the length of the cache it was built for; a table
/// from another build is rejected so the caller falls back to scanning.
fn offset_of(offsets: &Path, ordinal: usize, cache_len: u64) -> io::Result<Option<u64>> {
    let mut f = File::open(offsets)?;
    let len = f.metadata()?.len();
    if len < OFFSET_WIDTH {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "offset table truncated"));
    }
    if read_u64(&mut f)? != cache_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "offset table belongs to another cache",
        ));
    }

    let pos = (ordinal as u64)
        .saturating_add(1)
        .saturating_mul(OFFSET_WIDTH);
    if pos.saturating_add(OFFSET_WIDTH) > len {
        return Ok(None);
    }
    f.seek(SeekFrom::Start(pos))?;
    Ok(Some(read_u64(&mut f)?))
}

fn read_u64(f: &mut File) -> io::Result<u64> {
    let mut raw = [0u8; OFFSET_WIDTH as usize];
    f.read_exact(&mut raw)?;
    Ok(u64::from_le_bytes(raw))
}

fn read_line_at(mut f: File, offset: u64) -> Option<Verse> {
    f.seek(SeekFrom::Start(offset)).ok()?;
    let mut line = String::new();
    BufReader::new(f).read_line(&mut line).ok()?;
    decode_line(&line)
}

fn scan_to(f: File, ordinal: usize) -> Option<Verse> {
    let mut reader = BufReader::new(f);
    let mut line = String::new();
    for _ in 0..ordinal {
        line.clear();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
    }
    line.clear();
    reader.read_line(&mut line).ok()?;
    decode_line(&line)
}

fn decode_line(line: &str) -> Option<Verse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str::<Verse>(line)
        .ok()
        .filter(Verse::is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn verse(n: u32) -> Verse {
        Verse {
            book: "Матфея".to_string(),
            chapter: 1,
            verse: n,
            text: format!("стих {n}"),
        }
    }

    /// Writes a cache (and optionally its offset table) the same way the indexer does.
    fn write_cache(dir: &Path, verses: &[Verse], with_offsets: bool) -> std::path::PathBuf {
        let cache = dir.join("bible_verses.jsonl");
        let mut body = String::new();
        let mut offsets = vec![0u8; 8];
        for v in verses {
            offsets.extend_from_slice(&(body.len() as u64).to_le_bytes());
            body.push_str(&serde_json::to_string(v).unwrap());
            body.push('\n');
        }
        offsets[..8].copy_from_slice(&(body.len() as u64).to_le_bytes());
        fs::write(&cache, body).unwrap();
        if with_offsets {
            fs::write(offsets_path(&cache), offsets).unwrap();
        }
        cache
    }

    #[test]
    fn reads_each_ordinal_via_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let verses: Vec<_> = (1..=5).map(verse).collect();
        let cache = write_cache(dir.path(), &verses, true);
        for (i, v) in verses.iter().enumerate() {
            assert_eq!(read_by_ordinal(&cache, i).as_ref(), Some(v));
        }
        assert_eq!(read_by_ordinal(&cache, 5), None);
    }

    #[test]
    fn falls_back_to_scanning_without_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let verses: Vec<_> = (1..=4).map(verse).collect();
        let cache = write_cache(dir.path(), &verses, false);
        assert_eq!(read_by_ordinal(&cache, 3), Some(verse(4)));
        assert_eq!(read_by_ordinal(&cache, 4), None);
        assert_eq!(read_by_ordinal(&cache, usize::MAX), None);
    }

    #[test]
    fn repeated_reads_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cache = write_cache(dir.path(), &[verse(1), verse(2)], true);
        let a = read_by_ordinal(&cache, 1);
        let b = read_by_ordinal(&cache, 1);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn corrupt_line_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("bible_verses.jsonl");
        fs::write(&cache, "{\"book\":\"Марка\"\nnot json\n").unwrap();
        assert_eq!(read_by_ordinal(&cache, 0), None);
        assert_eq!(read_by_ordinal(&cache, 1), None);
    }

    #[test]
    fn missing_cache_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_by_ordinal(&dir.path().join("nope.jsonl"), 0), None);
    }

    #[test]
    fn table_from_another_build_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let old: Vec<_> = (1..=3).map(verse).collect();
        let cache = write_cache(dir.path(), &old, true);
        let stale_table = fs::read(offsets_path(&cache)).unwrap();

        let new: Vec<_> = (10..=15).map(verse).collect();
        write_cache(dir.path(), &new, false);
        fs::write(offsets_path(&cache), stale_table).unwrap();

        assert_eq!(read_by_ordinal(&cache, 1), Some(verse(11)));
        assert_eq!(read_by_ordinal(&cache, 5), Some(verse(15)));
    }

    #[test]
    fn truncated_table_falls_back_to_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let cache = write_cache(dir.path(), &[verse(1), verse(2)], false);
        fs::write(offsets_path(&cache), [1u8, 2, 3]).unwrap();
        assert_eq!(read_by_ordinal(&cache, 1), Some(verse(2)));
    }
}
