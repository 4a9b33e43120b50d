use std::{fs, io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::{errors::Error, Result};

// ============== Atomic File Writes ==============

/// Uniquely named temp file next to `path` (same directory, so `persist` is an atomic rename).
///
/// Dropped without `persist` it removes itself.
pub fn temp_sibling(path: &Path) -> Result<NamedTempFile> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    Ok(tempfile::Builder::new().prefix(".otb-").tempfile_in(dir)?)
}

/// Move a finished temp file over `path`.
pub fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `bytes` to a temp sibling and rename it over `path`.
///
/// Readers in other processes see either the old or the new file, never a prefix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = temp_sibling(path)?;
    tmp.write_all(bytes)?;
    persist(tmp, path)
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| Error::InvalidPath {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// ============== Text Helpers ==============

pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}
