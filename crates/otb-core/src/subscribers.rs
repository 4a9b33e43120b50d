//! Newsletter subscribers persisted as a JSON array of chat ids.
//!
//! Every mutation re-reads and rewrites the whole file. Mutations inside one
//! process are serialized; two processes writing at once can still lose an
//! update (last writer wins).

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    domain::ChatId,
    errors::Error,
    utils::{ensure_parent_dir, write_atomic},
    Result,
};

pub struct SubscriberRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SubscriberRegistry {
    /// Open the registry, creating the directory and an empty `[]` file if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        if !path.exists() {
            save(&path, &[])?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` if newly added, `false` if already subscribed.
    pub fn add(&self, id: ChatId) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut ids = load(&self.path)?;
        if ids.contains(&id) {
            return Ok(false);
        }
        ids.push(id);
        save(&self.path, &ids)?;
        tracing::info!(chat_id = id.0, total = ids.len(), "subscriber added");
        Ok(true)
    }

    /// `true` if removed, `false` if it was not subscribed.
    pub fn remove(&self, id: ChatId) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut ids = load(&self.path)?;
        let Some(pos) = ids.iter().position(|x| *x == id) else {
            return Ok(false);
        };
        ids.remove(pos);
        save(&self.path, &ids)?;
        tracing::info!(chat_id = id.0, total = ids.len(), "subscriber removed");
        Ok(true)
    }

    /// All subscribers in insertion order.
    pub fn list(&self) -> Result<Vec<ChatId>> {
        load(&self.path)
    }
}

fn load(path: &Path) -> Result<Vec<ChatId>> {
    let txt = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if txt.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<ChatId> = serde_json::from_str(&txt).map_err(|e| Error::Data {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    // Hand-edited files may carry duplicates; keep the first occurrence.
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    Ok(ids)
}

fn save(path: &Path, ids: &[ChatId]) -> Result<()> {
    let txt = serde_json::to_string(ids)?;
    write_atomic(path, txt.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, SubscriberRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let reg = SubscriberRegistry::open(dir.path().join("storage/subscribers.json")).unwrap();
        (dir, reg)
    }

    #[test]
    fn open_creates_empty_file() {
        let (_dir, reg) = registry();
        assert_eq!(fs::read_to_string(reg.path()).unwrap(), "[]");
        assert!(reg.list().unwrap().is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let (_dir, reg) = registry();
        assert!(reg.add(ChatId(7)).unwrap());
        assert!(!reg.add(ChatId(7)).unwrap());
        assert_eq!(reg.list().unwrap(), vec![ChatId(7)]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let (_dir, reg) = registry();
        reg.add(ChatId(1)).unwrap();
        let before = fs::read_to_string(reg.path()).unwrap();
        assert!(!reg.remove(ChatId(2)).unwrap());
        assert_eq!(fs::read_to_string(reg.path()).unwrap(), before);
        assert_eq!(reg.list().unwrap(), vec![ChatId(1)]);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let (_dir, reg) = registry();
        for id in [5, -100123, 9] {
            reg.add(ChatId(id)).unwrap();
        }
        assert!(reg.remove(ChatId(-100123)).unwrap());
        assert_eq!(reg.list().unwrap(), vec![ChatId(5), ChatId(9)]);
    }

    #[test]
    fn reopen_preserves_set_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        {
            let reg = SubscriberRegistry::open(&path).unwrap();
            for id in [30, 10, 20] {
                reg.add(ChatId(id)).unwrap();
            }
        }
        let reg = SubscriberRegistry::open(&path).unwrap();
        assert_eq!(reg.list().unwrap(), vec![ChatId(30), ChatId(10), ChatId(20)]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[30,10,20]");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let (_dir, reg) = registry();
        fs::write(reg.path(), "{not json").unwrap();
        assert!(matches!(reg.list(), Err(Error::Data { .. })));
        assert!(reg.add(ChatId(1)).is_err());
    }

    #[test]
    fn duplicate_ids_on_disk_collapse() {
        let (_dir, reg) = registry();
        fs::write(reg.path(), "[1,2,1,3,2]").unwrap();
        assert_eq!(reg.list().unwrap(), vec![ChatId(1), ChatId(2), ChatId(3)]);
    }
}
