use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::PersistenceError;
use crate::store::kv::KeyValueStore;

/// File-backed key-value store: one `<key>.json` file per key under `base_dir`.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lingo")
            .join("progress");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn io_error(key: &str, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.file_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    /// Write to a temp file, fsync, then rename over the old value so a
    /// failed write never leaves a half-written record behind.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let staged = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            Ok(())
        })();
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp_path);
            return Err(Self::io_error(key, e));
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            Self::io_error(key, e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.get("aPuzzleStatus").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = make_test_store();
        store.set("aPuzzleStatus", r#"{"1":"completed"}"#).unwrap();
        assert_eq!(
            store.get("aPuzzleStatus").unwrap().as_deref(),
            Some(r#"{"1":"completed"}"#)
        );
        assert!(store.file_path("aPuzzleStatus").exists());
    }

    #[test]
    fn test_overwrite_leaves_no_tmp_files() {
        let (dir, store) = make_test_store();
        store.set("bPuzzleStatus", "{}").unwrap();
        store.set("bPuzzleStatus", r#"{"2":"wrong"}"#).unwrap();

        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
        assert_eq!(
            store.get("bPuzzleStatus").unwrap().as_deref(),
            Some(r#"{"2":"wrong"}"#)
        );
    }

    #[test]
    fn test_write_into_missing_dir_fails_and_reports_key() {
        let (dir, _store) = make_test_store();
        let bad_store = JsonStore {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        let err = bad_store.set("cPuzzleStatus", "{}").unwrap_err();
        assert!(matches!(err, PersistenceError::Io { ref key, .. } if key == "cPuzzleStatus"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = make_test_store();
        store.set("dPuzzleStatus", "{}").unwrap();
        store.remove("dPuzzleStatus").unwrap();
        store.remove("dPuzzleStatus").unwrap();
        assert_eq!(store.get("dPuzzleStatus").unwrap(), None);
    }

    #[test]
    fn test_keys_are_sanitized_into_file_names() {
        let (_dir, store) = make_test_store();
        let path = store.file_path("../escape/key");
        assert_eq!(path.parent().unwrap(), store.base_dir());
        assert!(path.ends_with("___escape_key.json"));
    }
}
