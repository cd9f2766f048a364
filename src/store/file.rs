use crate::error::{RecorderError, Result};
use crate::store::MarkerStore;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Marker store persisted as one JSON object per origin
///
/// Every `set` and `remove` is written through to disk before returning.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl FileStore {
    /// Open (or start) the store file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                IndexMap::new()
            } else {
                serde_json::from_str(&raw)
                    .map_err(|e| RecorderError::Store(format!("Corrupt store file {}: {}", path.display(), e)))?
            }
        } else {
            IndexMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Open the store belonging to the origin of `url` inside `dir`
    pub fn for_origin(dir: impl AsRef<Path>, url: &Url) -> Result<Self> {
        let origin = url.origin().ascii_serialization();
        let name: String = origin
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Self::open(dir.as_ref().join(format!("{}.json", name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl MarkerStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.shift_remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("https://example.org/search?q=x").unwrap();

        let mut store = FileStore::for_origin(dir.path(), &url).unwrap();
        store.set("nextUrl", "/search?q=x&page=2").unwrap();
        drop(store);

        let reopened = FileStore::for_origin(dir.path(), &url).unwrap();
        assert_eq!(reopened.get("nextUrl").unwrap().as_deref(), Some("/search?q=x&page=2"));
        assert!(reopened.path().ends_with("https___example_org.json"));
    }

    #[test]
    fn test_origins_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = Url::parse("https://a.example/").unwrap();
        let b = Url::parse("https://b.example/").unwrap();

        let mut store_a = FileStore::for_origin(dir.path(), &a).unwrap();
        store_a.set("totalPages", "2").unwrap();

        let store_b = FileStore::for_origin(dir.path(), &b).unwrap();
        assert!(store_b.get("totalPages").unwrap().is_none());
    }

    #[test]
    fn test_remove_is_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("data", "{}").unwrap();
        store.remove("data").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.get("data").unwrap().is_none());
    }
}
