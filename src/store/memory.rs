use crate::error::Result;
use crate::store::MarkerStore;
use indexmap::IndexMap;

/// In-process marker store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: IndexMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl MarkerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.shift_remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        store.set("totalPages", "3").unwrap();
        store.set("currentPage", "1").unwrap();

        assert_eq!(store.get("totalPages").unwrap().as_deref(), Some("3"));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["totalPages", "currentPage"]);

        store.remove("totalPages").unwrap();
        store.remove("never-set").unwrap();
        assert!(store.get("totalPages").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }
}
