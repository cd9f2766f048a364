//! Durable per-origin key/value storage for the recording session
//!
//! A full navigation destroys the page agent. Whatever must survive it is
//! written here before the navigation is triggered and read back by the
//! next agent instance.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{RecorderError, Result};
use crate::session::{AnnotationRule, Environment, Record, SelectorKey, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plain string key/value access, no policy
pub trait MarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: MarkerStore + ?Sized> MarkerStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// The fixed set of keys a session occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    ItemClass,
    ItemId,
    PagerId,
    PagerClass,
    Annotations,
    TotalPages,
    Data,
    CurrentPage,
    NextUrl,
}

impl StoreKey {
    pub const ALL: [StoreKey; 9] = [
        StoreKey::ItemClass,
        StoreKey::ItemId,
        StoreKey::PagerId,
        StoreKey::PagerClass,
        StoreKey::Annotations,
        StoreKey::TotalPages,
        StoreKey::Data,
        StoreKey::CurrentPage,
        StoreKey::NextUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::ItemClass => "className",
            StoreKey::ItemId => "itemId",
            StoreKey::PagerId => "pagerId",
            StoreKey::PagerClass => "pagerClass",
            StoreKey::Annotations => "annotations",
            StoreKey::TotalPages => "totalPages",
            StoreKey::Data => "data",
            StoreKey::CurrentPage => "currentPage",
            StoreKey::NextUrl => "nextUrl",
        }
    }
}

/// Accumulated data blob stored under `data`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    date: DateTime<Utc>,
    url: String,
    search_term: String,
    environment: Environment,
    data: Vec<Record>,
}

/// Session load/save boundary over a [`MarkerStore`]
pub struct SessionStore<S> {
    store: S,
}

impl<S: MarkerStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write every field of the session
    pub fn save(&mut self, session: &Session) -> Result<()> {
        let item = session.selector_key.clone().unwrap_or_default();
        self.put(StoreKey::ItemClass, &item.class_signature)?;
        self.put(StoreKey::ItemId, &item.id)?;

        match &session.pager_key {
            Some(pager) => {
                self.put(StoreKey::PagerId, &pager.id)?;
                self.put(StoreKey::PagerClass, &pager.class_signature)?;
            }
            None => {
                self.store.remove(StoreKey::PagerId.as_str())?;
                self.store.remove(StoreKey::PagerClass.as_str())?;
            }
        }

        self.put(StoreKey::Annotations, &serde_json::to_string(&session.annotations)?)?;
        self.put(StoreKey::TotalPages, &session.total_page_limit.to_string())?;
        self.put(StoreKey::CurrentPage, &session.current_page.to_string())?;

        let data = SessionData {
            date: session.started_at,
            url: session.source_url.clone(),
            search_term: session.search_term.clone(),
            environment: session.environment.clone(),
            data: session.records().to_vec(),
        };
        self.put(StoreKey::Data, &serde_json::to_string(&data)?)?;

        match &session.pending_navigation_target {
            Some(target) => self.put(StoreKey::NextUrl, target)?,
            None => self.store.remove(StoreKey::NextUrl.as_str())?,
        }

        Ok(())
    }

    /// Rebuild the session, or `None` when nothing is being recorded
    pub fn load(&self) -> Result<Option<Session>> {
        let Some(raw) = self.fetch(StoreKey::Data)? else {
            return Ok(None);
        };
        let data: SessionData = serde_json::from_str(&raw)?;

        let mut session = Session::new(data.url, data.environment);
        session.started_at = data.date;
        session.search_term = data.search_term;
        session.restore_records(data.data);

        let item = SelectorKey::new(
            self.fetch(StoreKey::ItemId)?.unwrap_or_default(),
            self.fetch(StoreKey::ItemClass)?.unwrap_or_default(),
        );
        session.selector_key = (!item.is_empty()).then_some(item);

        let pager_id = self.fetch(StoreKey::PagerId)?;
        let pager_class = self.fetch(StoreKey::PagerClass)?;
        if pager_id.is_some() || pager_class.is_some() {
            session.pager_key = Some(SelectorKey::new(
                pager_id.unwrap_or_default(),
                pager_class.unwrap_or_default(),
            ));
        }

        if let Some(raw) = self.fetch(StoreKey::Annotations)? {
            session.annotations = serde_json::from_str::<Vec<AnnotationRule>>(&raw)?;
        }
        if let Some(raw) = self.fetch(StoreKey::TotalPages)? {
            session.total_page_limit = parse_number(StoreKey::TotalPages, &raw)?;
        }
        if let Some(raw) = self.fetch(StoreKey::CurrentPage)? {
            session.current_page = parse_number(StoreKey::CurrentPage, &raw)?;
        }
        session.pending_navigation_target = self.fetch(StoreKey::NextUrl)?;

        Ok(Some(session))
    }

    /// Remove every session key
    pub fn clear(&mut self) -> Result<()> {
        for key in StoreKey::ALL {
            self.store.remove(key.as_str())?;
        }
        Ok(())
    }

    fn put(&mut self, key: StoreKey, value: &str) -> Result<()> {
        self.store.set(key.as_str(), value)
    }

    fn fetch(&self, key: StoreKey) -> Result<Option<String>> {
        self.store.get(key.as_str())
    }
}

fn parse_number(key: StoreKey, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| RecorderError::Store(format!("'{}' holds a non-numeric value '{}'", key.as_str(), raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        let mut session = Session::new("https://example.org/search?q=rust", Environment::detect("Chrome", "120"));
        session.search_term = "rust".to_string();
        session.selector_key = Some(SelectorKey::by_class("result"));
        session.pager_key = Some(SelectorKey::by_id("pager"));
        session
            .push_rule(AnnotationRule {
                title: "title".to_string(),
                selector_key: SelectorKey::by_class("name"),
            })
            .unwrap();
        session.set_page_limit(3).unwrap();
        session.current_page = 2;
        session.pending_navigation_target = Some("/search?q=rust&page=2".to_string());

        let mut record = Record::new();
        record.fields.insert("title".to_string(), "Item A".to_string());
        record.add_link("https://example.org/a");
        session.append_records(vec![record]);
        session
    }

    #[test]
    fn test_save_then_load_restores_session() {
        let mut store = SessionStore::new(MemoryStore::new());
        let session = sample_session();

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().expect("session should be stored");

        assert_eq!(loaded, session);
    }

    #[test]
    fn test_load_without_data_is_none() {
        let store = SessionStore::new(MemoryStore::new());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_every_key() {
        let mut store = SessionStore::new(MemoryStore::new());
        store.save(&sample_session()).unwrap();
        assert!(!store.inner().is_empty());

        store.clear().unwrap();

        assert!(store.inner().is_empty());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_removes_stale_optional_keys() {
        let mut store = SessionStore::new(MemoryStore::new());
        let mut session = sample_session();
        store.save(&session).unwrap();

        session.pager_key = None;
        session.pending_navigation_target = None;
        store.save(&session).unwrap();

        let inner = store.inner();
        assert!(inner.get("pagerId").unwrap().is_none());
        assert!(inner.get("nextUrl").unwrap().is_none());
        assert_eq!(store.load().unwrap().unwrap().pager_key, None);
    }

    #[test]
    fn test_corrupt_number_is_store_error() {
        let mut store = SessionStore::new(MemoryStore::new());
        store.save(&sample_session()).unwrap();

        let mut inner = store.into_inner();
        inner.set("currentPage", "two").unwrap();
        let store = SessionStore::new(inner);

        assert!(matches!(store.load(), Err(RecorderError::Store(_))));
    }
}
