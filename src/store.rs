//! Document store abstraction.
//!
//! The app keeps user profiles, tournaments and conversations in a remote
//! document database. This module hides that behind [`DocumentStore`], a
//! byte-level key-value interface grouped by collection, and the typed
//! helpers [`save`], [`load`], [`load_all`] and [`delete`] that encode
//! documents with MessagePack.
//!
//! [`MemoryStore`] is the in-process implementation used in tests and as a
//! local cache; `SqliteStore` (feature `persistence`) keeps documents on
//! disk.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::{Conversation, Tournament, UserProfile};

/// A key-value store of encoded documents, grouped into collections.
pub trait DocumentStore {
    /// Raw document bytes, `None` if absent.
    fn read(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or replace a document.
    fn write(&mut self, collection: &str, key: &str, data: &[u8]) -> Result<()>;

    /// Delete a document. Returns whether it existed.
    fn remove(&mut self, collection: &str, key: &str) -> Result<bool>;

    /// All keys in a collection, sorted.
    fn keys(&self, collection: &str) -> Result<Vec<String>>;
}

/// A type stored as one document in a collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn key(&self) -> &str;
}

impl Document for Tournament {
    const COLLECTION: &'static str = "tournaments";

    fn key(&self) -> &str {
        self.id()
    }
}

impl Document for UserProfile {
    const COLLECTION: &'static str = "users";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Document for Conversation {
    const COLLECTION: &'static str = "conversations";

    fn key(&self) -> &str {
        self.id()
    }
}

/// Encode and write a document under its own key.
pub fn save<D: Document>(store: &mut dyn DocumentStore, doc: &D) -> Result<()> {
    let data = rmp_serde::to_vec_named(doc)?;
    store.write(D::COLLECTION, doc.key(), &data)?;
    log::debug!(
        "[Store] Saved {}/{} ({} bytes)",
        D::COLLECTION,
        doc.key(),
        data.len()
    );
    Ok(())
}

/// Read and decode one document.
pub fn load<D: Document>(store: &dyn DocumentStore, key: &str) -> Result<Option<D>> {
    match store.read(D::COLLECTION, key)? {
        Some(data) => Ok(Some(rmp_serde::from_slice(&data)?)),
        None => Ok(None),
    }
}

/// Read and decode every document of a collection.
///
/// Documents that fail to decode are skipped with a warning so one bad
/// record does not hide the rest of the collection.
pub fn load_all<D: Document>(store: &dyn DocumentStore) -> Result<Vec<D>> {
    let keys = store.keys(D::COLLECTION)?;
    let mut docs = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(data) = store.read(D::COLLECTION, &key)? else {
            continue;
        };
        match rmp_serde::from_slice(&data) {
            Ok(doc) => docs.push(doc),
            Err(e) => log::warn!("[Store] Skipping {}/{}: {}", D::COLLECTION, key, e),
        }
    }
    Ok(docs)
}

/// Delete one document. Returns whether it existed.
pub fn delete<D: Document>(store: &mut dyn DocumentStore, key: &str) -> Result<bool> {
    store.remove(D::COLLECTION, key)
}

/// In-memory document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents across collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    fn write(&mut self, collection: &str, key: &str, data: &[u8]) -> Result<()> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, collection: &str, key: &str) -> Result<bool> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|docs| docs.remove(key).is_some())
            .unwrap_or(false))
    }

    fn keys(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, Path, Run, TournamentPost};

    fn tournament_with_votes() -> Tournament {
        let mut t = Tournament::builder("t-1", "Hearts", "alice", 0, 1_000)
            .participant("bob")
            .build()
            .unwrap();
        let path = Path::from_points(vec![GpsPoint::new(1.0, 1.0), GpsPoint::new(1.0, 1.01)]);
        let run = Run::with_point_times(path, vec![100, 400]).unwrap();
        t.submit_post(TournamentPost::new("p-1", "bob", run, 450))
            .unwrap();
        t.upvote_post("p-1", "alice").unwrap();
        t.downvote_post("p-1", "carol").unwrap();
        t.downvote_post("p-1", "dave").unwrap();
        t
    }

    #[test]
    fn test_round_trip_documents() {
        let mut store = MemoryStore::new();
        let t = tournament_with_votes();
        let user = UserProfile::new("alice", "Alice");
        let mut chat = Conversation::new("alice", "bob");
        chat.send("bob", "nice heart", 500).unwrap();

        save(&mut store, &t).unwrap();
        save(&mut store, &user).unwrap();
        save(&mut store, &chat).unwrap();
        assert_eq!(store.len(), 3);

        let loaded: Tournament = load(&store, "t-1").unwrap().unwrap();
        assert_eq!(loaded, t);
        assert_eq!(loaded.post("p-1").unwrap().vote_count(), -1);

        let loaded: UserProfile = load(&store, "alice").unwrap().unwrap();
        assert_eq!(loaded, user);

        let loaded: Conversation = load(&store, "alice_bob").unwrap().unwrap();
        assert_eq!(loaded, chat);
    }

    #[test]
    fn test_missing_document() {
        let store = MemoryStore::new();
        let loaded: Option<Tournament> = load(&store, "nope").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_all_skips_corrupt() {
        let mut store = MemoryStore::new();
        save(&mut store, &UserProfile::new("a", "A")).unwrap();
        save(&mut store, &UserProfile::new("b", "B")).unwrap();
        store.write("users", "broken", &[0xc1]).unwrap();

        let users: Vec<UserProfile> = load_all(&store).unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_delete() {
        let mut store = MemoryStore::new();
        save(&mut store, &UserProfile::new("a", "A")).unwrap();
        assert!(delete::<UserProfile>(&mut store, "a").unwrap());
        assert!(!delete::<UserProfile>(&mut store, "a").unwrap());
        assert!(store.is_empty());
    }
}
