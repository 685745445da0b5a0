use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::store::Result;
use snip_core::{NewUrlRecord, ReadStore, ShortCode, StorageError, UrlRecord, UrlStore};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// In-memory implementation of [`UrlStore`] using DashMap.
///
/// DashMap shards its locks, so operations on different codes proceed in
/// parallel. Inserts go through the entry API and increments mutate the
/// record while holding the shard's write lock, which makes both atomic.
#[derive(Debug)]
pub struct InMemoryStore {
    records: DashMap<String, UrlRecord>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadStore for InMemoryStore {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self
            .records
            .get(code.as_str())
            .map(|record| record.value().clone()))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.original_url == original_url)
            .min_by_key(|entry| entry.id)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl UrlStore for InMemoryStore {
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord> {
        match self.records.entry(record.short_code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.short_code.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let stored = record.into_record(id);
                trace!(code = %stored.short_code, id, "stored record in memory");
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn increment_click_count(&self, code: &ShortCode) -> Result<()> {
        let Some(mut record) = self.records.get_mut(code.as_str()) else {
            return Err(StorageError::NotFound(code.to_string()));
        };
        record.click_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn new_record(code_str: &str, url: &str) -> NewUrlRecord {
        NewUrlRecord {
            original_url: url.to_string(),
            short_code: code(code_str),
            created_at: Timestamp::now(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryStore::new();

        let stored = store
            .insert(new_record("abc1234", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(stored.click_count, 0);

        let found = store.find_by_code(&code("abc1234")).await.unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(found.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn find_nonexistent() {
        let store = InMemoryStore::new();

        let result = store.find_by_code(&code("nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn ids_are_distinct() {
        let store = InMemoryStore::new();

        let a = store.insert(new_record("aaaaaaa", "https://a.example")).await.unwrap();
        let b = store.insert(new_record("bbbbbbb", "https://b.example")).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn insert_conflict() {
        let store = InMemoryStore::new();

        store
            .insert(new_record("abc1234", "https://example.com"))
            .await
            .unwrap();

        let err = store
            .insert(new_record("abc1234", "https://other.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(ref c) if c == "abc1234"));

        // the original record is untouched
        let found = store.find_by_code(&code("abc1234")).await.unwrap().unwrap();
        assert_eq!(found.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn codes_are_case_sensitive() {
        let store = InMemoryStore::new();

        store.insert(new_record("abcdefg", "https://lower.example")).await.unwrap();
        store.insert(new_record("ABCDEFG", "https://upper.example")).await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn find_by_original_url_returns_oldest() {
        let store = InMemoryStore::new();

        let first = store.insert(new_record("first01", "https://dup.example")).await.unwrap();
        store.insert(new_record("second2", "https://dup.example")).await.unwrap();

        let found = store
            .find_by_original_url("https://dup.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.short_code, first.short_code);

        assert!(store
            .find_by_original_url("https://missing.example")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn increment_click_count() {
        let store = InMemoryStore::new();
        store
            .insert(new_record("abc1234", "https://example.com"))
            .await
            .unwrap();

        store.increment_click_count(&code("abc1234")).await.unwrap();
        store.increment_click_count(&code("abc1234")).await.unwrap();

        let found = store.find_by_code(&code("abc1234")).await.unwrap().unwrap();
        assert_eq!(found.click_count, 2);
    }

    #[tokio::test]
    async fn increment_unknown_code() {
        let store = InMemoryStore::new();

        let err = store.increment_click_count(&code("nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert(new_record("hot0001", "https://example.com"))
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment_click_count(&code("hot0001")).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let found = store.find_by_code(&code("hot0001")).await.unwrap().unwrap();
        assert_eq!(found.click_count, 100);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_code_admit_one() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = vec![];
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert(new_record("race001", &format!("https://example{i}.com")))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
