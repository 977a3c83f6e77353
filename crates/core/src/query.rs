//! Read-only storage operations
//!
//! One-page grouped listings for the browser, fully paginated recursive
//! listings for the bulk mutations, existence probes, and presigned-URL
//! generation backed by an owned, bounded, TTL-evicting cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::traits::{ListRequest, ObjectStore};
use crate::types::StorageObject;

/// Default capacity of the signed-URL cache
const URL_CACHE_CAPACITY: usize = 256;

/// Page size for recursive listings
const LIST_PAGE_SIZE: i32 = 1000;

#[derive(Debug, Clone)]
struct CachedUrl {
    url: String,
    expires_at_sec: i64,
}

/// In-memory cache of presigned read URLs, keyed by object key.
///
/// Bounded: expired entries are dropped on insert, and when the cache is
/// still full the soonest-expiring entry is evicted. Owned by
/// `BucketQueries` rather than shared module state so each session (and
/// each test) gets a fresh cache.
#[derive(Debug)]
pub struct UrlCache {
    capacity: usize,
    entries: HashMap<String, CachedUrl>,
}

impl UrlCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Return the cached URL for `key` if its remaining lifetime covers
    /// `required`.
    pub fn get_fresh(
        &self,
        key: &str,
        required: Duration,
        now: jiff::Timestamp,
    ) -> Option<String> {
        let entry = self.entries.get(key)?;
        let remaining = entry.expires_at_sec - now.as_second();
        (remaining >= required.as_secs() as i64).then(|| entry.url.clone())
    }

    /// Cache `url` with its absolute expiry.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        url: impl Into<String>,
        expires_at: jiff::Timestamp,
        now: jiff::Timestamp,
    ) {
        let key = key.into();
        self.entries
            .retain(|_, e| e.expires_at_sec > now.as_second());

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at_sec)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                self.entries.remove(&victim);
            }
        }

        self.entries.insert(
            key,
            CachedUrl {
                url: url.into(),
                expires_at_sec: expires_at.as_second(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only operations against the target bucket
pub struct BucketQueries {
    store: Arc<dyn ObjectStore>,
    cache: Mutex<UrlCache>,
    default_expiry: Duration,
}

impl BucketQueries {
    pub fn new(store: Arc<dyn ObjectStore>, default_expiry: Duration) -> Self {
        Self::with_cache(store, UrlCache::new(URL_CACHE_CAPACITY), default_expiry)
    }

    pub fn with_cache(
        store: Arc<dyn ObjectStore>,
        cache: UrlCache,
        default_expiry: Duration,
    ) -> Self {
        Self {
            store,
            cache: Mutex::new(cache),
            default_expiry,
        }
    }

    /// One-level listing of `prefix`, grouped by delimiter.
    ///
    /// Common prefixes become synthetic directory entries, content entries
    /// become files, and the self-reference entry (a key equal to the
    /// queried prefix, typically its directory marker) is skipped. One page
    /// only; the UI pages by navigation, not by scroll-through.
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<StorageObject>> {
        let page = self
            .store
            .list_page(ListRequest {
                prefix: prefix.to_string(),
                delimiter: Some("/".to_string()),
                continuation_token: None,
                max_keys: Some(LIST_PAGE_SIZE),
            })
            .await?;

        let mut entries = Vec::new();
        for common_prefix in page.common_prefixes {
            entries.push(StorageObject::directory(common_prefix));
        }
        for record in page.objects {
            if record.key == prefix {
                continue;
            }
            let mut object = StorageObject::file(record.key, record.size_bytes);
            if let Some(metadata) = object.metadata.as_mut() {
                metadata.last_modified = record.last_modified;
                metadata.etag = record.etag;
            }
            entries.push(object);
        }

        Ok(entries)
    }

    /// Every descendant key under `prefix`, fully paginated.
    ///
    /// Used by the directory mutations; returns keys in listing order,
    /// which is the order bulk operations process them in.
    pub async fn list_all_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_page(ListRequest {
                    prefix: prefix.to_string(),
                    delimiter: None,
                    continuation_token: continuation_token.clone(),
                    max_keys: Some(LIST_PAGE_SIZE),
                })
                .await?;

            keys.extend(page.objects.into_iter().map(|o| o.key));

            match page.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }

    /// Whether `key` exists.
    ///
    /// Not-found maps to `Ok(false)`; only transport/auth errors fail.
    /// Callers rely on the distinction: `Ok(true)` means definitely exists,
    /// `Err` means could not determine.
    pub async fn exists_by_key(&self, key: &str) -> Result<bool> {
        Ok(self.store.head_object(key).await?.is_some())
    }

    /// Presigned write URL for `key`.
    ///
    /// Checks existence first: a collision with `overwrite` disabled is the
    /// `FileNameExists` sentinel, distinguishable from generic failures.
    pub async fn generate_upload_url(
        &self,
        key: &str,
        overwrite: bool,
        content_type: Option<&str>,
    ) -> Result<String> {
        if key.is_empty() {
            return Err(Error::Precondition("upload key is empty".into()));
        }
        if !overwrite && self.exists_by_key(key).await? {
            return Err(Error::FileNameExists(key.to_string()));
        }
        self.store
            .presign_put(key, content_type, self.default_expiry)
            .await
    }

    /// Presigned read URL for `key`, served from the cache when the cached
    /// entry's remaining lifetime covers the requested expiry.
    pub async fn generate_read_url(
        &self,
        key: &str,
        expires_in: Option<Duration>,
    ) -> Result<String> {
        let expires = expires_in.unwrap_or(self.default_expiry);
        let now = jiff::Timestamp::now();

        {
            let cache = self.lock_cache()?;
            if let Some(url) = cache.get_fresh(key, expires, now) {
                tracing::debug!(key, "read url served from cache");
                return Ok(url);
            }
        }

        let url = self.store.presign_get(key, expires).await?;

        let expires_at = jiff::Timestamp::from_second(now.as_second() + expires.as_secs() as i64)
            .unwrap_or(now);
        self.lock_cache()?.insert(key, url.clone(), expires_at, now);

        Ok(url)
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, UrlCache>> {
        self.cache
            .lock()
            .map_err(|_| Error::General("signed-url cache lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ListPage, MockObjectStore, ObjectRecord};

    fn record(key: &str, size: i64) -> ObjectRecord {
        ObjectRecord {
            key: key.to_string(),
            size_bytes: size,
            last_modified: None,
            etag: None,
        }
    }

    fn queries(store: MockObjectStore) -> BucketQueries {
        BucketQueries::new(Arc::new(store), Duration::from_secs(900))
    }

    #[tokio::test]
    async fn test_list_by_prefix_groups_and_skips_self() {
        let mut store = MockObjectStore::new();
        store.expect_list_page().returning(|request| {
            assert_eq!(request.delimiter.as_deref(), Some("/"));
            Ok(ListPage {
                objects: vec![record("docs/", 0), record("docs/a.txt", 10)],
                common_prefixes: vec!["docs/sub/".to_string()],
                next_continuation_token: None,
            })
        });

        let entries = queries(store).list_by_prefix("docs/").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_directory());
        assert_eq!(entries[0].name, "sub");
        assert_eq!(entries[1].key, "docs/a.txt");
        assert_eq!(entries[1].name, "a.txt");
    }

    #[tokio::test]
    async fn test_list_all_keys_paginates() {
        let mut store = MockObjectStore::new();
        store.expect_list_page().times(2).returning(|request| {
            assert!(request.delimiter.is_none());
            if request.continuation_token.is_none() {
                Ok(ListPage {
                    objects: vec![record("docs/a.txt", 1)],
                    common_prefixes: vec![],
                    next_continuation_token: Some("t1".to_string()),
                })
            } else {
                assert_eq!(request.continuation_token.as_deref(), Some("t1"));
                Ok(ListPage {
                    objects: vec![record("docs/b.txt", 2)],
                    common_prefixes: vec![],
                    next_continuation_token: None,
                })
            }
        });

        let keys = queries(store).list_all_keys("docs/").await.unwrap();
        assert_eq!(keys, vec!["docs/a.txt", "docs/b.txt"]);
    }

    #[tokio::test]
    async fn test_exists_by_key_not_found_is_success_false() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|_| Ok(None));

        let exists = queries(store).exists_by_key("never/created.txt").await;
        assert!(matches!(exists, Ok(false)));
    }

    #[tokio::test]
    async fn test_generate_upload_url_collision() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|key| {
            Ok(Some(crate::traits::ObjectStat {
                key: key.to_string(),
                size_bytes: 1,
                last_modified: None,
                etag: None,
                content_type: None,
            }))
        });
        // No presign call may be made on collision.
        store.expect_presign_put().times(0);

        let err = queries(store)
            .generate_upload_url("docs/a.txt", false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNameExists(_)));
    }

    #[tokio::test]
    async fn test_generate_upload_url_overwrite_skips_probe() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().times(0);
        store
            .expect_presign_put()
            .returning(|key, _, _| Ok(format!("https://signed.example/{key}")));

        let url = queries(store)
            .generate_upload_url("docs/a.txt", true, Some("text/plain"))
            .await
            .unwrap();
        assert!(url.contains("docs/a.txt"));
    }

    #[tokio::test]
    async fn test_generate_read_url_cached_within_expiry() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_get()
            .times(1)
            .returning(|key, _| Ok(format!("https://signed.example/{key}?sig=1")));

        let queries = queries(store);
        let first = queries
            .generate_read_url("docs/a.txt", Some(Duration::from_secs(300)))
            .await
            .unwrap();
        // Second request within the cached window with a smaller required
        // expiry must not hit the backend again.
        let second = queries
            .generate_read_url("docs/a.txt", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_url_cache_expiry() {
        let mut cache = UrlCache::new(8);
        let now = jiff::Timestamp::from_second(1_000).unwrap();
        let expires_at = jiff::Timestamp::from_second(1_300).unwrap();
        cache.insert("a.txt", "https://signed.example/a", expires_at, now);

        // Plenty of lifetime left.
        assert!(cache
            .get_fresh("a.txt", Duration::from_secs(200), now)
            .is_some());

        // Requested expiry exceeds the remaining lifetime.
        let later = jiff::Timestamp::from_second(1_200).unwrap();
        assert!(cache
            .get_fresh("a.txt", Duration::from_secs(200), later)
            .is_none());
    }

    #[test]
    fn test_url_cache_bounded() {
        let mut cache = UrlCache::new(2);
        let now = jiff::Timestamp::from_second(0).unwrap();
        let at = |s: i64| jiff::Timestamp::from_second(s).unwrap();

        cache.insert("a", "url-a", at(100), now);
        cache.insert("b", "url-b", at(200), now);
        cache.insert("c", "url-c", at(300), now);

        assert_eq!(cache.len(), 2);
        // The soonest-expiring entry was evicted.
        assert!(cache.get_fresh("a", Duration::ZERO, now).is_none());
        assert!(cache.get_fresh("c", Duration::ZERO, now).is_some());
    }

    #[test]
    fn test_url_cache_drops_expired_on_insert() {
        let mut cache = UrlCache::new(8);
        let at = |s: i64| jiff::Timestamp::from_second(s).unwrap();

        cache.insert("a", "url-a", at(100), at(0));
        cache.insert("b", "url-b", at(500), at(200));

        assert_eq!(cache.len(), 1);
        assert!(cache.get_fresh("b", Duration::ZERO, at(200)).is_some());
    }
}
