//! Mutating storage operations
//!
//! Copy, move, delete and create for single objects and for whole directory
//! prefixes. Multi-step operations are not transactional: move is copy then
//! delete, directory variants are N sequential single-object calls, and a
//! failure partway through leaves the backend partially mutated. The first
//! failure aborts the sequence and is surfaced as-is; completed children
//! are not rolled back.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::key;
use crate::query::BucketQueries;
use crate::traits::ObjectStore;

/// Mutating operations against the target bucket
pub struct BucketMutations {
    store: Arc<dyn ObjectStore>,
    queries: Arc<BucketQueries>,
}

impl BucketMutations {
    pub fn new(store: Arc<dyn ObjectStore>, queries: Arc<BucketQueries>) -> Self {
        Self { store, queries }
    }

    /// Copy one object. Fails with `DestinationKeyExists` before issuing
    /// any copy call if the destination is taken; copy never overwrites.
    pub async fn copy_object(&self, source_key: &str, destination_key: &str) -> Result<()> {
        Self::require_key(source_key, "source key")?;
        Self::require_key(destination_key, "destination key")?;

        if self.queries.exists_by_key(destination_key).await? {
            return Err(Error::DestinationKeyExists(destination_key.to_string()));
        }

        tracing::debug!(source_key, destination_key, "copying object");
        self.store.copy_object(source_key, destination_key).await
    }

    /// Copy a directory prefix and every descendant.
    ///
    /// All transformed destination keys are checked for collisions before
    /// the first copy; any collision aborts the whole operation. Children
    /// are then copied sequentially in listing order, first failure aborts.
    pub async fn copy_directory(&self, source_key: &str, destination_key: &str) -> Result<()> {
        Self::require_key(source_key, "source key")?;
        Self::require_key(destination_key, "destination key")?;

        let children = self.queries.list_all_keys(source_key).await?;
        let transfers: Vec<(String, String)> = children
            .into_iter()
            .map(|child| {
                let target = key::rewrite_prefix(&child, source_key, destination_key);
                (child, target)
            })
            .collect();

        for (_, target) in &transfers {
            if self.queries.exists_by_key(target).await? {
                return Err(Error::DestinationKeyExists(target.clone()));
            }
        }

        for (child, target) in &transfers {
            self.store.copy_object(child, target).await?;
        }

        tracing::debug!(
            source_key,
            destination_key,
            count = transfers.len(),
            "directory copied"
        );
        Ok(())
    }

    /// Move one object: copy, then delete the source only after the copy
    /// succeeded. A failed delete leaves the object at both locations and
    /// surfaces as a failure.
    pub async fn move_object(&self, source_key: &str, destination_key: &str) -> Result<()> {
        self.copy_object(source_key, destination_key).await?;
        self.store.delete_object(source_key).await
    }

    /// Move a directory prefix: full copy first, then delete the sources.
    pub async fn move_directory(&self, source_key: &str, destination_key: &str) -> Result<()> {
        self.copy_directory(source_key, destination_key).await?;
        self.delete_directory(source_key).await
    }

    /// Delete one object.
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        Self::require_key(key, "key")?;
        self.store.delete_object(key).await
    }

    /// Delete a directory prefix and every descendant, sequentially in
    /// listing order. The first failure aborts the remaining deletes;
    /// already-deleted children stay deleted.
    pub async fn delete_directory(&self, key: &str) -> Result<()> {
        Self::require_key(key, "key")?;

        let children = self.queries.list_all_keys(key).await?;
        for child in &children {
            self.store.delete_object(child).await?;
        }

        tracing::debug!(key, count = children.len(), "directory deleted");
        Ok(())
    }

    /// Write a zero-length directory marker; the key is forced to end
    /// with a slash.
    pub async fn create_directory_marker(&self, key: &str) -> Result<()> {
        Self::require_key(key, "key")?;

        let marker = if key.ends_with('/') {
            key.to_string()
        } else {
            format!("{key}/")
        };
        self.store.put_empty_object(&marker).await
    }

    /// Rename one object: a move whose destination replaces the trailing
    /// segment.
    pub async fn rename_object(&self, source_key: &str, new_name: &str) -> Result<()> {
        Self::require_key(new_name, "new name")?;

        let destination = key::rename_trailing_segment(source_key, new_name);
        self.move_object(source_key, key::trim_root(&destination))
            .await
    }

    /// Rename a directory prefix.
    pub async fn rename_directory(&self, source_key: &str, new_name: &str) -> Result<()> {
        Self::require_key(new_name, "new name")?;

        let destination = key::rename_trailing_segment(source_key, new_name);
        self.move_directory(source_key, key::trim_root(&destination))
            .await
    }

    fn require_key(value: &str, what: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::Precondition(format!("{what} is empty")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ListPage, MockObjectStore, ObjectRecord, ObjectStat};
    use std::time::Duration;

    fn record(key: &str) -> ObjectRecord {
        ObjectRecord {
            key: key.to_string(),
            size_bytes: 1,
            last_modified: None,
            etag: None,
        }
    }

    fn stat(key: &str) -> ObjectStat {
        ObjectStat {
            key: key.to_string(),
            size_bytes: 1,
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }

    fn mutations(store: MockObjectStore) -> BucketMutations {
        let store: Arc<dyn ObjectStore> = Arc::new(store);
        let queries = Arc::new(BucketQueries::new(store.clone(), Duration::from_secs(900)));
        BucketMutations::new(store, queries)
    }

    #[tokio::test]
    async fn test_copy_object_collision_makes_no_copy_call() {
        let mut store = MockObjectStore::new();
        store
            .expect_head_object()
            .returning(|key| Ok(Some(stat(key))));
        store.expect_copy_object().times(0);

        let err = mutations(store)
            .copy_object("docs/a.txt", "backup/a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DestinationKeyExists(_)));
    }

    #[tokio::test]
    async fn test_copy_object_free_destination() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|_| Ok(None));
        store
            .expect_copy_object()
            .times(1)
            .withf(|src, dst| src == "docs/a.txt" && dst == "backup/a.txt")
            .returning(|_, _| Ok(()));

        mutations(store)
            .copy_object("docs/a.txt", "backup/a.txt")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_copy_directory_prechecks_all_destinations() {
        let mut store = MockObjectStore::new();
        store.expect_list_page().returning(|_| {
            Ok(ListPage {
                objects: vec![record("docs/a.txt"), record("docs/b.txt")],
                common_prefixes: vec![],
                next_continuation_token: None,
            })
        });
        // Second destination is taken: no copy at all may happen.
        store
            .expect_head_object()
            .returning(|key| Ok((key == "archive/b.txt").then(|| stat(key))));
        store.expect_copy_object().times(0);

        let err = mutations(store)
            .copy_directory("docs/", "archive/")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DestinationKeyExists(k) if k == "archive/b.txt"));
    }

    #[tokio::test]
    async fn test_copy_directory_rewrites_child_keys() {
        let mut store = MockObjectStore::new();
        store.expect_list_page().returning(|_| {
            Ok(ListPage {
                objects: vec![record("docs/sub/deep.txt"), record("docs/a.txt")],
                common_prefixes: vec![],
                next_continuation_token: None,
            })
        });
        store.expect_head_object().returning(|_| Ok(None));
        store
            .expect_copy_object()
            .times(1)
            .withf(|src, dst| src == "docs/sub/deep.txt" && dst == "archive/sub/deep.txt")
            .returning(|_, _| Ok(()));
        store
            .expect_copy_object()
            .times(1)
            .withf(|src, dst| src == "docs/a.txt" && dst == "archive/a.txt")
            .returning(|_, _| Ok(()));

        mutations(store)
            .copy_directory("docs/", "archive/")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_move_object_deletes_source_after_copy() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|_| Ok(None));
        store.expect_copy_object().times(1).returning(|_, _| Ok(()));
        store
            .expect_delete_object()
            .times(1)
            .withf(|key| key == "docs/a.txt")
            .returning(|_| Ok(()));

        mutations(store)
            .move_object("docs/a.txt", "backup/a.txt")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_move_object_failed_delete_surfaces() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|_| Ok(None));
        store.expect_copy_object().returning(|_, _| Ok(()));
        store
            .expect_delete_object()
            .returning(|_| Err(Error::Network("timeout".into())));

        let err = mutations(store)
            .move_object("docs/a.txt", "backup/a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_delete_directory_aborts_on_first_failure() {
        let mut store = MockObjectStore::new();
        store.expect_list_page().returning(|_| {
            Ok(ListPage {
                objects: vec![record("docs/a.txt"), record("docs/b.txt"), record("docs/c.txt")],
                common_prefixes: vec![],
                next_continuation_token: None,
            })
        });
        store
            .expect_delete_object()
            .times(1)
            .withf(|key| key == "docs/a.txt")
            .returning(|_| Ok(()));
        store
            .expect_delete_object()
            .times(1)
            .withf(|key| key == "docs/b.txt")
            .returning(|_| Err(Error::Network("service unavailable".into())));
        // docs/c.txt must never be attempted.

        let err = mutations(store).delete_directory("docs/").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_create_directory_marker_forces_slash() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_empty_object()
            .times(1)
            .withf(|key| key == "docs/new-folder/")
            .returning(|_| Ok(()));

        mutations(store)
            .create_directory_marker("docs/new-folder")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rename_object_builds_sibling_destination() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().returning(|_| Ok(None));
        store
            .expect_copy_object()
            .times(1)
            .withf(|src, dst| src == "docs/old.txt" && dst == "docs/new.txt")
            .returning(|_, _| Ok(()));
        store.expect_delete_object().returning(|_| Ok(()));

        mutations(store)
            .rename_object("docs/old.txt", "new.txt")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_key_is_precondition() {
        let store = MockObjectStore::new();
        let mutations = mutations(store);

        let err = mutations.copy_object("", "x").await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        let err = mutations.rename_object("docs/a.txt", "").await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
