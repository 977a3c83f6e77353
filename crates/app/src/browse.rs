//! Navigation and listing state
//!
//! Tracks the prefix the user is looking at and the entries listed under
//! it. Entries are replaced wholesale on every refresh; nothing here is
//! cached across navigations.

use std::sync::Arc;

use ov_core::{key, BucketQueries, Result, StorageObject};

/// The browsing session over one bucket.
///
/// `current_path` is `""` at the bucket root; any other value is a
/// directory prefix ending with `/`.
pub struct Browser {
    queries: Arc<BucketQueries>,
    current_path: String,
    entries: Vec<StorageObject>,
}

impl Browser {
    pub fn new(queries: Arc<BucketQueries>) -> Self {
        Self {
            queries,
            current_path: String::new(),
            entries: Vec::new(),
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn entries(&self) -> &[StorageObject] {
        &self.entries
    }

    /// Whether the browser is at the bucket root.
    pub fn at_root(&self) -> bool {
        self.current_path.is_empty()
    }

    /// Re-list the current path, replacing the entries.
    pub async fn refresh(&mut self) -> Result<()> {
        self.entries = self.queries.list_by_prefix(&self.current_path).await?;
        tracing::debug!(
            path = %self.current_path,
            count = self.entries.len(),
            "listing refreshed"
        );
        Ok(())
    }

    /// Navigate into a directory prefix and list it.
    pub async fn enter(&mut self, prefix: &str) -> Result<()> {
        let mut path = key::trim_root(prefix).to_string();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        self.current_path = path;
        self.refresh().await
    }

    /// Navigate to the parent prefix and list it. No-op at the root.
    pub async fn up(&mut self) -> Result<()> {
        if self.at_root() {
            return self.refresh().await;
        }
        self.current_path = parent_prefix(&self.current_path);
        self.refresh().await
    }
}

/// Parent of a directory prefix: `"a/b/"` -> `"a/"`, `"a/"` -> `""`.
fn parent_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => trimmed[..=pos].to_string(),
        None => String::new(),
    }
}
