//! Operation orchestrator
//!
//! Maps pending user intents onto the mutation operations: validates the
//! operation context, resolves destination keys, classifies the source as
//! file or directory, and dispatches through an exhaustive
//! (kind, object type) match so an unhandled combination cannot compile.
//! On success the browser listing is refreshed and the context cleared; on
//! failure the context is left intact so the caller can inspect and report
//! it without losing the pending operation.

use std::sync::Arc;

use tokio::sync::Mutex;

use ov_core::{key, BucketMutations, Error, ObjectType, OperationContext, OperationKind, Result};

use crate::browse::Browser;

pub struct Orchestrator {
    mutations: Arc<BucketMutations>,
    browser: Arc<Mutex<Browser>>,
    context: OperationContext,
    progress: Option<String>,
}

impl Orchestrator {
    pub fn new(mutations: Arc<BucketMutations>, browser: Arc<Mutex<Browser>>) -> Self {
        Self {
            mutations,
            browser,
            context: OperationContext::default(),
            progress: None,
        }
    }

    /// Record a newly initiated operation. For `Create` the source is the
    /// parent prefix the folder will be created under.
    pub fn begin(&mut self, kind: OperationKind, source_key: impl Into<String>) {
        self.context.begin(kind, source_key);
    }

    /// Drop the pending operation (dialog closed without confirming).
    pub fn cancel_pending(&mut self) {
        self.context.reset();
    }

    pub fn pending_kind(&self) -> Option<OperationKind> {
        self.context.kind()
    }

    pub fn pending_source(&self) -> Option<&str> {
        self.context.source_key()
    }

    /// Human-readable message while an operation is in flight, meant to
    /// drive a blocking notification.
    pub fn progress_message(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Create a folder named `name` under the pending parent prefix.
    pub async fn create_directory(&mut self, name: &str) -> Result<()> {
        let parent = self.context.expect(OperationKind::Create)?.to_string();

        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(Error::Precondition("folder name is empty".into()));
        }

        let mut destination = key::child_key(key::trim_root(&parent), name);
        if !destination.ends_with('/') {
            destination.push('/');
        }

        // Creation always targets a directory marker.
        self.run(OperationKind::Create, ObjectType::Directory, &parent, &destination)
            .await
    }

    /// Copy the pending source under `destination_prefix`, optionally
    /// giving the copy a new trailing name.
    pub async fn copy_to(
        &mut self,
        destination_prefix: &str,
        new_name: Option<&str>,
    ) -> Result<()> {
        let source = self.expect_source(OperationKind::Copy)?;
        let destination = resolve_destination(&source, destination_prefix, new_name);
        let object_type = classify(&source);
        self.run(OperationKind::Copy, object_type, &source, &destination)
            .await
    }

    /// Move the pending source under `destination_prefix`.
    pub async fn move_to(
        &mut self,
        destination_prefix: &str,
        new_name: Option<&str>,
    ) -> Result<()> {
        let source = self.expect_source(OperationKind::Move)?;
        let destination = resolve_destination(&source, destination_prefix, new_name);
        let object_type = classify(&source);
        self.run(OperationKind::Move, object_type, &source, &destination)
            .await
    }

    /// Rename the pending source in place.
    pub async fn rename_to(&mut self, new_name: &str) -> Result<()> {
        let source = self.expect_source(OperationKind::Rename)?;
        let object_type = classify(&source);
        self.run(OperationKind::Rename, object_type, &source, new_name)
            .await
    }

    /// Delete the pending source. Never computes a destination.
    pub async fn delete(&mut self) -> Result<()> {
        let source = self.expect_source(OperationKind::Delete)?;
        let object_type = classify(&source);
        self.run(OperationKind::Delete, object_type, &source, "").await
    }

    fn expect_source(&self, kind: OperationKind) -> Result<String> {
        let source = self.context.expect(kind)?;
        if source.is_empty() {
            return Err(Error::Precondition(format!("{kind} requires a source key")));
        }
        Ok(source.to_string())
    }

    /// Dispatch and handle completion. `target` is the resolved destination
    /// key for create/copy/move, the new name for rename, and unused for
    /// delete.
    async fn run(
        &mut self,
        kind: OperationKind,
        object_type: ObjectType,
        source: &str,
        target: &str,
    ) -> Result<()> {
        self.progress = Some(kind.progress_message().to_string());
        tracing::info!(%kind, source, target, "executing operation");

        let result = match (kind, object_type) {
            (OperationKind::Create, _) => self.mutations.create_directory_marker(target).await,
            (OperationKind::Copy, ObjectType::File) => {
                self.mutations.copy_object(source, target).await
            }
            (OperationKind::Copy, ObjectType::Directory) => {
                self.mutations.copy_directory(source, target).await
            }
            (OperationKind::Move, ObjectType::File) => {
                self.mutations.move_object(source, target).await
            }
            (OperationKind::Move, ObjectType::Directory) => {
                self.mutations.move_directory(source, target).await
            }
            (OperationKind::Rename, ObjectType::File) => {
                self.mutations.rename_object(source, target).await
            }
            (OperationKind::Rename, ObjectType::Directory) => {
                self.mutations.rename_directory(source, target).await
            }
            (OperationKind::Delete, ObjectType::File) => {
                self.mutations.delete_object(source).await
            }
            (OperationKind::Delete, ObjectType::Directory) => {
                self.mutations.delete_directory(source).await
            }
        };

        self.progress = None;
        match result {
            Ok(()) => {
                self.context.reset();
                self.browser.lock().await.refresh().await
            }
            Err(e) => {
                tracing::warn!(%kind, source, error = %e, "operation failed");
                Err(e)
            }
        }
    }
}

/// Dispatch classification is by trailing slash only; the extensionless
/// heuristic in `key::is_directory_key` is for display, not dispatch.
fn classify(source_key: &str) -> ObjectType {
    if source_key.ends_with('/') {
        ObjectType::Directory
    } else {
        ObjectType::File
    }
}

/// Resolve the destination key for a copy/move, applying the optional new
/// trailing name. The root marker `/` (and an empty resolution, which
/// stands for it) maps to the empty root prefix the backend expects.
fn resolve_destination(source: &str, destination_prefix: &str, new_name: Option<&str>) -> String {
    let mut destination = key::destination_from_source(source, destination_prefix);
    if let Some(name) = new_name {
        destination = key::rename_trailing_segment(&destination, name);
    }
    key::trim_root(&destination).to_string()
}
