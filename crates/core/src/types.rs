//! Data model for listings and pending operations
//!
//! `StorageObject` entries are rebuilt wholesale on every listing refresh;
//! nothing here is persisted. `OperationContext` is the single source of
//! truth for the pending user intent the orchestrator acts on.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key;

/// Classification of a listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    File,
    Directory,
}

/// Metadata for a file entry (absent on synthetic directory entries)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Size in bytes
    pub size_bytes: i64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// One entry of a bucket listing
///
/// Directory entries are synthetic: derived from common-prefix groupings,
/// never fetched from the backend as objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageObject {
    pub object_type: ObjectType,

    /// Full path-like key, unique within the bucket
    pub key: String,

    /// Display name, derived from the last path segment
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMetadata>,
}

impl StorageObject {
    /// Create a file entry from a listing record.
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        let key = key.into();
        let name = key::last_segment(&key).to_string();
        Self {
            object_type: ObjectType::File,
            key,
            name,
            metadata: Some(ObjectMetadata {
                size_bytes: size,
                size_human: humansize::format_size(size.max(0) as u64, humansize::BINARY),
                last_modified: None,
                etag: None,
            }),
        }
    }

    /// Create a synthetic directory entry from a common prefix.
    pub fn directory(prefix: impl Into<String>) -> Self {
        let key = prefix.into();
        let name = key::split_parent_segment(&key);
        Self {
            object_type: ObjectType::Directory,
            key,
            name,
            metadata: None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.object_type == ObjectType::Directory
    }
}

/// The five user intents the orchestrator can carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Copy,
    Move,
    Rename,
    Delete,
}

impl OperationKind {
    /// Human-readable message shown while the operation is in flight.
    pub const fn progress_message(&self) -> &'static str {
        match self {
            OperationKind::Create => "Creating folder...",
            OperationKind::Copy => "Copying object...",
            OperationKind::Move => "Moving object...",
            OperationKind::Rename => "Renaming object...",
            OperationKind::Delete => "Deleting object...",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Create => "create",
            OperationKind::Copy => "copy",
            OperationKind::Move => "move",
            OperationKind::Rename => "rename",
            OperationKind::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

/// Pending-operation context: set when the user initiates an action,
/// cleared on success or when the initiating dialog closes.
///
/// Every mutating orchestrator call requires the stored kind to match the
/// call; a mismatch is a precondition failure, never silently ignored.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    source_key: Option<String>,
    kind: Option<OperationKind>,
}

impl OperationContext {
    /// Record a newly initiated operation on `source_key`.
    ///
    /// For `Create`, the source is the parent prefix the folder will be
    /// created under and may be empty (bucket root).
    pub fn begin(&mut self, kind: OperationKind, source_key: impl Into<String>) {
        self.kind = Some(kind);
        self.source_key = Some(source_key.into());
    }

    /// Clear the pending operation.
    pub fn reset(&mut self) {
        self.kind = None;
        self.source_key = None;
    }

    pub fn is_pending(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<OperationKind> {
        self.kind
    }

    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    /// Assert the pending operation matches `expected` and return its
    /// source key.
    pub fn expect(&self, expected: OperationKind) -> Result<&str> {
        match (self.kind, self.source_key.as_deref()) {
            (Some(kind), Some(source)) if kind == expected => Ok(source),
            (Some(kind), _) => Err(Error::Precondition(format!(
                "expected a pending {expected} operation, found {kind}"
            ))),
            (None, _) => Err(Error::Precondition(format!(
                "no pending operation; expected {expected}"
            ))),
        }
    }
}
