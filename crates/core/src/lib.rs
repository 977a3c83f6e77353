//! ov-core: Core library for the objview bucket browser engine
//!
//! This crate provides the backend-agnostic core of objview, including:
//! - Object key transforms and destination resolution
//! - Listing data model and pending-operation context
//! - ObjectStore/UploadTransport traits for the storage boundary
//! - Read-only query operations with a signed-URL cache
//! - Mutating operations (copy, move, delete, create) for objects and
//!   directory prefixes
//! - Configuration management
//!
//! This crate is independent of any specific S3 SDK, allowing for easy
//! testing and potential future support for other backends.

pub mod config;
pub mod error;
pub mod key;
pub mod mutation;
pub mod query;
pub mod traits;
pub mod types;

pub use config::{Config, ConfigManager, DEFAULT_PRESIGN_EXPIRY_SECS};
pub use error::{carry_failure, Error, Result};
pub use mutation::BucketMutations;
pub use query::{BucketQueries, UrlCache};
pub use traits::{
    ListPage, ListRequest, ObjectRecord, ObjectStat, ObjectStore, ProgressFn, UploadTransport,
};
pub use types::{ObjectMetadata, ObjectType, OperationContext, OperationKind, StorageObject};
