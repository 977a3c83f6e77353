//! ov-s3: S3 SDK adapter for objview
//!
//! This crate provides the implementation of the ObjectStore trait using
//! aws-sdk-s3, plus the reqwest-based transport that streams uploads to
//! presigned URLs. It is the only crate that touches the network.

pub mod store;
pub mod transport;

pub use store::S3Store;
pub use transport::HttpTransport;
