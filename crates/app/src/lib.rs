//! ov-app: application layer for objview
//!
//! Ties the query and mutation layers from ov-core to the S3 adapter in
//! ov-s3 and exposes the stateful pieces a frontend drives: the browser,
//! the operation orchestrator, and the upload pipeline.

pub mod browse;
pub mod orchestrator;
pub mod session;
pub mod upload;

pub use browse::Browser;
pub use orchestrator::Orchestrator;
pub use session::Session;
pub use upload::{BatchOutcome, CancelHandle, UploadFile, UploadPipeline, UploadStatus};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize logging from `RUST_LOG`, defaulting to warnings plus info
/// for the workspace crates.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("warn,ov_core=info,ov_s3=info,ov_app=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
