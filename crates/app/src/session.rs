//! Session wiring
//!
//! Builds the full object-management stack from a validated configuration:
//! one S3 store, the query and mutation layers on top of it, and the
//! browser, orchestrator, and upload pipeline sharing them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use ov_core::{BucketMutations, BucketQueries, Config, Result};
use ov_s3::{HttpTransport, S3Store};

use crate::browse::Browser;
use crate::orchestrator::Orchestrator;
use crate::upload::UploadPipeline;

/// A connected session over one bucket.
pub struct Session {
    pub browser: Arc<Mutex<Browser>>,
    pub orchestrator: Orchestrator,
    pub uploads: UploadPipeline,
    queries: Arc<BucketQueries>,
}

impl Session {
    /// Connect to the configured bucket and assemble the stack. The
    /// initial listing is not fetched; call `browser.refresh()` first.
    pub async fn connect(config: Config) -> Result<Self> {
        if config.signing_service_url.is_some() {
            // Signing is delegated to the SDK presigner; an external
            // signing service is accepted in the config but not used.
            tracing::warn!("signing_service_url is set but ignored");
        }

        let store = Arc::new(S3Store::connect(&config).await?);
        tracing::info!(bucket = %config.bucket, region = %config.region, "connected");

        let expiry = Duration::from_secs(config.presign_expiry_secs);
        let queries = Arc::new(BucketQueries::new(store.clone(), expiry));
        let mutations = Arc::new(BucketMutations::new(store, queries.clone()));

        let browser = Arc::new(Mutex::new(Browser::new(queries.clone())));
        let orchestrator = Orchestrator::new(mutations, browser.clone());

        let transport = Arc::new(HttpTransport::new()?);
        let uploads = UploadPipeline::new(
            queries.clone(),
            transport,
            browser.clone(),
            config.upload_size_limit,
        );

        Ok(Self {
            browser,
            orchestrator,
            uploads,
            queries,
        })
    }

    /// Direct access to the query layer, for read URL generation.
    pub fn queries(&self) -> &Arc<BucketQueries> {
        &self.queries
    }
}
