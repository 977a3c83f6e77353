//! Upload pipeline
//!
//! Holds the selected files as upload tasks, validates them as a batch,
//! and runs the batch sequentially against presigned PUT URLs. Each task
//! walks pending -> uploading -> completed | error | cancelled and never
//! leaves a terminal state. Cancellation is cooperative through a shared
//! handle that the UI can clone and trigger from another task.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use ov_core::{key, BucketQueries, Error, ProgressFn, Result, UploadTransport};

use crate::browse::Browser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Error,
    Cancelled,
}

impl UploadStatus {
    /// Terminal tasks are never re-run or transitioned again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

/// A file picked for upload, with its body already in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadFile {
    /// Build a file entry, guessing the content type from the name.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            name,
            content_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// One file's slot in the batch.
pub struct UploadTask {
    file: UploadFile,
    status: UploadStatus,
    progress: Arc<AtomicU8>,
    error: Option<String>,
}

impl UploadTask {
    fn new(file: UploadFile) -> Self {
        Self {
            file,
            status: UploadStatus::Pending,
            progress: Arc::new(AtomicU8::new(0)),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Progress in whole percent, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Batch result counts. Cancelled tasks are counted in neither field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub error_count: usize,
}

/// Cloneable cancellation handle for in-flight uploads.
///
/// `cancel_current` aborts only the transfer that is on the wire;
/// `cancel_all` additionally stops the batch from starting further tasks.
#[derive(Clone, Default)]
pub struct CancelHandle {
    current: Arc<StdMutex<Option<CancellationToken>>>,
    all: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel_current(&self) {
        if let Ok(guard) = self.current.lock() {
            if let Some(token) = guard.as_ref() {
                token.cancel();
            }
        }
    }

    pub fn cancel_all(&self) {
        self.all.store(true, Ordering::SeqCst);
        self.cancel_current();
    }

    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(token.clone());
        }
        token
    }

    fn disarm(&self) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = None;
        }
    }

    fn all_requested(&self) -> bool {
        self.all.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.all.store(false, Ordering::SeqCst);
        self.disarm();
    }
}

pub struct UploadPipeline {
    queries: Arc<BucketQueries>,
    transport: Arc<dyn UploadTransport>,
    browser: Arc<Mutex<Browser>>,
    tasks: Vec<UploadTask>,
    cancel: CancelHandle,
    size_limit: Option<u64>,
}

impl UploadPipeline {
    pub fn new(
        queries: Arc<BucketQueries>,
        transport: Arc<dyn UploadTransport>,
        browser: Arc<Mutex<Browser>>,
        size_limit: Option<u64>,
    ) -> Self {
        Self {
            queries,
            transport,
            browser,
            tasks: Vec::new(),
            cancel: CancelHandle::default(),
            size_limit,
        }
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Handle the UI can hold to cancel transfers from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Replace the task list with a validated selection. Validation is
    /// all-or-nothing; a single oversized file rejects the whole batch.
    pub fn select_files(&mut self, files: Vec<UploadFile>) -> Result<()> {
        self.validate(&files)?;
        self.tasks = files.into_iter().map(UploadTask::new).collect();
        Ok(())
    }

    /// Drop any selection that has not started uploading.
    pub fn clear_selection(&mut self) {
        self.tasks.clear();
    }

    fn validate(&self, files: &[UploadFile]) -> Result<()> {
        if files.is_empty() {
            return Err(Error::Precondition("no files selected".into()));
        }

        if let Some(limit) = self.size_limit {
            let oversized = files.iter().filter(|f| f.size() > limit).count();
            if oversized > 0 {
                return Err(Error::Precondition(format!(
                    "{oversized} file(s) exceed the upload size limit of {}",
                    humansize::format_size(limit, humansize::BINARY)
                )));
            }
        }

        Ok(())
    }

    /// Upload one file into the current directory and refresh the listing.
    pub async fn upload_single(&mut self, file: UploadFile, overwrite: bool) -> Result<()> {
        self.validate(std::slice::from_ref(&file))?;
        self.cancel.reset();

        let prefix = self.browser.lock().await.current_path().to_string();
        let mut task = UploadTask::new(file);
        let result = self.run_task(&mut task, &prefix, overwrite).await;
        self.tasks = vec![task];

        // The listing is refreshed even after a failed upload; a partial
        // transfer never leaves an object behind, but a stale view might.
        self.browser.lock().await.refresh().await?;
        result
    }

    /// Run all non-terminal tasks in order. Individual failures and
    /// cancellations do not abort the batch; `cancel_all` does.
    pub async fn upload_batch(&mut self, overwrite: bool) -> Result<BatchOutcome> {
        if self.tasks.is_empty() {
            return Err(Error::Precondition("no files selected".into()));
        }
        self.cancel.reset();

        let prefix = self.browser.lock().await.current_path().to_string();

        let mut tasks = std::mem::take(&mut self.tasks);
        for task in &mut tasks {
            if task.status.is_terminal() {
                continue;
            }
            if self.cancel.all_requested() {
                task.status = UploadStatus::Cancelled;
                continue;
            }

            match self.run_task(task, &prefix, overwrite).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    tracing::info!(name = task.name(), "upload cancelled");
                }
                Err(e) => {
                    tracing::warn!(name = task.name(), error = %e, "upload failed");
                }
            }
        }
        self.tasks = tasks;

        self.browser.lock().await.refresh().await?;

        let outcome = BatchOutcome {
            success_count: self.count(UploadStatus::Completed),
            error_count: self.count(UploadStatus::Error),
        };
        tracing::info!(
            success = outcome.success_count,
            errors = outcome.error_count,
            "upload batch finished"
        );
        Ok(outcome)
    }

    /// Cancel the whole batch: abort the in-flight transfer and mark every
    /// non-terminal task cancelled. Completed and errored tasks keep their
    /// state.
    pub fn cancel_all(&mut self) {
        self.cancel.cancel_all();
        for task in &mut self.tasks {
            if !task.status.is_terminal() {
                task.status = UploadStatus::Cancelled;
            }
        }
    }

    fn count(&self, status: UploadStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    async fn run_task(&self, task: &mut UploadTask, prefix: &str, overwrite: bool) -> Result<()> {
        let object_key = key::child_key(prefix, &task.file.name);
        task.status = UploadStatus::Uploading;

        let result = self.transfer(task, &object_key, overwrite).await;
        self.cancel.disarm();

        match &result {
            Ok(()) => {
                task.progress.store(100, Ordering::Relaxed);
                task.status = UploadStatus::Completed;
            }
            Err(Error::Cancelled) => {
                task.status = UploadStatus::Cancelled;
            }
            Err(e) => {
                task.status = UploadStatus::Error;
                task.error = Some(e.to_string());
            }
        }
        result
    }

    async fn transfer(&self, task: &UploadTask, object_key: &str, overwrite: bool) -> Result<()> {
        let url = self
            .queries
            .generate_upload_url(object_key, overwrite, task.file.content_type.as_deref())
            .await?;

        let token = self.cancel.arm();
        let counter = task.progress.clone();
        let progress: ProgressFn = Box::new(move |done, total| {
            let percent = if total == 0 {
                100
            } else {
                ((done as f64 / total as f64) * 100.0).round() as u8
            };
            counter.store(percent.min(100), Ordering::Relaxed);
        });

        self.transport
            .upload(
                &url,
                task.file.data.clone(),
                task.file.content_type.as_deref(),
                progress,
                &token,
            )
            .await
    }
}
