use std::future::Future;
use std::sync::Arc;

use archiver_core::Record;
use archiver_logging::{record_error, record_info, record_warn};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{BookmarkSource, Job, OutputWriter, SourceError, WriteError, WriteReport};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("write failed: {0}")]
    Write(#[from] WriteError),
    #[error("cancelled before start")]
    Cancelled,
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Enriches one record from the remote service and hands it to the output writer.
///
/// Runs on a plain worker thread and drives the async source through `runtime`,
/// so it must never be processed from inside that runtime.
pub struct ArchivalJob {
    record: Record,
    source: Arc<dyn BookmarkSource>,
    writer: Arc<dyn OutputWriter>,
    runtime: Handle,
    cancel: CancellationToken,
}

impl ArchivalJob {
    pub fn new(
        record: Record,
        source: Arc<dyn BookmarkSource>,
        writer: Arc<dyn OutputWriter>,
        runtime: Handle,
    ) -> Self {
        Self {
            record,
            source,
            writer,
            runtime,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch failures are logged and skipped; only the write result is returned.
    pub fn process(mut self) -> Result<WriteReport, JobError> {
        let id = self.record.id().to_string();
        if self.cancel.is_cancelled() {
            record_warn!(id, "skipped, archive cancelled");
            return Err(JobError::Cancelled);
        }
        record_info!(id, "data loaded: {}", self.record);

        if let Some(bookmark_id) = self.record.api_id() {
            match self.block_on_remote(self.source.get_text(bookmark_id)) {
                Ok(text) => self.record.set_full_text(text),
                Err(err) => record_warn!(id, "fetching full text failed: {err}"),
            }
            match self.block_on_remote(self.source.list_highlights(bookmark_id)) {
                Ok(highlights) => self.record.set_highlights(highlights),
                Err(err) => record_warn!(id, "fetching highlights failed: {err}"),
            }
        }

        match self.writer.write(&self.record) {
            Ok(report) => {
                record_info!(id, "archived bookmark");
                Ok(report)
            }
            Err(err) => {
                record_error!(id, "archiving failed: {err}");
                Err(JobError::Write(err))
            }
        }
    }

    fn block_on_remote<T>(
        &self,
        request: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(SourceError::Cancelled),
                result = request => result,
            }
        })
    }
}

impl Job for ArchivalJob {
    fn name(&self) -> String {
        self.record.id().to_string()
    }

    fn run(self: Box<Self>) -> Result<(), JobError> {
        self.process().map(|_| ())
    }
}
