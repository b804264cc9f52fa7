use std::path::Path;
use std::sync::Arc;

use archiver_core::{read_export_file, RecordSet};
use archiver_logging::{archive_info, archive_warn};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{
    reconcile_folders, ArchivalJob, BookmarkSource, JobQueue, OutputWriter, QueueError,
    ReconcileError, WriteError,
};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("preparing output failed: {0}")]
    Output(#[from] WriteError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("submitting job failed: {0}")]
    Queue(#[from] QueueError),
}

/// Everything an archival job shares with its siblings.
#[derive(Clone)]
pub struct ArchiveContext {
    pub source: Arc<dyn BookmarkSource>,
    pub writer: Arc<dyn OutputWriter>,
    pub runtime: Handle,
    pub cancel: CancellationToken,
}

/// Prepares the output, reconciles the export at `export_csv` with every folder
/// listing, and submits one job per record to the already started `queue`.
///
/// Returns the number of jobs submitted; their results show up in the queue's
/// summary once it is stopped.
pub fn create_archive(
    ctx: &ArchiveContext,
    queue: &JobQueue,
    export_csv: &Path,
    listing_limit: usize,
) -> Result<usize, ArchiveError> {
    ctx.writer.preflight()?;

    let export = read_export_file(export_csv).map_err(ReconcileError::from)?;
    archive_info!("read {} rows from {}", export.len(), export_csv.display());
    let mut records = RecordSet::from_export(export);
    ctx.runtime.block_on(reconcile_folders(
        ctx.source.as_ref(),
        &mut records,
        listing_limit,
    ))?;

    let total = records.len();
    archive_info!("{total} bookmarks to archive");
    let mut submitted = 0;
    for record in records {
        if ctx.cancel.is_cancelled() {
            archive_warn!("cancelled after submitting {submitted} of {total} bookmarks");
            break;
        }
        let job = ArchivalJob::new(
            record,
            Arc::clone(&ctx.source),
            Arc::clone(&ctx.writer),
            ctx.runtime.clone(),
        )
        .with_cancellation(ctx.cancel.clone());
        queue.submit(job)?;
        submitted += 1;
    }
    Ok(submitted)
}
