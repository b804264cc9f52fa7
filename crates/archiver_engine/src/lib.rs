//! Archiver engine: remote source, reconciliation driver, archival jobs, the
//! worker queue and the output writers.
pub mod instapaper;
mod job;
mod output;
mod persist;
mod pipeline;
mod queue;
mod reconcile;
mod source;

pub use job::{ArchivalJob, JobError};
pub use output::{
    build_post_document, escape_double_quotes, Artifact, ArtifactFailure, ArtifactStatus,
    FormatError, JekyllWriter, OutputFormat, OutputWriter, PostZone, WriteError, WriteReport,
};
pub use persist::{ensure_output_dir, write_new, PersistError, WriteOutcome};
pub use pipeline::{create_archive, ArchiveContext, ArchiveError};
pub use queue::{Job, JobQueue, QueueError, QueueSummary, SLOTS_PER_WORKER};
pub use reconcile::{
    reconcile_folders, ReconcileError, ReconcileStats, DEFAULT_LISTING_LIMIT, LISTING_PAGE_CAP,
};
pub use source::{BookmarkSource, Folder, FolderId, SourceError};
