use archiver_core::{ExportError, RecordSet};
use archiver_logging::{archive_info, archive_warn};

use crate::{BookmarkSource, Folder, SourceError};

/// Limit passed to every folder listing. The service silently caps it.
pub const DEFAULT_LISTING_LIMIT: usize = 100_000;
/// Largest page the service actually returns; listings this long are probably truncated.
pub const LISTING_PAGE_CAP: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("reading export failed: {0}")]
    Export(#[from] ExportError),
    #[error("listing folders failed: {0}")]
    Folders(#[source] SourceError),
    #[error("listing folder {folder:?} failed: {source}")]
    Listing {
        folder: String,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub folders: usize,
    pub listed: usize,
    pub enriched: usize,
    pub discovered: usize,
}

/// Lists every user folder plus the built-in ones and merges each listing into
/// `records`. The first failing listing aborts the whole merge.
pub async fn reconcile_folders(
    source: &dyn BookmarkSource,
    records: &mut RecordSet,
    limit: usize,
) -> Result<ReconcileStats, ReconcileError> {
    let mut folders = source.list_folders().await.map_err(ReconcileError::Folders)?;
    folders.extend(Folder::built_in());

    let mut stats = ReconcileStats::default();
    for folder in folders {
        let listing = source
            .list_bookmarks(&folder.id, limit)
            .await
            .map_err(|err| ReconcileError::Listing {
                folder: folder.title.clone(),
                source: err,
            })?;
        if listing.len() >= LISTING_PAGE_CAP {
            archive_warn!(
                "folder {:?} returned {} bookmarks, older ones are probably missing",
                folder.title,
                listing.len()
            );
        }

        stats.folders += 1;
        stats.listed += listing.len();
        let outcome = records.merge_folder(&folder.title, listing);
        stats.enriched += outcome.enriched;
        stats.discovered += outcome.discovered;
    }

    archive_info!(
        "reconciled {} folders: {} listed, {} enriched, {} discovered, {} records total",
        stats.folders,
        stats.listed,
        stats.enriched,
        stats.discovered,
        records.len()
    );
    Ok(stats)
}
