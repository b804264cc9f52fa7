//! Archiver core: the bookmark record model, the CSV export reader and the
//! URL-keyed merge of export rows with remote folder listings.
mod export;
mod reconcile;
mod record;

pub use export::{read_export, read_export_file, ExportError, EXPORT_COLUMNS};
pub use reconcile::{MergeOutcome, RecordSet};
pub use record::{
    export_hash, ApiView, ArchiveDate, Derived, ExportView, Highlight, Record, RecordId,
    MISSING_DATE, NO_HASH, NO_ID, NO_TITLE, NO_URL, UNPARSEABLE_DATE,
};
