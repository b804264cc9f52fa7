use std::collections::btree_map::{self, BTreeMap, Entry};

use crate::{ApiView, ExportView, Record};

/// Outcome of merging one folder listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Existing records that received (or replaced) their API view.
    pub enriched: usize,
    /// Records created because the URL was never seen before.
    pub discovered: usize,
}

/// All known records, keyed by exact URL string.
///
/// Keys are compared byte for byte: `https://a/x` and `https://a/x/` are two
/// records. Iteration is in URL order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: BTreeMap<String, Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One record per export URL. A repeated URL keeps the later row.
    pub fn from_export(views: impl IntoIterator<Item = ExportView>) -> Self {
        let mut records = BTreeMap::new();
        for view in views {
            records.insert(view.url().to_string(), Record::from_export(view));
        }
        Self { records }
    }

    /// Attach every listed bookmark to the record with the same URL, creating
    /// API-only records for URLs that are new.
    pub fn merge_folder(
        &mut self,
        folder_label: &str,
        listing: impl IntoIterator<Item = ApiView>,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for view in listing {
            match self.records.entry(view.url.clone()) {
                Entry::Occupied(mut slot) => {
                    slot.get_mut().attach_api_view(view, folder_label);
                    outcome.enriched += 1;
                }
                Entry::Vacant(slot) => {
                    slot.insert(Record::from_api(view, folder_label));
                    outcome.discovered += 1;
                }
            }
        }
        outcome
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&Record> {
        self.records.get(url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = btree_map::IntoValues<String, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}
