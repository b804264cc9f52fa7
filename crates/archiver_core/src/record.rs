use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDate, TimeZone};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

pub const NO_ID: &str = "NO_ID";
pub const NO_HASH: &str = "NO_HASH";
pub const NO_TITLE: &str = "NO_TITLE";
pub const NO_URL: &str = "NO_URL";
/// Date used when no timestamp source exists. Predates the service.
pub const MISSING_DATE: &str = "2000-01-01";
/// Date used when the export timestamp is not an integer. Predates the service.
pub const UNPARSEABLE_DATE: &str = "2001-10-10";

const EXPORT_HASH_PREFIX: &str = "sha-";
const EXPORT_HASH_HEX_LEN: usize = 10;

/// Bookmark fields as listed by the remote service.
///
/// Serialized field names are part of the `_data/<id>.json` layout that site
/// templates read, so they are pinned explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiView {
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "bookmark_id")]
    pub id: u64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "ProgressTimestamp")]
    pub progress_timestamp: i64,
    #[serde(rename = "Time")]
    pub time: i64,
    #[serde(rename = "Progress")]
    pub progress: f64,
    #[serde(rename = "Starred")]
    pub starred: bool,
}

/// One highlight attached to a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "BookmarkID")]
    pub bookmark_id: u64,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Note")]
    pub note: String,
    #[serde(rename = "Time")]
    pub time: i64,
    #[serde(rename = "Position")]
    pub position: i64,
}

/// Bookmark fields as found in one row of the CSV export.
///
/// The URL is only readable through [`ExportView::url`] because the cached
/// digest is derived from it.
#[derive(Debug, Clone, Default)]
pub struct ExportView {
    url: String,
    pub title: String,
    pub selection: String,
    pub folder: String,
    /// Unix seconds as written in the export; may be empty or malformed.
    pub timestamp: String,
    hash: OnceLock<String>,
}

impl ExportView {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        selection: impl Into<String>,
        folder: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            selection: selection.into(),
            folder: folder.into(),
            timestamp: timestamp.into(),
            hash: OnceLock::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Surrogate key derived from the URL, computed on first use and cached.
    /// `None` when the row has no URL.
    pub fn hash(&self) -> Option<&str> {
        if self.url.is_empty() {
            return None;
        }
        Some(self.hash.get_or_init(|| export_hash(&self.url)))
    }
}

impl PartialEq for ExportView {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.title == other.title
            && self.selection == other.selection
            && self.folder == other.folder
            && self.timestamp == other.timestamp
    }
}

impl Serialize for ExportView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExportView", 6)?;
        state.serialize_field("URL", &self.url)?;
        state.serialize_field("Title", &self.title)?;
        state.serialize_field("Selection", &self.selection)?;
        state.serialize_field("Folder", &self.folder)?;
        state.serialize_field("Timestamp", &self.timestamp)?;
        state.serialize_field("Hash", self.hash().unwrap_or_default())?;
        state.end()
    }
}

/// `sha-` followed by the first 10 hex digits of SHA-256(url).
pub fn export_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = String::with_capacity(EXPORT_HASH_PREFIX.len() + EXPORT_HASH_HEX_LEN);
    hex.push_str(EXPORT_HASH_PREFIX);
    for byte in digest.iter().take(EXPORT_HASH_HEX_LEN / 2) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// A derived text field, or the sentinel standing in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived<'a> {
    Value(&'a str),
    Missing(&'static str),
}

impl<'a> Derived<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Derived::Value(value) => value,
            Derived::Missing(sentinel) => sentinel,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Derived::Missing(_))
    }
}

impl fmt::Display for Derived<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive identity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordId<'a> {
    /// Server-assigned bookmark ID.
    Api(u64),
    /// Digest of the export URL.
    Digest(&'a str),
    Unidentified,
}

impl RecordId<'_> {
    /// True only for server-assigned IDs, the ones the remote service can be asked about.
    pub fn is_stable(&self) -> bool {
        matches!(self, RecordId::Api(_))
    }
}

impl fmt::Display for RecordId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Api(id) => write!(f, "{id}"),
            RecordId::Digest(hash) => f.write_str(hash),
            RecordId::Unidentified => f.write_str(NO_ID),
        }
    }
}

/// Calendar date a record is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveDate {
    Known(NaiveDate),
    /// The export timestamp was present but not an integer (or out of range).
    Unparseable,
    /// No timestamp source at all.
    Missing,
}

impl fmt::Display for ArchiveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ArchiveDate::Unparseable => f.write_str(UNPARSEABLE_DATE),
            ArchiveDate::Missing => f.write_str(MISSING_DATE),
        }
    }
}

/// The canonical bookmark, merged from the export and the remote listing.
///
/// Serializes to the metadata projection: full text and highlights are
/// deliberately left out.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    #[serde(rename = "Bookmark")]
    api_view: Option<ApiView>,
    #[serde(rename = "BookmarkExportMeta")]
    export_view: Option<ExportView>,
    #[serde(skip)]
    full_text: String,
    #[serde(skip)]
    highlights: Vec<Highlight>,
    #[serde(rename = "ContainingFolder")]
    containing_folder: String,
}

impl Record {
    /// A record seen only in the export. The export's folder column seeds the folder label.
    pub fn from_export(view: ExportView) -> Self {
        let containing_folder = view.folder.clone();
        Self {
            api_view: None,
            export_view: Some(view),
            full_text: String::new(),
            highlights: Vec::new(),
            containing_folder,
        }
    }

    /// A record discovered in a folder listing without a matching export row.
    pub fn from_api(view: ApiView, folder: impl Into<String>) -> Self {
        Self {
            api_view: Some(view),
            export_view: None,
            full_text: String::new(),
            highlights: Vec::new(),
            containing_folder: folder.into(),
        }
    }

    pub fn api_view(&self) -> Option<&ApiView> {
        self.api_view.as_ref()
    }

    pub fn export_view(&self) -> Option<&ExportView> {
        self.export_view.as_ref()
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn containing_folder(&self) -> &str {
        &self.containing_folder
    }

    /// Replaces any previous API view; the last folder to list a bookmark wins.
    pub fn attach_api_view(&mut self, view: ApiView, folder: impl Into<String>) {
        self.api_view = Some(view);
        self.containing_folder = folder.into();
    }

    pub fn set_full_text(&mut self, text: impl Into<String>) {
        self.full_text = text.into();
    }

    pub fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        self.highlights = highlights;
    }

    /// Server-assigned ID, if the record has one.
    pub fn api_id(&self) -> Option<u64> {
        self.api_view
            .as_ref()
            .map(|view| view.id)
            .filter(|id| *id > 0)
    }

    pub fn id(&self) -> RecordId<'_> {
        if let Some(id) = self.api_id() {
            return RecordId::Api(id);
        }
        match self.export_view.as_ref().and_then(ExportView::hash) {
            Some(hash) => RecordId::Digest(hash),
            None => RecordId::Unidentified,
        }
    }

    pub fn hash(&self) -> Derived<'_> {
        if let Some(view) = self.api_view.as_ref().filter(|v| !v.hash.is_empty()) {
            return Derived::Value(&view.hash);
        }
        match self.export_view.as_ref().and_then(ExportView::hash) {
            Some(hash) => Derived::Value(hash),
            None => Derived::Missing(NO_HASH),
        }
    }

    pub fn title(&self) -> Derived<'_> {
        if let Some(view) = self.api_view.as_ref().filter(|v| !v.title.is_empty()) {
            return Derived::Value(&view.title);
        }
        match self.export_view.as_ref().filter(|v| !v.title.is_empty()) {
            Some(view) => Derived::Value(&view.title),
            None => Derived::Missing(NO_TITLE),
        }
    }

    pub fn url(&self) -> Derived<'_> {
        if let Some(view) = self.api_view.as_ref().filter(|v| !v.url.is_empty()) {
            return Derived::Value(&view.url);
        }
        match self.export_view.as_ref().filter(|v| !v.url.is_empty()) {
            Some(view) => Derived::Value(&view.url),
            None => Derived::Missing(NO_URL),
        }
    }

    /// Date the record is filed under, with Unix times read in `tz`.
    pub fn archive_date<Tz: TimeZone>(&self, tz: &Tz) -> ArchiveDate {
        if let Some(view) = self.api_view.as_ref().filter(|v| v.time > 0) {
            return date_in(view.time, tz);
        }
        match self.export_view.as_ref().filter(|v| !v.timestamp.is_empty()) {
            Some(view) => match view.timestamp.parse::<i64>() {
                Ok(secs) => date_in(secs, tz),
                Err(_) => ArchiveDate::Unparseable,
            },
            None => ArchiveDate::Missing,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ID:{}, URL:{}}}", self.id(), self.url())
    }
}

fn date_in<Tz: TimeZone>(secs: i64, tz: &Tz) -> ArchiveDate {
    match tz.timestamp_opt(secs, 0).single() {
        Some(datetime) => ArchiveDate::Known(datetime.date_naive()),
        None => ArchiveDate::Unparseable,
    }
}
