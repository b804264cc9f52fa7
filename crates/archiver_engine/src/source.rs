use std::fmt;

use archiver_core::{ApiView, Highlight};

/// Identifier of a folder on the remote service: numeric for user folders,
/// a fixed slug for the built-in ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unread() -> Self {
        Self::new("unread")
    }

    pub fn starred() -> Self {
        Self::new("starred")
    }

    pub fn archive() -> Self {
        Self::new("archive")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub title: String,
    pub slug: String,
}

impl Folder {
    pub fn new(id: FolderId, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            slug: slug.into(),
        }
    }

    /// The built-in folders every account has but `list_folders` never returns.
    pub fn built_in() -> Vec<Folder> {
        vec![
            Folder::new(FolderId::unread(), "Unread", "unread"),
            Folder::new(FolderId::starred(), "Starred", "starred"),
            Folder::new(FolderId::archive(), "Archive", "archive"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("http status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

/// The remote read-it-later service, as seen by reconciliation and archival jobs.
///
/// Authentication, retries and rate limiting are the implementation's business.
#[async_trait::async_trait]
pub trait BookmarkSource: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<Folder>, SourceError>;

    /// At most `limit` bookmarks from `folder`; the service may return fewer.
    async fn list_bookmarks(
        &self,
        folder: &FolderId,
        limit: usize,
    ) -> Result<Vec<ApiView>, SourceError>;

    /// Processed full-text HTML of a bookmark.
    async fn get_text(&self, bookmark_id: u64) -> Result<String, SourceError>;

    async fn list_highlights(&self, bookmark_id: u64) -> Result<Vec<Highlight>, SourceError>;
}
