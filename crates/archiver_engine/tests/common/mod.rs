#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use archiver_core::{ApiView, Highlight};
use archiver_engine::{BookmarkSource, Folder, FolderId, SourceError};

/// In-memory stand-in for the remote service.
#[derive(Default)]
pub struct FakeSource {
    pub folders: Vec<Folder>,
    pub listings: HashMap<String, Vec<ApiView>>,
    pub texts: HashMap<u64, String>,
    pub highlights: HashMap<u64, Vec<Highlight>>,
    pub failing_folder: Option<String>,
    pub hang_on_text: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_listing(mut self, folder: FolderId, views: Vec<ApiView>) -> Self {
        self.listings.insert(folder.as_str().to_string(), views);
        self
    }

    pub fn with_text(mut self, id: u64, text: &str) -> Self {
        self.texts.insert(id, text.to_string());
        self
    }

    pub fn with_highlights(mut self, id: u64, highlights: Vec<Highlight>) -> Self {
        self.highlights.insert(id, highlights);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl BookmarkSource for FakeSource {
    async fn list_folders(&self) -> Result<Vec<Folder>, SourceError> {
        self.log("list_folders".into());
        Ok(self.folders.clone())
    }

    async fn list_bookmarks(
        &self,
        folder: &FolderId,
        limit: usize,
    ) -> Result<Vec<ApiView>, SourceError> {
        self.log(format!("list_bookmarks {folder}"));
        if self.failing_folder.as_deref() == Some(folder.as_str()) {
            return Err(SourceError::Status {
                status: 500,
                message: "listing exploded".into(),
            });
        }
        let mut views = self.listings.get(folder.as_str()).cloned().unwrap_or_default();
        views.truncate(limit);
        Ok(views)
    }

    async fn get_text(&self, bookmark_id: u64) -> Result<String, SourceError> {
        self.log(format!("get_text {bookmark_id}"));
        if self.hang_on_text {
            std::future::pending::<()>().await;
        }
        self.texts
            .get(&bookmark_id)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                status: 404,
                message: "no text".into(),
            })
    }

    async fn list_highlights(&self, bookmark_id: u64) -> Result<Vec<Highlight>, SourceError> {
        self.log(format!("list_highlights {bookmark_id}"));
        Ok(self.highlights.get(&bookmark_id).cloned().unwrap_or_default())
    }
}

pub fn api(id: u64, url: &str, title: &str, time: i64) -> ApiView {
    ApiView {
        id,
        url: url.to_string(),
        title: title.to_string(),
        hash: format!("hash{id}"),
        time,
        ..ApiView::default()
    }
}

pub fn highlight(id: u64, bookmark_id: u64, text: &str) -> Highlight {
    Highlight {
        id,
        bookmark_id,
        text: text.to_string(),
        ..Highlight::default()
    }
}
