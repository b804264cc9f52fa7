mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use archiver_core::RecordSet;
use archiver_engine::{
    create_archive, reconcile_folders, ArchiveContext, ArchiveError, Folder, FolderId,
    JekyllWriter, JobQueue, QueueSummary, ReconcileError, ReconcileStats,
};
use chrono::FixedOffset;
use common::{api, FakeSource};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const EXPORT: &str = "URL,Title,Selection,Folder,Timestamp\n\
https://example.com/bookmark1234,Title for the bookmark,selection1234,unread,1288584076\n\
https://only-in-export.example,Export only,,Archive,1288584076\n";

fn write_export(temp: &TempDir) -> PathBuf {
    let path = temp.path().join("instapaper-export.csv");
    fs::write(&path, EXPORT).unwrap();
    path
}

fn source() -> FakeSource {
    FakeSource {
        folders: vec![Folder::new(FolderId::new("77"), "Reading", "reading")],
        ..FakeSource::default()
    }
    .with_listing(
        FolderId::unread(),
        vec![api(
            1234,
            "https://example.com/bookmark1234",
            "Title for the bookmark",
            1288584076,
        )],
    )
    .with_listing(
        FolderId::new("77"),
        vec![api(55, "https://only-in-api.example", "Api only", 1288584076)],
    )
    .with_text(1234, "<p>archived</p>")
}

#[tokio::test]
async fn reconcile_visits_user_folders_then_built_ins() {
    let source = source();
    let mut records = RecordSet::new();

    let stats = reconcile_folders(&source, &mut records, 10).await.unwrap();

    assert_eq!(
        source.calls(),
        vec![
            "list_folders",
            "list_bookmarks 77",
            "list_bookmarks unread",
            "list_bookmarks starred",
            "list_bookmarks archive",
        ]
    );
    assert_eq!(
        stats,
        ReconcileStats {
            folders: 4,
            listed: 2,
            enriched: 0,
            discovered: 2
        }
    );
    assert_eq!(
        records.get("https://only-in-api.example").unwrap().containing_folder(),
        "Reading"
    );
}

#[tokio::test]
async fn failing_listing_aborts_reconciliation() {
    let source = FakeSource {
        failing_folder: Some("starred".into()),
        ..source()
    };
    let mut records = RecordSet::new();

    let err = reconcile_folders(&source, &mut records, 10).await.unwrap_err();

    match err {
        ReconcileError::Listing { folder, .. } => assert_eq!(folder, "Starred"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!source.calls().contains(&"list_bookmarks archive".to_string()));
}

#[test]
fn end_to_end_archive_of_export_and_listings() {
    archiver_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let export = write_export(&temp);
    let site = temp.path().join("site");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ctx = ArchiveContext {
        source: Arc::new(source()),
        writer: Arc::new(JekyllWriter::new(&site, FixedOffset::west_opt(7 * 3600).unwrap())),
        runtime: runtime.handle().clone(),
        cancel: CancellationToken::new(),
    };
    let mut queue = JobQueue::new(2);
    queue.start().unwrap();

    let submitted = create_archive(&ctx, &queue, &export, 100).unwrap();
    let summary = queue.stop();

    assert_eq!(submitted, 3);
    assert_eq!(
        summary,
        QueueSummary {
            submitted: 3,
            succeeded: 3,
            failed: 0
        }
    );
    let post = fs::read_to_string(site.join("_posts/2010-10-31-1234.html")).unwrap();
    assert!(post.contains("archive_id: \"1234\""));
    assert!(post.contains("<p>archived</p>"));
    assert!(site.join("_data/55.json").exists());

    let export_only = fs::read_dir(site.join("_data"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("sha-"))
        .count();
    assert_eq!(export_only, 1);
}

#[test]
fn missing_export_fails_before_any_listing() {
    let temp = TempDir::new().unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let source = Arc::new(source());
    let ctx = ArchiveContext {
        source: source.clone(),
        writer: Arc::new(JekyllWriter::new(temp.path(), FixedOffset::east_opt(0).unwrap())),
        runtime: runtime.handle().clone(),
        cancel: CancellationToken::new(),
    };
    let mut queue = JobQueue::new(1);
    queue.start().unwrap();

    let err = create_archive(&ctx, &queue, &temp.path().join("missing.csv"), 100).unwrap_err();

    assert!(matches!(
        err,
        ArchiveError::Reconcile(ReconcileError::Export(_))
    ));
    assert!(source.calls().is_empty());
    assert_eq!(queue.stop().submitted, 0);
}

#[test]
fn cancelled_archive_submits_nothing() {
    let temp = TempDir::new().unwrap();
    let export = write_export(&temp);
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = ArchiveContext {
        source: Arc::new(source()),
        writer: Arc::new(JekyllWriter::new(temp.path(), FixedOffset::east_opt(0).unwrap())),
        runtime: runtime.handle().clone(),
        cancel,
    };
    let mut queue = JobQueue::new(1);
    queue.start().unwrap();

    assert_eq!(create_archive(&ctx, &queue, &export, 100).unwrap(), 0);
    assert_eq!(queue.stop(), QueueSummary::default());
}
