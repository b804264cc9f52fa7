use archiver_core::{read_export, ApiView, MergeOutcome, RecordSet, RecordId};
use chrono::FixedOffset;
use pretty_assertions::assert_eq;

fn api(id: u64, url: &str, title: &str) -> ApiView {
    ApiView {
        id,
        url: url.to_string(),
        title: title.to_string(),
        hash: format!("hash{id}"),
        ..ApiView::default()
    }
}

fn export_set(csv: &str) -> RecordSet {
    RecordSet::from_export(read_export(csv.as_bytes()).unwrap())
}

#[test]
fn fan_in_keeps_every_url_once() {
    let mut set = export_set(
        "URL,Title,Selection,Folder,Timestamp\n\
         https://a.example,A,,unread,1\n\
         https://b.example,B,,unread,2\n\
         https://c.example,C,,unread,3\n",
    );

    let outcome = set.merge_folder(
        "Unread",
        vec![
            api(2, "https://b.example", "B from api"),
            api(4, "https://d.example", "D from api"),
        ],
    );

    assert_eq!(
        outcome,
        MergeOutcome {
            enriched: 1,
            discovered: 1
        }
    );
    assert_eq!(
        set.urls().collect::<Vec<_>>(),
        vec![
            "https://a.example",
            "https://b.example",
            "https://c.example",
            "https://d.example"
        ]
    );

    let b = set.get("https://b.example").unwrap();
    assert!(b.api_view().is_some());
    assert!(b.export_view().is_some());

    let d = set.get("https://d.example").unwrap();
    assert!(d.api_view().is_some());
    assert!(d.export_view().is_none());
    assert_eq!(d.containing_folder(), "Unread");

    let a = set.get("https://a.example").unwrap();
    assert!(a.api_view().is_none());
    assert_eq!(a.containing_folder(), "unread");
}

#[test]
fn api_values_take_precedence_once_merged() {
    let mut set = export_set("https://b.example,Export title,,unread,1\n");
    set.merge_folder("Unread", vec![api(2, "https://b.example", "Api title")]);

    let b = set.get("https://b.example").unwrap();
    assert_eq!(b.title().as_str(), "Api title");
    assert_eq!(b.url().as_str(), "https://b.example");
    assert_eq!(b.id(), RecordId::Api(2));
}

#[test]
fn last_folder_wins_for_duplicate_listings() {
    let mut set = RecordSet::new();
    set.merge_folder("Unread", vec![api(7, "https://x.example", "first")]);
    set.merge_folder("Starred", vec![api(7, "https://x.example", "second")]);

    assert_eq!(set.len(), 1);
    let x = set.get("https://x.example").unwrap();
    assert_eq!(x.title().as_str(), "second");
    assert_eq!(x.containing_folder(), "Starred");
}

#[test]
fn urls_differing_by_trailing_slash_stay_distinct() {
    let mut set = export_set("https://x.example/page,Page,,unread,1\n");
    set.merge_folder("Unread", vec![api(3, "https://x.example/page/", "Page")]);

    assert_eq!(set.len(), 2);
    assert!(set.get("https://x.example/page").unwrap().api_view().is_none());
}

#[test]
fn bookmark_scenario_matches_expected_identity() {
    let mut set = export_set(
        "https://example.com/bookmark1234,Title for the bookmark,selection1234,unread,1288584076\n",
    );
    set.merge_folder(
        "Unread",
        vec![ApiView {
            id: 1234,
            hash: "hash1234".into(),
            url: "https://example.com/bookmark1234".into(),
            title: "Title for the bookmark".into(),
            time: 1288584076,
            ..ApiView::default()
        }],
    );

    let record = set.into_iter().next().unwrap();
    let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
    assert_eq!(record.id().to_string(), "1234");
    assert_eq!(record.hash().as_str(), "hash1234");
    assert_eq!(record.archive_date(&pacific).to_string(), "2010-10-31");
}
