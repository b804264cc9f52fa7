//! JSON shapes returned by the Instapaper Full API.
//!
//! The service is loose about number encoding (`"time": "1288584076"` and
//! `"time": 1288584076` both occur, `starred` is `"0"`/`"1"`), so scalar fields
//! go through the lenient helpers below.

use archiver_core::{ApiView, Highlight};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{Folder, FolderId, SourceError};

#[derive(Debug, Deserialize)]
pub(crate) struct WireFolder {
    #[serde(deserialize_with = "lenient_string")]
    folder_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    slug: String,
}

impl From<WireFolder> for Folder {
    fn from(wire: WireFolder) -> Self {
        Folder::new(FolderId::new(wire.folder_id), wire.title, wire.slug)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBookmark {
    #[serde(rename = "bookmark_id", default, deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    hash: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    time: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    progress: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    progress_timestamp: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    starred: bool,
}

impl From<WireBookmark> for ApiView {
    fn from(wire: WireBookmark) -> Self {
        ApiView {
            hash: wire.hash,
            description: wire.description,
            id: wire.id,
            title: wire.title,
            url: wire.url,
            progress_timestamp: wire.progress_timestamp,
            time: wire.time,
            progress: wire.progress,
            starred: wire.starred,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireHighlight {
    #[serde(rename = "highlight_id", default, deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    bookmark_id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    note: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    time: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    position: i64,
}

impl From<WireHighlight> for Highlight {
    fn from(wire: WireHighlight) -> Self {
        Highlight {
            id: wire.id,
            bookmark_id: wire.bookmark_id,
            text: wire.text,
            note: wire.note,
            time: wire.time,
            position: wire.position,
        }
    }
}

pub(crate) fn parse_folders(body: &[u8]) -> Result<Vec<Folder>, SourceError> {
    let items: Vec<Value> = parse_json(body)?;
    items
        .into_iter()
        .filter(|item| is_type(item, "folder"))
        .map(|item| from_value::<WireFolder>(item).map(Folder::from))
        .collect()
}

/// `bookmarks/list` answers with `{"bookmarks": [...], ...}`; older deployments
/// send a flat array mixing `user`, `meta` and `bookmark` items.
pub(crate) fn parse_bookmark_list(body: &[u8]) -> Result<Vec<ApiView>, SourceError> {
    let items = match parse_json::<Value>(body)? {
        Value::Object(mut object) => match object.remove("bookmarks") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(SourceError::Decode(format!(
                    "bookmarks is not an array: {other}"
                )))
            }
        },
        Value::Array(items) => items.into_iter().filter(|i| is_type(i, "bookmark")).collect(),
        other => {
            return Err(SourceError::Decode(format!(
                "unexpected bookmark list: {other}"
            )))
        }
    };
    items
        .into_iter()
        .map(|item| from_value::<WireBookmark>(item).map(ApiView::from))
        .collect()
}

pub(crate) fn parse_highlights(body: &[u8]) -> Result<Vec<Highlight>, SourceError> {
    let items: Vec<Value> = parse_json(body)?;
    items
        .into_iter()
        .filter(|item| is_type(item, "highlight"))
        .map(|item| from_value::<WireHighlight>(item).map(Highlight::from))
        .collect()
}

/// Message from an `[{"type":"error","error_code":..,"message":..}]` body, if that is what it is.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = match value {
        Value::Array(items) => items.into_iter().find(|i| is_type(i, "error"))?,
        object @ Value::Object(_) => object,
        _ => return None,
    };
    let message = error.get("message")?.as_str()?.to_string();
    match error.get("error_code").and_then(Value::as_i64) {
        Some(code) => Some(format!("{message} (code {code})")),
        None => Some(message),
    }
}

/// Items without a `type` field are accepted as whatever the caller expects.
fn is_type(item: &Value, expected: &str) -> bool {
    match item.get("type").and_then(Value::as_str) {
        Some(kind) => kind == expected,
        None => true,
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, SourceError> {
    serde_json::from_slice(body).map_err(|err| SourceError::Decode(err.to_string()))
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SourceError> {
    serde_json::from_value(value).map_err(|err| SourceError::Decode(err.to_string()))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default()
        }
        _ => 0,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    lenient_i64(deserializer).map(|n| u64::try_from(n).unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bookmark_list_object_form_is_parsed_leniently() {
        let body = br#"{
            "user": {"type": "user", "user_id": 1},
            "bookmarks": [
                {"type": "bookmark", "bookmark_id": 1234, "url": "https://example.com/a",
                 "title": "A", "description": null, "hash": "hash1234",
                 "time": "1288584076", "progress": "0.5", "progress_timestamp": 5678,
                 "starred": "1"}
            ],
            "highlights": []
        }"#;
        let views = parse_bookmark_list(body).unwrap();
        assert_eq!(
            views,
            vec![ApiView {
                hash: "hash1234".into(),
                description: String::new(),
                id: 1234,
                title: "A".into(),
                url: "https://example.com/a".into(),
                progress_timestamp: 5678,
                time: 1288584076,
                progress: 0.5,
                starred: true,
            }]
        );
    }

    #[test]
    fn bookmark_list_array_form_keeps_only_bookmarks() {
        let body = br#"[
            {"type": "meta"},
            {"type": "user", "user_id": 1},
            {"type": "bookmark", "bookmark_id": 7, "url": "https://b", "starred": "0", "time": 3}
        ]"#;
        let views = parse_bookmark_list(body).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, 7);
        assert!(!views[0].starred);
    }

    #[test]
    fn folders_with_numeric_ids_become_strings() {
        let body = br#"[{"type": "folder", "folder_id": 42, "title": "Reading", "slug": "reading"}]"#;
        let folders = parse_folders(body).unwrap();
        assert_eq!(
            folders,
            vec![Folder::new(FolderId::new("42"), "Reading", "reading")]
        );
    }

    #[test]
    fn error_bodies_yield_message_and_code() {
        let body = br#"[{"type": "error", "error_code": 1241, "message": "Invalid bookmark"}]"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Invalid bookmark (code 1241)")
        );
        assert_eq!(error_message(b"<html>oops</html>"), None);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_highlights(b"not json"),
            Err(SourceError::Decode(_))
        ));
    }
}
