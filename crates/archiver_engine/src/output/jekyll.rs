use std::path::PathBuf;

use archiver_core::Record;
use archiver_logging::record_error;
use chrono::TimeZone;

use super::frontmatter::build_post_document;
use super::{Artifact, ArtifactFailure, ArtifactStatus, OutputWriter, WriteError, WriteReport};
use crate::persist::{ensure_output_dir, write_new, WriteOutcome};
use crate::PersistError;

const DATA_DIR: &str = "_data";
const POSTS_DIR: &str = "_posts";
const MIRROR_DIR: &str = "_mirror";

/// Lays records out as a Jekyll site:
///
/// ```text
/// <root>/_data/<id>.json
/// <root>/_data/<id>.highlights.json
/// <root>/_posts/<YYYY-MM-DD>-<id>.html
/// <root>/_mirror/<id>.html
/// ```
///
/// Post dates are computed in `tz` with the zone's rules for that instant, so a
/// record keeps its post filename no matter when the archive is run.
#[derive(Debug, Clone)]
pub struct JekyllWriter<Tz> {
    root: PathBuf,
    tz: Tz,
}

impl<Tz: TimeZone> JekyllWriter<Tz> {
    pub fn new(root: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            root: root.into(),
            tz,
        }
    }

    pub fn metadata_path(&self, archive_id: &str) -> PathBuf {
        self.root.join(DATA_DIR).join(format!("{archive_id}.json"))
    }

    pub fn highlights_path(&self, archive_id: &str) -> PathBuf {
        self.root
            .join(DATA_DIR)
            .join(format!("{archive_id}.highlights.json"))
    }

    pub fn post_path(&self, record: &Record) -> PathBuf {
        let date = record.archive_date(&self.tz);
        self.root
            .join(POSTS_DIR)
            .join(format!("{date}-{}.html", record.id()))
    }

    pub fn mirror_path(&self, archive_id: &str) -> PathBuf {
        self.root.join(MIRROR_DIR).join(format!("{archive_id}.html"))
    }
}

impl<Tz> OutputWriter for JekyllWriter<Tz>
where
    Tz: TimeZone + Send + Sync,
{
    fn preflight(&self) -> Result<(), WriteError> {
        for dir in [DATA_DIR, POSTS_DIR, MIRROR_DIR] {
            ensure_output_dir(&self.root.join(dir))?;
        }
        Ok(())
    }

    fn write(&self, record: &Record) -> Result<WriteReport, WriteError> {
        let id = record.id().to_string();
        let attempts = [
            persist(Artifact::Metadata, self.metadata_path(&id), || {
                Ok(serde_json::to_vec_pretty(record)?)
            }),
            persist(Artifact::Post, self.post_path(record), || {
                let doc = build_post_document(
                    &id,
                    record.title().as_str(),
                    record.containing_folder(),
                    record.full_text(),
                );
                Ok(doc.into_bytes())
            }),
            if record.full_text().is_empty() {
                Ok((Artifact::Mirror, ArtifactStatus::NotApplicable))
            } else {
                persist(Artifact::Mirror, self.mirror_path(&id), || {
                    Ok(record.full_text().as_bytes().to_vec())
                })
            },
            if record.highlights().is_empty() {
                Ok((Artifact::Highlights, ArtifactStatus::NotApplicable))
            } else {
                persist(Artifact::Highlights, self.highlights_path(&id), || {
                    Ok(serde_json::to_vec_pretty(record.highlights())?)
                })
            },
        ];

        let mut report = WriteReport::default();
        let mut failures = Vec::new();
        for attempt in attempts {
            match attempt {
                Ok((artifact, status)) => report.record(artifact, status),
                Err(failure) => {
                    record_error!(id, "error writing {}: {}", failure.artifact, failure.source);
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(WriteError::Artifacts(failures))
        }
    }
}

/// Renders only when the target is missing, so a repeated write costs one existence check.
fn persist(
    artifact: Artifact,
    path: PathBuf,
    render: impl FnOnce() -> Result<Vec<u8>, PersistError>,
) -> Result<(Artifact, ArtifactStatus), ArtifactFailure> {
    if path.exists() {
        return Ok((artifact, ArtifactStatus::Skipped));
    }
    let outcome = render().and_then(|content| write_new(&path, &content));
    match outcome {
        Ok(WriteOutcome::Written) => Ok((artifact, ArtifactStatus::Written)),
        Ok(WriteOutcome::Skipped) => Ok((artifact, ArtifactStatus::Skipped)),
        Err(source) => Err(ArtifactFailure {
            artifact,
            path,
            source,
        }),
    }
}
