//! Pluggable persistence of archived records.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use archiver_core::Record;
use chrono::{FixedOffset, Local};

use crate::PersistError;

mod frontmatter;
mod jekyll;

pub use frontmatter::{build_post_document, escape_double_quotes};
pub use jekyll::JekyllWriter;

/// Turns a [`Record`] into on-disk artifacts.
///
/// `write` must be idempotent: artifacts that already exist are left alone and
/// count as success.
pub trait OutputWriter: Send + Sync {
    /// One-time setup such as creating the directory tree. Safe to repeat.
    fn preflight(&self) -> Result<(), WriteError>;

    fn write(&self, record: &Record) -> Result<WriteReport, WriteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Metadata,
    Post,
    Mirror,
    Highlights,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Artifact::Metadata => "metadata",
            Artifact::Post => "post",
            Artifact::Mirror => "mirror",
            Artifact::Highlights => "highlights",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Written,
    /// Already present from an earlier run.
    Skipped,
    /// Nothing to write, e.g. no full text or no highlights.
    NotApplicable,
}

/// What happened to each artifact of one successful `write`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    entries: Vec<(Artifact, ArtifactStatus)>,
}

impl WriteReport {
    pub fn record(&mut self, artifact: Artifact, status: ArtifactStatus) {
        self.entries.push((artifact, status));
    }

    pub fn status(&self, artifact: Artifact) -> Option<ArtifactStatus> {
        self.entries
            .iter()
            .find(|(a, _)| *a == artifact)
            .map(|(_, status)| *status)
    }

    pub fn count(&self, status: ArtifactStatus) -> usize {
        self.entries.iter().filter(|(_, s)| *s == status).count()
    }

}

#[derive(Debug, thiserror::Error)]
#[error("{artifact} ({}): {source}", .path.display())]
pub struct ArtifactFailure {
    pub artifact: Artifact,
    pub path: PathBuf,
    #[source]
    pub source: PersistError,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("preflight failed: {0}")]
    Preflight(#[from] PersistError),
    #[error("{} artifact(s) failed: {}", .0.len(), join_failures(.0))]
    Artifacts(Vec<ArtifactFailure>),
}

impl WriteError {
    pub fn failures(&self) -> &[ArtifactFailure] {
        match self {
            WriteError::Artifacts(failures) => failures,
            WriteError::Preflight(_) => &[],
        }
    }
}

fn join_failures(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Zone that post dates are computed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostZone {
    /// The host zone, including its daylight saving rules for each date.
    #[default]
    Local,
    Fixed(FixedOffset),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Jekyll,
}

impl OutputFormat {
    /// Writer rooted at `root`, filing posts by date in `zone`.
    pub fn writer(self, root: &Path, zone: PostZone) -> Arc<dyn OutputWriter> {
        match (self, zone) {
            (OutputFormat::Jekyll, PostZone::Local) => Arc::new(JekyllWriter::new(root, Local)),
            (OutputFormat::Jekyll, PostZone::Fixed(offset)) => {
                Arc::new(JekyllWriter::new(root, offset))
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jekyll => f.write_str("jekyll"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported output format: {0:?}")]
pub struct FormatError(pub String);

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("jekyll") {
            Ok(OutputFormat::Jekyll)
        } else {
            Err(FormatError(value.to_string()))
        }
    }
}
