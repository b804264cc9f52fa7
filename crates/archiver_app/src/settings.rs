use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use archiver_engine::instapaper::DEFAULT_BASE_URL;
use archiver_engine::{OutputFormat, PostZone, DEFAULT_LISTING_LIMIT};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

const DEFAULT_DIRECTORY: &str = "archive";
const DEFAULT_EXPORT_CSV: &str = "instapaper-export.csv";

/// Optional RON settings file; every field may be omitted.
///
/// ```ron
/// (
///     directory: Some("site"),
///     workers: Some(4),
///     utc_offset_hours: Some(-7),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    pub directory: Option<PathBuf>,
    pub export_csv_file: Option<PathBuf>,
    pub workers: Option<usize>,
    pub format: Option<String>,
    pub email: Option<String>,
    pub listing_limit: Option<usize>,
    pub utc_offset_hours: Option<i32>,
    pub api_base_url: Option<String>,
}

impl ArchiveSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("parsing settings file {}", path.display()))
    }
}

/// Fully resolved run parameters: CLI flag, else settings file, else default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub email: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub directory: PathBuf,
    pub export_csv_file: PathBuf,
    /// 0 lets the queue pick the available parallelism.
    pub workers: usize,
    pub format: OutputFormat,
    pub api_base_url: String,
    pub listing_limit: usize,
    /// Host zone unless a UTC offset was configured.
    pub post_zone: PostZone,
}

impl RunConfig {
    pub fn resolve(cli: &Cli, file: ArchiveSettings) -> anyhow::Result<Self> {
        let email = cli
            .email
            .clone()
            .or(file.email)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| anyhow!("missing account email: pass --email or set INSTAPAPER_EMAIL"))?;
        let consumer_key = cli.consumer_key.clone().unwrap_or_default();
        let consumer_secret = cli.consumer_secret.clone().unwrap_or_default();
        if consumer_key.is_empty() || consumer_secret.is_empty() {
            return Err(anyhow!(
                "missing API consumer credentials: set INSTAPAPER_CLIENT_ID and INSTAPAPER_CLIENT_SECRET"
            ));
        }

        let format = match cli.format.clone().or(file.format) {
            Some(name) => name.parse::<OutputFormat>()?,
            None => OutputFormat::default(),
        };
        let post_zone = match cli.utc_offset_hours.or(file.utc_offset_hours) {
            Some(hours) => hours
                .checked_mul(3600)
                .and_then(FixedOffset::east_opt)
                .map(PostZone::Fixed)
                .ok_or_else(|| anyhow!("utc offset out of range: {hours} hours"))?,
            None => PostZone::Local,
        };

        Ok(Self {
            email,
            consumer_key,
            consumer_secret,
            directory: cli
                .directory
                .clone()
                .or(file.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY)),
            export_csv_file: cli
                .export_csv_file
                .clone()
                .or(file.export_csv_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_CSV)),
            workers: cli.workers.or(file.workers).unwrap_or(0),
            format,
            api_base_url: cli
                .api_base_url
                .clone()
                .or(file.api_base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            listing_limit: cli
                .listing_limit
                .or(file.listing_limit)
                .unwrap_or(DEFAULT_LISTING_LIMIT),
            post_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "instapaper-archiver",
            "--email",
            "reader@example.com",
            "--consumer-key",
            "ck",
            "--consumer-secret",
            "cs",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let config = RunConfig::resolve(&cli(&[]), ArchiveSettings::default()).unwrap();
        assert_eq!(config.directory, PathBuf::from("archive"));
        assert_eq!(config.export_csv_file, PathBuf::from("instapaper-export.csv"));
        assert_eq!(config.workers, 0);
        assert_eq!(config.format, OutputFormat::Jekyll);
        assert_eq!(config.api_base_url, "https://www.instapaper.com");
        assert_eq!(config.listing_limit, 100_000);
        assert_eq!(config.post_zone, PostZone::Local);
    }

    #[test]
    fn flags_beat_file_and_file_beats_defaults() {
        let file = ArchiveSettings {
            directory: Some("from-file".into()),
            workers: Some(3),
            utc_offset_hours: Some(2),
            ..ArchiveSettings::default()
        };
        let config = RunConfig::resolve(&cli(&["--directory", "from-flag"]), file).unwrap();
        assert_eq!(config.directory, PathBuf::from("from-flag"));
        assert_eq!(config.workers, 3);
        assert_eq!(
            config.post_zone,
            PostZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap())
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = RunConfig::resolve(&cli(&["--format", "hugo"]), ArchiveSettings::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported output format: \"hugo\"");
    }

    #[test]
    fn absurd_offset_is_rejected() {
        let result = RunConfig::resolve(&cli(&["--utc-offset-hours", "30"]), ArchiveSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn offset_flag_overrides_host_zone() {
        let config =
            RunConfig::resolve(&cli(&["--utc-offset-hours", "-8"]), ArchiveSettings::default())
                .unwrap();
        assert_eq!(
            config.post_zone,
            PostZone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap())
        );
    }

    #[test]
    fn settings_file_round_trips_through_ron() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("archiver.ron");
        fs::write(
            &path,
            "(directory: Some(\"site\"), workers: Some(4), format: Some(\"Jekyll\"))",
        )
        .unwrap();

        let settings = ArchiveSettings::load(&path).unwrap();
        assert_eq!(
            settings,
            ArchiveSettings {
                directory: Some("site".into()),
                workers: Some(4),
                format: Some("Jekyll".into()),
                ..ArchiveSettings::default()
            }
        );
    }

    #[test]
    fn malformed_settings_name_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(workers: \"many\")").unwrap();
        let err = ArchiveSettings::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
