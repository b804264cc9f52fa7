use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

/// Archive an Instapaper account into a Jekyll site.
///
/// Flags left unset fall back to the `--config` file, then to the defaults shown.
#[derive(Parser, Debug, Clone)]
#[command(name = "instapaper-archiver", version)]
pub struct Cli {
    /// Account email address
    #[arg(long, env = "INSTAPAPER_EMAIL")]
    pub email: Option<String>,

    /// Account password; when absent it is read from --password-file
    #[arg(long, env = "INSTAPAPER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// File holding the password, `-` for stdin
    #[arg(long, default_value = "-")]
    pub password_file: PathBuf,

    /// Output directory [default: archive]
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// CSV export downloaded from the account page [default: instapaper-export.csv]
    #[arg(long)]
    pub export_csv_file: Option<PathBuf>,

    /// Parallel archival workers [default: available parallelism]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output format [default: jekyll]
    #[arg(long)]
    pub format: Option<String>,

    /// OAuth consumer key issued for the Full API
    #[arg(long, env = "INSTAPAPER_CLIENT_ID")]
    pub consumer_key: Option<String>,

    /// OAuth consumer secret issued for the Full API
    #[arg(long, env = "INSTAPAPER_CLIENT_SECRET", hide_env_values = true)]
    pub consumer_secret: Option<String>,

    /// Service base URL [default: https://www.instapaper.com]
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Bookmarks requested per folder listing [default: 100000]
    #[arg(long)]
    pub listing_limit: Option<usize>,

    /// Fixed UTC offset, in hours, used to date posts [default: host time zone]
    #[arg(long, allow_negative_numbers = true)]
    pub utc_offset_hours: Option<i32>,

    /// RON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,
}

/// The `--password` value if given, otherwise the trimmed contents of `password_file`.
pub fn resolve_password(password: Option<&str>, password_file: &Path) -> anyhow::Result<String> {
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }
    let password = if password_file == Path::new("-") {
        read_password(io::stdin().lock()).context("reading password from stdin")?
    } else {
        let file = File::open(password_file)
            .with_context(|| format!("unable to read password file {}", password_file.display()))?;
        read_password(file)
            .with_context(|| format!("unable to read password file {}", password_file.display()))?
    };
    if password.is_empty() {
        bail!("must supply password from stdin, via --password flag, or via --password-file flag");
    }
    Ok(password)
}

fn read_password(mut reader: impl Read) -> io::Result<String> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    Ok(raw.trim().to_string())
}
