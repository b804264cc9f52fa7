mod cli;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use archiver_engine::instapaper::{ClientSettings, Credentials, InstapaperClient};
use archiver_engine::{create_archive, ArchiveContext, JobQueue};
use archiver_logging::{archive_info, archive_warn, LevelFilter, LogDestination};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::cli::{resolve_password, Cli};
use crate::settings::{ArchiveSettings, RunConfig};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    archiver_logging::initialize(LogDestination::from_optional_file(cli.log_file.as_deref()), level);

    let file_settings = match &cli.config {
        Some(path) => ArchiveSettings::load(path)?,
        None => ArchiveSettings::default(),
    };
    let config = RunConfig::resolve(&cli, file_settings)?;
    let password = resolve_password(cli.password.as_deref(), &cli.password_file)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let client_settings = ClientSettings {
        base_url: config.api_base_url.clone(),
        ..ClientSettings::default()
    };
    let client = runtime
        .block_on(InstapaperClient::authenticate(
            client_settings,
            Credentials::new(&config.consumer_key, &config.consumer_secret),
            &config.email,
            &password,
        ))
        .context("error authenticating")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            archive_warn!("interrupted, finishing bookmarks already in progress");
            on_interrupt.cancel();
        }
    });

    let ctx = ArchiveContext {
        source: Arc::new(client),
        writer: config.format.writer(&config.directory, config.post_zone),
        runtime: runtime.handle().clone(),
        cancel,
    };
    let mut queue = JobQueue::new(config.workers);
    queue.start().context("starting workers")?;
    archive_info!(
        "archiving into {} with {} workers",
        config.directory.display(),
        queue.worker_count()
    );

    let submitted = create_archive(&ctx, &queue, &config.export_csv_file, config.listing_limit);
    let summary = queue.stop();
    submitted.context("error creating archive")?;

    archive_info!(
        "archived {} of {} bookmarks ({} failed)",
        summary.succeeded,
        summary.submitted,
        summary.failed
    );
    if summary.submitted > 0 && summary.succeeded == 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
