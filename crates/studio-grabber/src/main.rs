mod driver;
mod grabber;

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use studio_proto::config::Config;
use studio_proto::dates::{self, DateSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::driver::RunContext;

/// Downloads and tags every archived broadcast listed on the schedule site.
///
/// Dates are walked from the newest one back to the oldest; a date is skipped
/// when the output directory already holds a file for it.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory grabbed broadcasts are written to
    #[arg(long, short, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Oldest date to scan, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    oldest: Option<NaiveDate>,

    /// Newest date to scan, YYYY-MM-DD (defaults to the last Saturday)
    #[arg(long, value_name = "DATE")]
    newest: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = studio_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("grabber.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,studio_grabber=debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(log_filter))
        .init();

    eprintln!("studio-grab log: {}", log_path.display());

    let config_path = args.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;
    tracing::info!("Config loaded from: {:?}", config_path);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.paths.output_dir.clone());
    std::fs::create_dir_all(&output_dir)?;

    let newest = args
        .newest
        .unwrap_or_else(|| dates::last_saturday_on_or_before(Local::now().date_naive()));
    let oldest = args.oldest.unwrap_or(config.site.oldest_date);
    let span = DateSpan::new(newest, oldest);

    let mut ctx = RunContext::new(reqwest::Client::new(), output_dir, config.site, config.tags);
    ctx.load_cover_art().await;

    let summary = driver::run(&ctx, span).await;

    println!(
        "Done: {} dates scanned ({} already grabbed), {} broadcasts saved, {} downloads failed, {} untagged",
        summary.dates_scanned,
        summary.dates_skipped,
        summary.tags_written,
        summary.downloads_failed,
        summary.tag_failures
    );

    Ok(())
}
