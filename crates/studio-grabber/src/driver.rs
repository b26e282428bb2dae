//! Archive walk: one schedule page per date, newest first.
//!
//! Every failure is contained to the smallest unit it affects (an entry, a
//! broadcast, a date) and the walk always runs to the oldest date.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio_proto::config::{SiteConfig, TagsConfig};
use studio_proto::dates::{self, DateSpan};
use tracing::{debug, error, info, warn};

use crate::grabber::metadata::{self, TagModel};
use crate::grabber::{api, download, schedule, BroadcastDescriptor};

/// Run-scoped state shared by every step of a grab
pub struct RunContext {
    pub client: reqwest::Client,
    pub output_dir: PathBuf,
    pub site: SiteConfig,
    pub tags: TagsConfig,
    /// Fetched once before the walk; read-only afterwards
    pub cover_art: Option<Arc<[u8]>>,
}

impl RunContext {
    pub fn new(client: reqwest::Client, output_dir: PathBuf, site: SiteConfig, tags: TagsConfig) -> Self {
        Self {
            client,
            output_dir,
            site,
            tags,
            cover_art: None,
        }
    }

    /// Fetch the shared cover art. A failure leaves the run without artwork.
    pub async fn load_cover_art(&mut self) {
        match api::fetch_cover_art(&self.client, &self.site.cover_art_url).await {
            Ok(data) => self.cover_art = Some(Arc::from(data)),
            Err(e) => {
                warn!("Cover art unavailable, tagging without artwork: {}", e);
                self.cover_art = None;
            }
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dates_scanned: usize,
    pub dates_skipped: usize,
    pub schedule_failures: usize,
    pub broadcasts_found: usize,
    pub downloads_failed: usize,
    pub tags_written: usize,
    pub tag_failures: usize,
}

/// What happened to a single broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    DownloadFailed,
    /// Audio is on disk but its tag could not be written
    Untagged(PathBuf),
    Saved(PathBuf),
}

/// Integer percentage that only reports when it changes
#[derive(Debug)]
pub struct Progress {
    total_days: i64,
    last_percent: u32,
}

impl Progress {
    pub fn new(total_days: i64) -> Self {
        Self {
            total_days,
            last_percent: 0,
        }
    }

    fn percent(&self, index: usize) -> u32 {
        if self.total_days <= 0 {
            return 100;
        }
        (index as f64 / (self.total_days as f64 / 100.0)).floor() as u32
    }

    /// Returns the new percentage when it differs from the last one reported
    pub fn advance(&mut self, index: usize) -> Option<u32> {
        let percent = self.percent(index);
        if percent == self.last_percent {
            return None;
        }
        self.last_percent = percent;
        Some(percent)
    }
}

/// True when any file in `output_dir` carries `date` as `yyyyMMdd`.
///
/// Unreadable or missing directories count as "not yet grabbed".
pub fn already_grabbed(output_dir: &Path, date: NaiveDate) -> bool {
    let prefix = dates::file_prefix(date);

    let entries = match std::fs::read_dir(output_dir) {
        Ok(e) => e,
        Err(e) => {
            debug!("Cannot read {}: {}", output_dir.display(), e);
            return false;
        }
    };

    entries.flatten().any(|entry| {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        !is_dir && entry.file_name().to_string_lossy().contains(&prefix)
    })
}

/// Walk `span` newest-first, grabbing every date not yet on disk
pub async fn run(ctx: &RunContext, span: DateSpan) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut progress = Progress::new(span.day_count());

    info!(
        "Scanning {} back to {} into {}",
        span.newest,
        span.oldest,
        ctx.output_dir.display()
    );

    for (index, date) in span.iter().enumerate() {
        if let Some(percent) = progress.advance(index) {
            println!("Progress: {}% ({})", percent, date);
        }

        summary.dates_scanned += 1;

        if already_grabbed(&ctx.output_dir, date) {
            summary.dates_skipped += 1;
            continue;
        }

        grab_date(ctx, date, &mut summary).await;
    }

    info!("Run finished: {:?}", summary);
    summary
}

async fn grab_date(ctx: &RunContext, date: NaiveDate, summary: &mut RunSummary) {
    let parsed = match schedule::fetch_schedule(
        &ctx.client,
        &ctx.site.schedule_base_url,
        date,
        &ctx.site.broadcast_title,
    )
    .await
    {
        Ok(p) => p,
        Err(e) => {
            warn!("Schedule for {} unavailable: {}", date, e);
            summary.schedule_failures += 1;
            return;
        }
    };

    if parsed.abandoned.is_some() {
        summary.schedule_failures += 1;
    }

    for broadcast in &parsed.descriptors {
        summary.broadcasts_found += 1;

        match grab_broadcast(ctx, broadcast).await {
            BroadcastOutcome::DownloadFailed => summary.downloads_failed += 1,
            BroadcastOutcome::Untagged(_) => summary.tag_failures += 1,
            BroadcastOutcome::Saved(_) => summary.tags_written += 1,
        }
    }
}

/// Download one broadcast and, only if that succeeds, tag it
pub async fn grab_broadcast(ctx: &RunContext, broadcast: &BroadcastDescriptor) -> BroadcastOutcome {
    let path = broadcast.file_path(&ctx.output_dir);
    info!("New broadcast found: {:?}", broadcast);

    if let Err(e) = download::download_broadcast(&ctx.client, &broadcast.stream_url, &path).await {
        error!("Failed to fetch audio for {}: {}", broadcast.stream_title, e);
        return BroadcastOutcome::DownloadFailed;
    }

    let model = TagModel::for_broadcast(broadcast, &ctx.tags, ctx.cover_art.clone());
    match metadata::write_tags(&path, &model).await {
        Ok(_) => {
            info!("File saved at {}", path.display());
            BroadcastOutcome::Saved(path)
        }
        Err(e) => {
            error!(
                "Failed to write tags to {} for {:?}: {:#}",
                path.display(),
                model,
                e
            );
            BroadcastOutcome::Untagged(path)
        }
    }
}
