//! Radio schedule grabber
//!
//! Scrapes the per-date schedule pages, downloads every listed broadcast and
//! tags the resulting MP3 with ID3v2.4 frames.

use std::path::{Path, PathBuf};

pub mod api;
pub mod download;
pub mod metadata;
pub mod schedule;


use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use studio_proto::dates;
use thiserror::Error;

/// One schedule entry that carries a stream URL
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastDescriptor {
    pub stream_title: String,
    pub broadcast_title: String,
    pub broadcast_page_url: String,
    pub stream_url: String,
    pub description: String,
    pub date: NaiveDate,
    /// Zero-padded hour, e.g. "09"
    pub start_time: String,
    pub end_time: String,
}

impl BroadcastDescriptor {
    /// `{yyyyMMdd}_{start}-{end} {stream title}.mp3`, filesystem-safe
    pub fn file_name(&self) -> String {
        let prefix = format!(
            "{}_{}-{}",
            dates::file_prefix(self.date),
            self.start_time,
            self.end_time
        );
        format!("{}.mp3", safe_filename(&format!("{} {}", prefix, self.stream_title)))
    }

    pub fn file_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.file_name())
    }

    /// Broadcast date at the start hour; midnight when the hour does not parse.
    pub fn release_time(&self) -> NaiveDateTime {
        let hour = self.start_time.parse::<u32>().unwrap_or(0);
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        self.date.and_time(time)
    }
}

/// Replace characters that are illegal in file names with `_`
pub fn safe_filename(name: &str) -> String {
    name.replace([':', '\\', '/', '*', '"', '?', '|', '<', '>'], "_")
}

/// Failure of a single network or file step. Never fatal for the run.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("{url} returned status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GrabError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
