//! Schedule page parsing

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{info, warn};

use crate::grabber::{api, BroadcastDescriptor, GrabError};

const ERROR_MARKER: &str = ".b-schedule__error";
const LIST_ITEM: &str = ".b-schedule__list-item";
const ITEM_TIME: &str = ".b-schedule__list-item__inner .b-schedule__list-item__time";
const ITEM_INFO: &str = ".b-schedule__list-item__inner .b-schedule__list-item__info";
const ITEM_TITLE: &str = ".b-schedule__list-item__header .b-schedule__list-item__link";
const ITEM_LISTEN: &str = ".b-schedule__list-item__header .b-schedule__list-item__listen";
const ITEM_DESCRIPTION: &str = ".b-schedule__list-item__description";
const STREAM_URL_ATTR: &str = "data-url";

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("invalid selector {0:?}")]
    Selector(&'static str),
    #[error("schedule entry has no {0:?} element")]
    MissingElement(&'static str),
    #[error("malformed time range {0:?}")]
    MalformedTime(String),
}

/// Result of scraping one schedule page
#[derive(Debug, Default)]
pub struct ParsedSchedule {
    pub descriptors: Vec<BroadcastDescriptor>,
    /// Entries published without a stream URL
    pub missing_stream: usize,
    /// Set when an unexpected page shape stopped parsing early
    pub abandoned: Option<ScheduleError>,
}

struct Selectors {
    error_marker: Selector,
    list_item: Selector,
    time: Selector,
    info: Selector,
    title: Selector,
    listen: Selector,
    description: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ScheduleError> {
        Ok(Self {
            error_marker: selector(ERROR_MARKER)?,
            list_item: selector(LIST_ITEM)?,
            time: selector(ITEM_TIME)?,
            info: selector(ITEM_INFO)?,
            title: selector(ITEM_TITLE)?,
            listen: selector(ITEM_LISTEN)?,
            description: selector(ITEM_DESCRIPTION)?,
        })
    }
}

fn selector(css: &'static str) -> Result<Selector, ScheduleError> {
    Selector::parse(css).map_err(|_| ScheduleError::Selector(css))
}

/// Fetch and parse the schedule for `date`.
///
/// Only network failures are errors; page-shape problems are logged and
/// reported through [`ParsedSchedule`].
pub async fn fetch_schedule(
    client: &reqwest::Client,
    base_url: &str,
    date: NaiveDate,
    broadcast_title: &str,
) -> Result<ParsedSchedule, GrabError> {
    let url = api::schedule_url(base_url, date);
    let html = api::fetch_schedule_html(client, &url).await?;
    let parsed = parse_schedule(&html, &url, date, broadcast_title);

    if let Some(reason) = &parsed.abandoned {
        warn!("Abandoned schedule page {}: {}", url, reason);
    }

    Ok(parsed)
}

/// Parse a schedule page into broadcast descriptors
pub fn parse_schedule(
    html: &str,
    page_url: &str,
    date: NaiveDate,
    broadcast_title: &str,
) -> ParsedSchedule {
    let mut parsed = ParsedSchedule::default();

    let selectors = match Selectors::new() {
        Ok(s) => s,
        Err(e) => {
            parsed.abandoned = Some(e);
            return parsed;
        }
    };

    let document = Html::parse_document(html);

    let has_error_marker = document
        .select(&selectors.error_marker)
        .any(|el| !element_text(el).is_empty());
    if has_error_marker {
        return parsed;
    }

    for item in document.select(&selectors.list_item) {
        match parse_entry(item, &selectors, page_url, date, broadcast_title) {
            Ok(Some(descriptor)) => parsed.descriptors.push(descriptor),
            Ok(None) => {
                info!("Schedule entry without stream URL on {}", page_url);
                parsed.missing_stream += 1;
            }
            Err(e) => {
                parsed.abandoned = Some(e);
                break;
            }
        }
    }

    parsed
}

fn parse_entry(
    item: ElementRef<'_>,
    selectors: &Selectors,
    page_url: &str,
    date: NaiveDate,
    broadcast_title: &str,
) -> Result<Option<BroadcastDescriptor>, ScheduleError> {
    let time = select_text(item, &selectors.time);
    let (start_time, end_time) = parse_time_range(&time)?;

    let info = item
        .select(&selectors.info)
        .next()
        .ok_or(ScheduleError::MissingElement(ITEM_INFO))?;

    let title = select_text(info, &selectors.title);
    let stream_url = info
        .select(&selectors.listen)
        .find_map(|el| el.value().attr(STREAM_URL_ATTR))
        .map(str::trim)
        .unwrap_or_default();
    let description = select_text(info, &selectors.description);

    if stream_url.is_empty() {
        return Ok(None);
    }

    Ok(Some(BroadcastDescriptor {
        stream_title: title,
        broadcast_title: broadcast_title.to_string(),
        broadcast_page_url: page_url.to_string(),
        stream_url: stream_url.to_string(),
        description,
        date,
        start_time,
        end_time,
    }))
}

/// Parse "HH:MM - HH:MM" into start and end hour strings
pub fn parse_time_range(time: &str) -> Result<(String, String), ScheduleError> {
    let malformed = || ScheduleError::MalformedTime(time.to_string());

    let (start, end) = time.split_once('-').ok_or_else(malformed)?;
    let start = leading_hour(start).ok_or_else(malformed)?;
    let end = leading_hour(end).ok_or_else(malformed)?;

    Ok((start, end))
}

fn leading_hour(part: &str) -> Option<String> {
    let hour: String = part.trim().chars().take(2).collect();
    if hour.chars().count() == 2 && hour.chars().all(|c| c.is_ascii_digit()) {
        Some(hour)
    } else {
        None
    }
}

/// Whitespace-normalised text of all matches, space separated
fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    #[test]
    fn test_parse_time_range() {
        assert_eq!(
            parse_time_range("09:00-11:00").unwrap(),
            ("09".to_string(), "11".to_string())
        );
        assert_eq!(
            parse_time_range(" 22:00 - 00:00 ").unwrap(),
            ("22".to_string(), "00".to_string())
        );
    }

    #[test]
    fn test_parse_time_range_rejects_malformed() {
        assert!(matches!(
            parse_time_range(""),
            Err(ScheduleError::MalformedTime(_))
        ));
        assert!(parse_time_range("09:00").is_err());
        assert!(parse_time_range("9:00-11:00").is_err());
        assert!(parse_time_range("09:00-").is_err());
    }

    #[test]
    fn test_selectors_compile() {
        assert!(Selectors::new().is_ok());
    }
}
