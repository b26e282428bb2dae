//! Schedule site HTTP client

use chrono::NaiveDate;
use studio_proto::dates;
use tracing::debug;

use crate::grabber::GrabError;

/// Schedule page URL for `date`: `{base}/{dd-MM-yyyy}`
pub fn schedule_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        dates::schedule_path_segment(date)
    )
}

/// Fetch a schedule page
pub async fn fetch_schedule_html(client: &reqwest::Client, url: &str) -> Result<String, GrabError> {
    debug!("Fetching schedule page {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GrabError::transport(url, e))?;

    if !response.status().is_success() {
        return Err(GrabError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| GrabError::transport(url, e))
}

/// Fetch the cover image shared by every broadcast of a run
pub async fn fetch_cover_art(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, GrabError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GrabError::transport(url, e))?;

    if !response.status().is_success() {
        return Err(GrabError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let data = response
        .bytes()
        .await
        .map_err(|e| GrabError::transport(url, e))?
        .to_vec();

    debug!("Cover art fetched: {} bytes", data.len());
    Ok(data)
}
