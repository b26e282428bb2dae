//! Broadcast audio download

use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::grabber::GrabError;

/// Stream `url` into `dest`, replacing whatever is there.
///
/// Nothing is written unless the server answers with a success status.
/// Returns the number of bytes stored.
pub async fn download_broadcast(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, GrabError> {
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

    info!("Storing audio file at {}", dest.display());

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| GrabError::io(dest, e))?;

    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| GrabError::transport(url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| GrabError::io(dest, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| GrabError::io(dest, e))?;

    debug!("Downloaded {} bytes from {}", written, url);
    Ok(written)
}
