//! Streaming course archive download.
//!
//! Wraps a reqwest client; one instance is shared by the install pipeline so
//! connections are pooled. There is no retry and no resume: a failed
//! download is reported and its partial file removed.

use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use crate::config::DownloadConfig;
use crate::error::CourseError;

/// Name used when the URL has no usable last segment
pub const DEFAULT_COURSE_NAME: &str = "Downloaded Course";

/// Progress snapshot passed to the download callback after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_written: u64,
    /// From Content-Length, when the server sent one
    pub content_length: Option<u64>,
}

impl DownloadProgress {
    /// Percentage in `0..=100`, or `None` when the total size is unknown.
    pub fn percent(&self) -> Option<u8> {
        match self.content_length {
            Some(0) => Some(100),
            Some(total) => {
                let pct = self.bytes_written.saturating_mul(100) / total;
                Some(pct.min(100) as u8)
            }
            None => None,
        }
    }
}

/// What a finished download produced.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the body
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built from the timeout settings.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: &DownloadConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(concat!("course_shelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Stream `url` into `dest`, reporting progress after every chunk.
    ///
    /// Only `200 OK` is accepted. On any error `dest` is removed.
    #[instrument(skip(self, on_progress), fields(url = %url))]
    pub async fn download_to_file<F>(
        &self,
        url: &str,
        dest: &Path,
        mut on_progress: F,
    ) -> Result<DownloadOutcome, CourseError>
    where
        F: FnMut(DownloadProgress),
    {
        let parsed = Url::parse(url).map_err(|_| CourseError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!("starting download");
        let response = self.client.get(parsed).send().await.map_err(|e| map_request_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CourseError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        let file = File::create(dest).await.map_err(|e| CourseError::io(dest, e))?;

        match stream_to_file(file, response, url, dest, content_length, &mut on_progress).await {
            Ok(outcome) => {
                info!(bytes = outcome.bytes, path = %dest.display(), "download complete");
                Ok(outcome)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }
}

async fn stream_to_file<F>(
    file: File,
    response: reqwest::Response,
    url: &str,
    dest: &Path,
    content_length: Option<u64>,
    on_progress: &mut F,
) -> Result<DownloadOutcome, CourseError>
where
    F: FnMut(DownloadProgress),
{
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| map_request_error(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| CourseError::io(dest, e))?;
        hasher.update(&chunk);
        bytes_written += chunk.len() as u64;
        on_progress(DownloadProgress {
            bytes_written,
            content_length,
        });
    }

    writer.flush().await.map_err(|e| CourseError::io(dest, e))?;

    Ok(DownloadOutcome {
        bytes: bytes_written,
        sha256: hex::encode(hasher.finalize()),
    })
}

fn map_request_error(url: &str, e: reqwest::Error) -> CourseError {
    if e.is_timeout() {
        CourseError::Timeout {
            url: url.to_string(),
        }
    } else {
        CourseError::Network {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Course name from the last URL path segment, minus query and fragment.
///
/// `https://host/a/intro%20course.zip?token=1` → `intro course.zip`
pub fn course_name_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|s| s.rsplit('/').find(|seg| !seg.is_empty()))
            .map(str::to_string),
    };

    let Some(segment) = segment else {
        return DEFAULT_COURSE_NAME.to_string();
    };

    let decoded = match urlencoding::decode(&segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.clone(),
    };
    let name = decoded.trim();
    if name.is_empty() {
        DEFAULT_COURSE_NAME.to_string()
    } else {
        name.to_string()
    }
}
