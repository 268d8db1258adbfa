//! Streaming archive download with optional SHA-256 verification.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

/// Errors that can occur while downloading an archive.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport or HTTP status failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing the destination file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded bytes do not match the expected digest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Digest from the descriptor.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },
}

/// Request for a download operation
#[derive(Debug)]
pub struct DownloadRequest<'a> {
    /// Shared HTTP client.
    pub client: &'a Client,
    /// Label used in progress reports.
    pub name: &'a str,
    /// Source URL.
    pub url: &'a str,
    /// Destination file; parent directories are created.
    pub dest: &'a Path,
    /// Expected lowercase hex SHA-256, if known.
    pub expected_hash: Option<&'a str>,
}

impl<'a> DownloadRequest<'a> {
    /// Create a request without hash verification.
    pub fn new(client: &'a Client, name: &'a str, url: &'a str, dest: &'a Path) -> Self {
        Self {
            client,
            name,
            url,
            dest,
            expected_hash: None,
        }
    }

    /// Require the download to match `hash`.
    pub fn with_expected_hash(mut self, hash: Option<&'a str>) -> Self {
        self.expected_hash = hash;
        self
    }

    /// Execute the download and return the hex SHA-256 of the written file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Http`] on a transport error or non-success
    /// status, [`DownloadError::Io`] if the file cannot be written, and
    /// [`DownloadError::HashMismatch`] if an expected hash was given and does
    /// not match. `dest` only appears once the transfer is complete and
    /// verified.
    pub async fn execute<R: Reporter + ?Sized>(
        self,
        reporter: &R,
    ) -> Result<String, DownloadError> {
        tracing::info!(url = self.url, dest = %self.dest.display(), "Downloading");

        let response = self
            .client
            .get(self.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let total = response.content_length();
        reporter.downloading(self.name, 0, total);

        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream into a sibling `.part` file so an interrupted transfer is
        // never mistaken for a complete archive.
        let mut partial = self.dest.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let (downloaded, actual_hash) =
            match stream_to_file(response, &partial, self.name, total, reporter).await {
                Ok(result) => result,
                Err(e) => {
                    tokio::fs::remove_file(&partial).await.ok();
                    return Err(e);
                }
            };

        if let Some(expected) = self.expected_hash {
            if !expected.eq_ignore_ascii_case(&actual_hash) {
                tokio::fs::remove_file(&partial).await.ok();
                return Err(DownloadError::HashMismatch {
                    expected: expected.to_string(),
                    actual: actual_hash,
                });
            }
        }

        tokio::fs::rename(&partial, self.dest).await?;
        tracing::debug!(bytes = downloaded, sha256 = %actual_hash, "Download complete");
        Ok(actual_hash)
    }
}

/// Compute the hex SHA-256 of a file on disk (streaming).
///
/// # Errors
///
/// Returns any I/O error from opening or reading `path`.
pub fn compute_file_hash(path: &Path) -> std::io::Result<String> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

async fn stream_to_file<R: Reporter + ?Sized>(
    response: reqwest::Response,
    path: &Path,
    name: &str,
    total: Option<u64>,
    reporter: &R,
) -> Result<(u64, String), DownloadError> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        reporter.downloading(name, downloaded, total);
    }

    file.flush().await?;
    Ok((downloaded, hex::encode(hasher.finalize())))
}
