//! HTTP download helpers
//!
//! Streams a URL body to a temp file under the caller's workspace with a
//! progress bar. The caller owns the temp file and deletes it once the
//! archive has been extracted.

use crate::error::{NaisError, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Download a URL to `temp_data<extension>` under `destination` and return
/// the path to the temp file.
///
/// A non-success HTTP status is an error; a partial temp file may be left
/// behind and is overwritten on the next attempt.
pub async fn download_url(url: &str, destination: &Path, extension: &str) -> Result<PathBuf> {
    let temp_file = destination.join(format!("temp_data{extension}"));

    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(NaisError::DownloadFailed {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map_err(|e| NaisError::Other(e.into()))?
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {url}"));

    let mut file = std::fs::File::create(&temp_file)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_and_clear();
    info!(url, "Downloaded file to {}", temp_file.display());

    Ok(temp_file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_url_writes_temp_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Zone10_2014_01.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/Zone10_2014_01.zip", server.uri());

        let temp = download_url(&url, dir.path(), ".zip").await.unwrap();

        assert_eq!(temp, dir.path().join("temp_data.zip"));
        assert_eq!(std::fs::read(&temp).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn test_download_url_rejects_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.zip", server.uri());

        let err = download_url(&url, dir.path(), ".zip").await.unwrap_err();
        match err {
            NaisError::DownloadFailed { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other}"),
        }
    }
}
