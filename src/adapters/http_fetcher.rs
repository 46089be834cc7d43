use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::domain::SenseError;
use crate::ports::{DownloadProgress, HttpFetcher};

/// Model artifacts can be large; allow slow links plenty of time.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3600);

/// reqwest-backed HTTP fetcher.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, SenseError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("SenseBridge/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SenseError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn download_file(
        &self,
        url: &str,
        path: &Path,
        progress: Option<DownloadProgress>,
    ) -> Result<(), SenseError> {
        use futures_util::StreamExt;
        use tokio::io::AsyncWriteExt;

        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| SenseError::HttpRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SenseError::HttpRequest(format!(
                "HTTP {} for {}",
                status, url
            )));
        }

        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write to a temp sibling, rename into place only on success.
        let temp_path = path.with_extension("download");

        let cleanup_temp = || {
            let temp = temp_path.clone();
            async move {
                let _ = tokio::fs::remove_file(&temp).await;
            }
        };

        let mut file = match tokio::fs::File::create(&temp_path).await {
            Ok(f) => f,
            Err(e) => {
                cleanup_temp().await;
                return Err(SenseError::Io(e.to_string()));
            }
        };

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    cleanup_temp().await;
                    return Err(SenseError::HttpRequest(e.to_string()));
                }
            };

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                cleanup_temp().await;
                return Err(SenseError::Io(e.to_string()));
            }

            downloaded += chunk.len() as u64;

            if let Some(callback) = &progress {
                callback(downloaded, total_size);
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            cleanup_temp().await;
            return Err(SenseError::Io(e.to_string()));
        }
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            cleanup_temp().await;
            return Err(SenseError::Io(e.to_string()));
        }

        info!(path = ?path, size = downloaded, "File downloaded");
        Ok(())
    }
}
