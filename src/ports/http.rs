use std::path::Path;

use async_trait::async_trait;

use crate::domain::SenseError;

/// Progress callback for downloads: (bytes downloaded, total bytes or 0).
pub type DownloadProgress = Box<dyn Fn(u64, u64) + Send + Sync>;

/// HTTP client port; all network traffic goes through this interface.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Download a file to the given path.
    ///
    /// The file is written to a temporary sibling and renamed into place on
    /// success, so a failed download never leaves a partial file behind.
    async fn download_file(
        &self,
        url: &str,
        path: &Path,
        progress: Option<DownloadProgress>,
    ) -> Result<(), SenseError>;
}
