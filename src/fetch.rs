use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use image::RgbImage;
use reqwest::Client;
use tokio::{fs, task};
use url::Url;

use crate::error::{DecodeError, FetchError, PipelineError};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_image_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Downloads remote images and decodes them to RGB.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    timeout: Duration,
    max_image_bytes: usize,
}

impl ImageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        // Some image hosts refuse requests without a browser-like user agent.
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout,
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// Fetch and decode an image. No retries: the first failure is returned.
    pub async fn fetch(&self, url: &Url) -> Result<RgbImage, PipelineError> {
        let bytes = self.fetch_bytes(url).await?;
        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(decode_image(bytes).await?)
    }

    pub async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, FetchError> {
        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|err| self.classify_error(err))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        if let Some(len) = resp.content_length() {
            if len > self.max_image_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_image_bytes,
                });
            }
        }

        let bytes = resp.bytes().await.map_err(|err| self.classify_error(err))?;
        if bytes.len() > self.max_image_bytes {
            return Err(FetchError::TooLarge {
                limit: self.max_image_bytes,
            });
        }
        Ok(bytes)
    }

    /// Read and decode an image from the local filesystem.
    pub async fn load_file(&self, path: &Path) -> Result<RgbImage, PipelineError> {
        let bytes = fs::read(path).await.map_err(FetchError::Io)?;
        if bytes.len() > self.max_image_bytes {
            return Err(FetchError::TooLarge {
                limit: self.max_image_bytes,
            }
            .into());
        }
        Ok(decode_image(bytes.into()).await?)
    }

    fn classify_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_connect() {
            FetchError::Connect(err)
        } else {
            FetchError::Http(err)
        }
    }
}

/// Decode on a blocking thread and force three channels, dropping alpha.
pub async fn decode_image(bytes: Bytes) -> Result<RgbImage, DecodeError> {
    let image = task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
    let rgb = image.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(DecodeError::Empty {
            width: rgb.width(),
            height: rgb.height(),
        });
    }
    log::debug!("Decoded {}x{} image", rgb.width(), rgb.height());
    Ok(rgb)
}
