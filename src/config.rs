use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EngineConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::fetch::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_USER_AGENT, FetchConfig};
use crate::preprocess::DEFAULT_IMAGE_SIZE;

pub const DEFAULT_MODEL_PATH: &str = "models/xception_v4_final.onnx";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// HTTP worker threads; `None` uses the actix default.
    pub workers: Option<usize>,
    pub model_path: PathBuf,
    /// Falls back to the built-in label set when unset.
    pub labels_path: Option<PathBuf>,
    pub image_size: u32,
    pub intra_threads: Option<usize>,
    pub fetch_timeout_secs: u64,
    pub max_image_bytes: usize,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            image_size: DEFAULT_IMAGE_SIZE,
            intra_threads: None,
            fetch_timeout_secs: 10,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.workers == Some(0) {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.image_size == 0 {
            return Err(invalid("image_size", "must be greater than 0"));
        }
        if self.intra_threads == Some(0) {
            return Err(invalid("intra_threads", "must be at least 1"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(invalid("fetch_timeout_secs", "must be greater than 0"));
        }
        if self.max_image_bytes == 0 {
            return Err(invalid("max_image_bytes", "must be greater than 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        Ok(())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            user_agent: self.user_agent.clone(),
            max_image_bytes: self.max_image_bytes,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            intra_threads: self.intra_threads,
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
