use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::io_struct::ErrorResponse;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("image fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not connect to image host: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("image host returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("HTTP error while fetching image: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image body exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("I/O error while reading image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("decoded image has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("image decode task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model '{path}': {reason}")]
    Load { path: String, reason: String },
    #[error("input tensor shape {actual:?} does not match model input {expected:?}")]
    InputShape {
        expected: Vec<i64>,
        actual: Vec<usize>,
    },
    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<i64>),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("invalid score vector: {0}")]
    InvalidScores(String),
    #[error("label set has {labels} entries but the model produces {outputs} scores")]
    LabelMismatch { labels: usize, outputs: usize },
}

impl From<ort::Error> for ModelError {
    fn from(err: ort::Error) -> Self {
        ModelError::Inference(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch_error",
            PipelineError::Decode(_) => "decode_error",
            PipelineError::Model(_) | PipelineError::Join(_) => "model_error",
        }
    }
}

// Every pipeline failure is a generic server error on the wire; only the
// body's error_type tells them apart.
impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PipelineError::Model(_) | PipelineError::Join(_) => {
                log::error!("Prediction failed: {}", self)
            }
            _ => log::warn!("Prediction failed: {}", self),
        }
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.to_string(), self.error_type()))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ResponseError for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.0.clone(), "validation_error"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("label file error: {0}")]
    Labels(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
