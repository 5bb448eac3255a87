use std::sync::Arc;

use anyhow::Context;

use crate::config::ServiceConfig;
use crate::engine::{InferenceEngine, OnnxEngine};
use crate::fetch::ImageFetcher;
use crate::labels::ClassLabels;
use crate::pipeline::PredictionPipeline;
use crate::preprocess::Preprocessor;

pub const SERVICE_MESSAGE: &str = "Garbage Classification Service";

/// Read-only state shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PredictionPipeline,
}

impl AppState {
    /// Load the model and labels named by the config.
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let labels = load_labels(config)?;
        let engine = OnnxEngine::load(&config.model_path, &config.engine_config())?;
        Self::from_parts(config, Arc::new(engine), labels)
    }

    pub fn from_parts(
        config: &ServiceConfig,
        engine: Arc<dyn InferenceEngine>,
        labels: ClassLabels,
    ) -> anyhow::Result<Self> {
        let fetcher = ImageFetcher::new(config.fetch_config())
            .context("failed to build image fetch client")?;
        let preprocessor = Preprocessor::new(config.image_size);
        let pipeline = PredictionPipeline::new(fetcher, preprocessor, engine, labels)
            .context("label set does not fit the model")?;
        log::info!(
            "Prediction pipeline ready: model={}, labels={}, image_size={}",
            pipeline.engine_name(),
            pipeline.labels().len(),
            config.image_size
        );
        Ok(Self { pipeline })
    }
}

pub fn load_labels(config: &ServiceConfig) -> anyhow::Result<ClassLabels> {
    match &config.labels_path {
        Some(path) => Ok(ClassLabels::from_file(path)?),
        None => Ok(ClassLabels::default()),
    }
}
