//! Fetch → decode → preprocess → infer → softmax, for one image at a time.
//!
//! ```text
//!  URL ──► ImageFetcher ──► RgbImage ──► Preprocessor ──► [1, S, S, 3]
//!                                                              │
//!  Prediction ◄── postprocess::predict ◄── scores ◄── InferenceEngine
//! ```

use std::sync::Arc;

use image::RgbImage;
use url::Url;

use crate::engine::InferenceEngine;
use crate::error::{ModelError, PipelineError};
use crate::fetch::ImageFetcher;
use crate::labels::ClassLabels;
use crate::postprocess::{self, Prediction};
use crate::preprocess::Preprocessor;

#[derive(Clone)]
pub struct PredictionPipeline {
    fetcher: ImageFetcher,
    preprocessor: Preprocessor,
    engine: Arc<dyn InferenceEngine>,
    labels: ClassLabels,
}

impl PredictionPipeline {
    /// Fails if the engine declares an output width that differs from the
    /// number of labels.
    pub fn new(
        fetcher: ImageFetcher,
        preprocessor: Preprocessor,
        engine: Arc<dyn InferenceEngine>,
        labels: ClassLabels,
    ) -> Result<Self, ModelError> {
        if let Some(width) = engine.output_width() {
            if width != labels.len() {
                return Err(ModelError::LabelMismatch {
                    labels: labels.len(),
                    outputs: width,
                });
            }
        }
        Ok(Self {
            fetcher,
            preprocessor,
            engine,
            labels,
        })
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn predict_url(&self, url: &Url) -> Result<Prediction, PipelineError> {
        let image = self.fetcher.fetch(url).await?;
        self.classify(image).await
    }

    pub async fn classify(&self, image: RgbImage) -> Result<Prediction, PipelineError> {
        let engine = self.engine.clone();
        let preprocessor = self.preprocessor;
        let scores = tokio::task::spawn_blocking(move || {
            let input = preprocessor.preprocess(&image);
            engine.run(input)
        })
        .await??;

        let prediction = postprocess::predict(&self.labels, &scores)?;
        log::debug!(
            "{} predicted {} ({:.4})",
            self.engine.name(),
            prediction.top_class,
            prediction.top_probability
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use image::Rgb;
    use ndarray::Array4;
    use std::sync::Mutex;

    struct RecordingEngine {
        scores: Vec<f32>,
        declared_width: Option<usize>,
        seen_shapes: Mutex<Vec<Vec<usize>>>,
    }

    impl RecordingEngine {
        fn new(scores: Vec<f32>) -> Self {
            let width = scores.len();
            Self {
                scores,
                declared_width: Some(width),
                seen_shapes: Mutex::new(Vec::new()),
            }
        }
    }

    impl InferenceEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn output_width(&self) -> Option<usize> {
            self.declared_width
        }

        fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError> {
            self.seen_shapes.lock().unwrap().push(input.shape().to_vec());
            Ok(self.scores.clone())
        }
    }

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let engine = Arc::new(RecordingEngine::new(vec![0.0; 5]));
        let result = PredictionPipeline::new(
            fetcher(),
            Preprocessor::default(),
            engine,
            ClassLabels::default(),
        );
        assert!(matches!(
            result,
            Err(ModelError::LabelMismatch {
                labels: 10,
                outputs: 5
            })
        ));
    }

    #[tokio::test]
    async fn test_classify_feeds_batched_tensor() {
        let mut scores = vec![0.0f32; 10];
        scores[4] = 3.0;
        let engine = Arc::new(RecordingEngine::new(scores));
        let pipeline = PredictionPipeline::new(
            fetcher(),
            Preprocessor::default(),
            engine.clone(),
            ClassLabels::default(),
        )
        .unwrap();

        let image = RgbImage::from_pixel(40, 30, Rgb([1, 2, 3]));
        let prediction = pipeline.classify(image).await.unwrap();

        assert_eq!(prediction.top_class, "glass");
        assert_eq!(prediction.distribution.len(), 10);
        assert_eq!(
            engine.seen_shapes.lock().unwrap().as_slice(),
            &[vec![1, 299, 299, 3]]
        );
    }

    #[tokio::test]
    async fn test_classify_checks_runtime_width() {
        // Engine does not declare a width up front and then returns too few scores.
        let engine = Arc::new(RecordingEngine {
            scores: vec![1.0, 2.0],
            declared_width: None,
            seen_shapes: Mutex::new(Vec::new()),
        });
        let pipeline = PredictionPipeline::new(
            fetcher(),
            Preprocessor::new(8),
            engine,
            ClassLabels::default(),
        )
        .unwrap();

        let result = pipeline.classify(RgbImage::new(4, 4)).await;
        assert!(matches!(
            result,
            Err(PipelineError::Model(ModelError::LabelMismatch { .. }))
        ));
    }
}
