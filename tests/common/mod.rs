// These modules are used by several test binaries
#![allow(dead_code)]

pub mod mock_image_host;

use garbage_classifier::error::ModelError;
use garbage_classifier::{ClassLabels, InferenceEngine};
use ndarray::Array4;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stand-in for the ONNX model: returns the same scores for every image.
pub struct FixedScoresEngine {
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedScoresEngine {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    /// Ten scores with a clear winner at `index`.
    pub fn favouring(index: usize) -> Self {
        let mut scores: Vec<f32> = (0..10).map(|i| i as f32 * 0.1).collect();
        scores[index] = 6.0;
        Self::new(scores)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceEngine for FixedScoresEngine {
    fn name(&self) -> &str {
        "fixed-scores"
    }

    fn output_width(&self) -> Option<usize> {
        Some(self.scores.len())
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError> {
        assert_eq!(input.shape()[0], 1, "batch axis must be 1");
        assert!(input.iter().all(|v| (-1.0..=1.0).contains(v)));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Engine whose every forward pass fails.
pub struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn output_width(&self) -> Option<usize> {
        None
    }

    fn run(&self, _input: Array4<f32>) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::Inference("simulated engine fault".to_string()))
    }
}

pub fn default_labels() -> ClassLabels {
    ClassLabels::default()
}
