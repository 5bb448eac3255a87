use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::error::ModelError;

/// A loaded classification model: input tensor in, raw class scores out.
///
/// Implementations are shared across request handlers for the lifetime of
/// the process, so `run` must be callable concurrently through `&self`.
pub trait InferenceEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Number of scores per image, when the model declares it statically.
    fn output_width(&self) -> Option<usize>;

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError>;
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Intra-op thread count; `None` leaves the ONNX Runtime default.
    pub intra_threads: Option<usize>,
}

pub struct OnnxEngine {
    name: String,
    // Session::run takes &mut self.
    session: Mutex<Session>,
    input_name: String,
    input_shape: Vec<i64>,
    output_name: String,
    output_width: Option<usize>,
}

impl OnnxEngine {
    pub fn load(path: &Path, config: &EngineConfig) -> Result<Self, ModelError> {
        let load_err = |reason: String| ModelError::Load {
            path: path.display().to_string(),
            reason,
        };

        let mut builder = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .map_err(|e| load_err(format!("failed to create session builder: {}", e)))?;
        if let Some(threads) = config.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| load_err(format!("failed to set thread count: {}", e)))?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(|e| load_err(e.to_string()))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| load_err("model declares no inputs".to_string()))?;
        let output = session
            .outputs
            .first()
            .ok_or_else(|| load_err("model declares no outputs".to_string()))?;

        let input_name = input.name.clone();
        let input_shape = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
            .unwrap_or_default();
        let output_name = output.name.clone();
        let output_width = output
            .output_type
            .tensor_shape()
            .and_then(|shape| shape.last().copied())
            .filter(|&dim| dim > 0)
            .map(|dim| dim as usize);

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::info!(
            "Loaded model {} (input '{}' {:?}, output '{}' width {:?})",
            name,
            input_name,
            input_shape,
            output_name,
            output_width
        );

        Ok(OnnxEngine {
            name,
            session: Mutex::new(session),
            input_name,
            input_shape,
            output_name,
            output_width,
        })
    }
}

impl InferenceEngine for OnnxEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_width(&self) -> Option<usize> {
        self.output_width
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError> {
        check_input_shape(&self.input_shape, input.shape())?;

        let tensor = Tensor::from_array(input)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Inference("session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ModelError::Inference(format!("output '{}' missing", self.output_name))
        })?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        scores_from_output(&dims, data)
    }
}

/// Accept a single image's scores shaped `[1, N]` or `[N]`.
pub fn scores_from_output(dims: &[i64], data: &[f32]) -> Result<Vec<f32>, ModelError> {
    match dims {
        [1, n] | [n] if *n > 0 && *n as usize == data.len() => Ok(data.to_vec()),
        _ => Err(ModelError::OutputShape(dims.to_vec())),
    }
}

/// Symbolic dimensions (reported as zero or negative) match anything.
pub fn check_input_shape(expected: &[i64], actual: &[usize]) -> Result<(), ModelError> {
    if expected.is_empty() {
        return Ok(());
    }
    let matches = expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(&e, &a)| e <= 0 || e as usize == a);
    if matches {
        Ok(())
    } else {
        Err(ModelError::InputShape {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}
