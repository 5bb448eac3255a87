pub mod app_state;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod io_struct;
pub mod labels;
pub mod logging;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod server;

pub use app_state::AppState;
pub use config::ServiceConfig;
pub use engine::{InferenceEngine, OnnxEngine};
pub use labels::ClassLabels;
pub use pipeline::PredictionPipeline;
