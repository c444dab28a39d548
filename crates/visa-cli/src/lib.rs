//! Library side of the `visa` CLI: logging, pipeline orchestration and
//! batch prediction.

pub mod logging;
pub mod pipeline;
pub mod prediction;

pub use pipeline::{PipelineError, PipelineRun, TrainingPipeline};
