use std::path::PathBuf;

use visa_cli::pipeline::PipelineRun;
use visa_model::EstimatorConfig;

#[derive(Debug)]
pub struct TrainResult {
    pub run: PipelineRun,
    pub summary_file: PathBuf,
    /// Set when the accepted model was pushed to object storage.
    pub pushed: Option<EstimatorConfig>,
}

#[derive(Debug)]
pub struct PredictResult {
    pub model: String,
    pub output: PathBuf,
    pub rows: usize,
    pub certified: usize,
    pub denied: usize,
}
