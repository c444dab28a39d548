//! CLI argument definitions for the visa approval pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "visa",
    version,
    about = "Visa approval model training pipeline",
    long_about = "Train, publish and apply a visa approval classifier.\n\n\
                  `train` exports the visa collection, validates it, encodes and \
                  rebalances the features, grid searches the configured models and \
                  keeps the best one if it clears the accuracy threshold."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run ingestion, validation, transformation and training once.
    Train(TrainArgs),

    /// Classify the rows of a CSV file with a trained model.
    Predict(PredictArgs),

    /// Upload a trained model file to object storage.
    Push(PushArgs),
}

#[derive(Args)]
pub struct TrainArgs {
    /// Root directory for timestamped run directories.
    #[arg(long = "artifact-dir", value_name = "DIR", default_value = "artifact")]
    pub artifact_dir: PathBuf,

    /// Dataset schema.
    #[arg(long = "schema", value_name = "PATH", default_value = "config/schema.yaml")]
    pub schema: PathBuf,

    /// Candidate models and hyperparameter grids.
    #[arg(long = "model-config", value_name = "PATH", default_value = "config/model.yaml")]
    pub model_config: PathBuf,

    /// Minimum best cross-validated accuracy for a model to be kept.
    #[arg(long = "expected-accuracy", value_name = "SCORE", default_value_t = 0.6)]
    pub expected_accuracy: f64,

    /// Fraction of rows held out for testing.
    #[arg(long = "split-ratio", value_name = "RATIO", default_value_t = 0.2)]
    pub split_ratio: f64,

    /// Seed for the split and resampling. Omit for a fresh shuffle per run.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Document store root (overridden by VISA_STORE_URL).
    #[arg(long = "store-url", value_name = "DIR")]
    pub store_url: Option<String>,

    /// Collection holding the visa records.
    #[arg(long = "collection", value_name = "NAME", default_value = "visa_data")]
    pub collection: String,

    /// Year used to derive company age (default: current year).
    #[arg(long = "current-year", value_name = "YEAR")]
    pub current_year: Option<i64>,

    /// Rebalance only the training split.
    ///
    /// By default both splits are rebalanced. Metrics on a rebalanced test
    /// set do not reflect the real class distribution.
    #[arg(long = "no-balance-test-set")]
    pub no_balance_test_set: bool,

    /// Push the accepted model to this bucket.
    #[arg(long = "bucket", value_name = "NAME")]
    pub bucket: Option<String>,

    /// Key of the model inside the bucket.
    #[arg(long = "key", value_name = "KEY", default_value = "model.bin")]
    pub key: String,
}

#[derive(Args)]
pub struct PredictArgs {
    /// CSV file with one application per row.
    #[arg(long = "input", short = 'i', value_name = "CSV")]
    pub input: PathBuf,

    /// Local model file written by `train`.
    #[arg(long = "model", value_name = "PATH", conflicts_with = "bucket")]
    pub model: Option<PathBuf>,

    /// Load the model from this bucket instead of a local file.
    #[arg(long = "bucket", value_name = "NAME", required_unless_present = "model")]
    pub bucket: Option<String>,

    /// Key of the model inside the bucket.
    #[arg(long = "key", value_name = "KEY", default_value = "model.bin")]
    pub key: String,

    /// Output CSV (default: <input stem>_predictions.csv).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Dataset schema naming the dropped columns.
    #[arg(long = "schema", value_name = "PATH", default_value = "config/schema.yaml")]
    pub schema: PathBuf,

    /// Year used to derive company age (default: current year).
    #[arg(long = "current-year", value_name = "YEAR")]
    pub current_year: Option<i64>,
}

#[derive(Args)]
pub struct PushArgs {
    /// Model file to upload.
    #[arg(long = "model", value_name = "PATH")]
    pub model: PathBuf,

    /// Destination bucket.
    #[arg(long = "bucket", value_name = "NAME")]
    pub bucket: String,

    /// Key of the model inside the bucket.
    #[arg(long = "key", value_name = "KEY", default_value = "model.bin")]
    pub key: String,

    /// Delete the local file after a successful upload.
    #[arg(long = "remove")]
    pub remove: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
