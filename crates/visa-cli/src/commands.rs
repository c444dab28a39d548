use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use tracing::{info, info_span};

use visa_cli::pipeline::{RUN_SUMMARY_FILE_NAME, TrainingPipeline};
use visa_cli::prediction::{
    annotate_predictions, default_output_path, load_prediction_input, write_predictions,
};
use visa_estimator::{FileSystemStorage, VisaEstimator};
use visa_ingest::DocumentStoreClient;
use visa_model::{CaseStatus, PipelineOptions, StoreConfig, TrainingPipelineConfig};
use visa_train::VisaModel;

use crate::cli::{PredictArgs, PushArgs, TrainArgs};
use crate::types::{PredictResult, TrainResult};

pub fn run_train(args: &TrainArgs) -> Result<TrainResult> {
    let mut options = PipelineOptions::default()
        .with_artifact_root(&args.artifact_dir)
        .with_schema_file(&args.schema)
        .with_model_config_file(&args.model_config)
        .with_expected_accuracy(args.expected_accuracy)
        .with_split_ratio(args.split_ratio)
        .with_random_seed(args.seed)
        .with_collection(&args.collection)
        .with_balance_test_set(!args.no_balance_test_set)
        .with_bucket(args.bucket.clone())
        .with_model_key(&args.key);
    if let Some(year) = args.current_year {
        options = options.with_current_year(year);
    }
    options.validate().context("invalid options")?;

    let config = TrainingPipelineConfig::new(&options);
    let store_config = StoreConfig::from_env_or(args.store_url.as_deref());
    let store = DocumentStoreClient::connect(&store_config).context("connect to document store")?;

    let pipeline = TrainingPipeline::new(config, store);
    let run = pipeline.run_pipeline()?;
    let summary_file = run.artifact_dir.join(RUN_SUMMARY_FILE_NAME);

    let pushed = match &pipeline.config().estimator {
        Some(estimator_config) => {
            let estimator = VisaEstimator::new(
                &estimator_config.bucket_name,
                &estimator_config.model_key,
                FileSystemStorage::from_env(),
            );
            estimator
                .save_model(&run.model_trainer.trained_model_file_path, false)
                .context("push model")?;
            Some(estimator_config.clone())
        }
        None => None,
    };

    Ok(TrainResult {
        run,
        summary_file,
        pushed,
    })
}

pub fn run_predict(args: &PredictArgs) -> Result<PredictResult> {
    let span = info_span!("predict", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let current_year = args
        .current_year
        .unwrap_or_else(|| i64::from(Local::now().year()));
    let input = load_prediction_input(&args.input, &args.schema, current_year)?;

    let (model, labels) = match (&args.model, &args.bucket) {
        (Some(path), _) => {
            let model = VisaModel::load(path)
                .with_context(|| format!("load model {}", path.display()))?;
            let labels = model.predict_labels(&input.features).context("predict")?;
            (model.to_string(), labels)
        }
        (None, Some(bucket)) => {
            let mut estimator =
                VisaEstimator::new(bucket, &args.key, FileSystemStorage::from_env());
            if !estimator.is_model_present(&args.key) {
                bail!("no model at {bucket}/{}", args.key);
            }
            let labels = estimator
                .predict_labels(&input.features)
                .context("predict")?;
            (format!("{bucket}/{}", args.key), labels)
        }
        (None, None) => bail!("pass --model or --bucket"),
    };

    let mut annotated = annotate_predictions(&input.raw, &labels)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_predictions(&mut annotated, &output)?;

    let denied = labels
        .iter()
        .filter(|label| **label == CaseStatus::Denied.as_str())
        .count();
    info!(
        rows = labels.len(),
        denied,
        output = %output.display(),
        duration_ms = start.elapsed().as_millis(),
        "wrote predictions"
    );
    Ok(PredictResult {
        model,
        output,
        rows: labels.len(),
        certified: labels.len() - denied,
        denied,
    })
}

pub fn run_push(args: &PushArgs) -> Result<()> {
    let estimator = VisaEstimator::new(&args.bucket, &args.key, FileSystemStorage::from_env());
    VisaModel::load(&args.model)
        .with_context(|| format!("{} is not a trained model", args.model.display()))?;
    estimator
        .save_model(&args.model, args.remove)
        .context("push model")?;
    println!("Pushed {} to {}/{}", args.model.display(), args.bucket, args.key);
    Ok(())
}
