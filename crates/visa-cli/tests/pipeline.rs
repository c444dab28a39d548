//! End-to-end runs of the training pipeline over an in-memory document store.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use visa_cli::pipeline::{PipelineError, RUN_SUMMARY_FILE_NAME, TrainingPipeline};
use visa_cli::prediction::{
    PREDICTION_COLUMN, annotate_predictions, load_prediction_input, write_predictions,
};
use visa_ingest::{Document, InMemoryStore, read_csv_table};
use visa_model::{PipelineOptions, TrainingPipelineConfig};
use visa_train::VisaModel;

const SCHEMA: &str = r"
columns:
  - case_id: category
  - continent: category
  - education_of_employee: category
  - has_job_experience: category
  - requires_job_training: category
  - no_of_employees: int
  - yr_of_estab: int
  - region_of_employment: category
  - prevailing_wage: float
  - unit_of_wage: category
  - full_time_position: category
  - case_status: category
numerical_columns:
  - no_of_employees
  - prevailing_wage
  - yr_of_estab
categorical_columns:
  - case_id
  - continent
  - education_of_employee
  - has_job_experience
  - requires_job_training
  - region_of_employment
  - unit_of_wage
  - full_time_position
  - case_status
drop_columns:
  - case_id
  - yr_of_estab
oh_columns:
  - continent
  - unit_of_wage
  - region_of_employment
or_columns:
  - has_job_experience
  - requires_job_training
  - full_time_position
  - education_of_employee
transform_columns:
  - no_of_employees
  - company_age
num_features:
  - no_of_employees
  - prevailing_wage
  - company_age
";

const MODEL_YAML: &str = r"
grid_search:
  cv: 3
model_selection:
  module_0:
    class: LogisticRegression
    params:
      max_iter: 300
  module_1:
    class: DecisionTreeClassifier
    params:
      random_state: 3
    search_param_grid:
      max_depth: [3, 5]
  module_2:
    class: KNeighborsClassifier
    search_param_grid:
      n_neighbors: [3, 5]
";

const CONTINENTS: [&str; 3] = ["Asia", "Europe", "North America"];
const EDUCATION: [&str; 4] = ["High School", "Bachelor's", "Master's", "Doctorate"];
const REGIONS: [&str; 3] = ["West", "Northeast", "South"];
const UNITS: [&str; 2] = ["Year", "Hour"];

fn is_denied(i: usize) -> bool {
    i % 4 == 0 || i % 7 == 0
}

fn wage(i: usize) -> f64 {
    let base = if is_denied(i) { 20_000.0 } else { 80_000.0 };
    base + (i * 101 % 997) as f64
}

fn visa_document(i: usize) -> Document {
    let value = json!({
        "_id": format!("oid{i}"),
        "case_id": format!("EZYV{i:05}"),
        "continent": CONTINENTS[i % 3],
        "education_of_employee": EDUCATION[i % 4],
        "has_job_experience": if i % 2 == 0 { "Y" } else { "N" },
        "requires_job_training": if i % 5 == 0 { "Y" } else { "N" },
        "no_of_employees": 50 + (i * 37) % 5000,
        "yr_of_estab": 1950 + (i * 13) % 70,
        "region_of_employment": REGIONS[i % 3],
        "prevailing_wage": wage(i),
        "unit_of_wage": UNITS[i % 2],
        "full_time_position": if i % 3 == 0 { "N" } else { "Y" },
        "case_status": if is_denied(i) { "Denied" } else { "Certified" },
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn store(rows: usize) -> InMemoryStore {
    let mut store = InMemoryStore::new("EasyVisa");
    store.insert("visa_data", (0..rows).map(visa_document).collect());
    store
}

fn config(root: &Path, expected_accuracy: f64) -> TrainingPipelineConfig {
    let schema = root.join("schema.yaml");
    let model = root.join("model.yaml");
    std::fs::write(&schema, SCHEMA).unwrap();
    std::fs::write(&model, MODEL_YAML).unwrap();
    let options = PipelineOptions::default()
        .with_artifact_root(root.join("artifact"))
        .with_schema_file(schema)
        .with_model_config_file(model)
        .with_random_seed(Some(11))
        .with_current_year(2024)
        .with_expected_accuracy(expected_accuracy);
    TrainingPipelineConfig::with_timestamp(&options, "run")
}

fn new_cases_csv(path: &Path, rows: std::ops::Range<usize>) {
    let mut out = String::from(
        "case_id,continent,education_of_employee,has_job_experience,requires_job_training,\
         no_of_employees,yr_of_estab,region_of_employment,prevailing_wage,unit_of_wage,\
         full_time_position\n",
    );
    for i in rows {
        writeln!(
            out,
            "EZYV{i:05},{},{},{},{},{},{},{},{:.2},{},{}",
            CONTINENTS[i % 3],
            EDUCATION[i % 4],
            if i % 2 == 0 { "Y" } else { "N" },
            if i % 5 == 0 { "Y" } else { "N" },
            50 + (i * 37) % 5000,
            1950 + (i * 13) % 70,
            REGIONS[i % 3],
            wage(i),
            UNITS[i % 2],
            if i % 3 == 0 { "N" } else { "Y" },
        )
        .unwrap();
    }
    std::fs::write(path, out).unwrap();
}

#[test]
fn test_accepted_run_writes_model_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0.5);
    let pipeline = TrainingPipeline::new(config.clone(), store(150));

    let run = pipeline.run_pipeline().unwrap();

    assert!(run.data_validation.validation_status);
    assert_eq!(run.artifact_dir, dir.path().join("artifact/run"));
    assert_eq!(
        run.model_trainer.trained_model_file_path,
        config.model_trainer.trained_model_file_path
    );
    assert!(run.model_trainer.best_score >= 0.5);

    let summary: Value = serde_json::from_slice(
        &std::fs::read(run.artifact_dir.join(RUN_SUMMARY_FILE_NAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["pipeline_name"], "visa_approval");
    assert_eq!(
        summary["model_trainer"]["model_name"],
        run.model_trainer.model_name.as_str()
    );

    let model = VisaModel::load(&run.model_trainer.trained_model_file_path).unwrap();
    assert_eq!(model.model_name(), run.model_trainer.model_name);

    let input_path = dir.path().join("new_cases.csv");
    new_cases_csv(&input_path, 500..520);
    let input = load_prediction_input(&input_path, &config.data_validation.schema_file_path, 2024)
        .unwrap();
    let labels = model.predict_labels(&input.features).unwrap();
    assert_eq!(labels.len(), 20);
    assert!(labels.iter().all(|l| *l == "Certified" || *l == "Denied"));

    let output_path = dir.path().join("out/predictions.csv");
    let mut annotated = annotate_predictions(&input.raw, &labels).unwrap();
    write_predictions(&mut annotated, &output_path).unwrap();
    let written = read_csv_table(&output_path).unwrap();
    assert_eq!(written.height(), 20);
    assert_eq!(written.width(), input.raw.width() + 1);
    assert!(written.column(PREDICTION_COLUMN).is_ok());
}

#[test]
fn test_threshold_not_met_keeps_earlier_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.01);
    let pipeline = TrainingPipeline::new(config.clone(), store(150));

    let err = pipeline.run_pipeline().unwrap_err();

    assert!(matches!(err, PipelineError::ThresholdNotMet { .. }));
    assert!(config.data_ingestion.training_file_path.is_file());
    assert!(config.data_validation.validation_report_file_path.is_file());
    assert!(
        config
            .data_transformation
            .transformed_object_file_path
            .is_file()
    );
    assert!(!config.model_trainer.trained_model_file_path.exists());
    assert!(!config.artifact_dir.join(RUN_SUMMARY_FILE_NAME).exists());
}

#[test]
fn test_failed_validation_stops_before_transformation() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0.5);
    let mut store = InMemoryStore::new("EasyVisa");
    store.insert(
        "visa_data",
        (0..50)
            .map(|i| {
                let mut doc = visa_document(i);
                doc.remove("unit_of_wage");
                doc
            })
            .collect(),
    );
    let pipeline = TrainingPipeline::new(config.clone(), store);

    let err = pipeline.run_pipeline().unwrap_err();

    let message = match err {
        PipelineError::ValidationFailed { message } => message,
        other => panic!("expected validation failure, got {other}"),
    };
    assert!(message.contains("unit_of_wage"), "{message}");
    assert!(config.data_validation.validation_report_file_path.is_file());
    assert!(!config.data_transformation.data_transformation_dir.exists());
}

#[test]
fn test_missing_collection_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0.5);
    let pipeline = TrainingPipeline::new(config, InMemoryStore::new("EasyVisa"));

    let err = pipeline.run_pipeline().unwrap_err();

    assert_eq!(err.kind(), "io");
    assert!(err.to_string().starts_with("data ingestion failed: "));
}

#[test]
fn test_prediction_input_requires_rows() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema.yaml");
    std::fs::write(&schema, SCHEMA).unwrap();
    let input: PathBuf = dir.path().join("empty.csv");
    new_cases_csv(&input, 0..0);

    assert!(load_prediction_input(&input, &schema, 2024).is_err());
}
