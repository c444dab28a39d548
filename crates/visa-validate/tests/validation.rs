//! Integration tests for the validation stage.

use std::path::Path;

use visa_model::{DataIngestionArtifact, PipelineOptions, SchemaConfig, TrainingPipelineConfig};
use visa_validate::DataValidation;

const SCHEMA: &str = r"
columns:
  - case_id: category
  - continent: category
  - no_of_employees: int
  - case_status: category
numerical_columns:
  - no_of_employees
categorical_columns:
  - case_id
  - continent
  - case_status
";

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

fn setup(dir: &Path, train: &str, test: &str) -> DataValidation {
    let schema: SchemaConfig = load_schema(SCHEMA);
    let train_path = dir.join("train.csv");
    let test_path = dir.join("test.csv");
    write(&train_path, train);
    write(&test_path, test);

    let options = PipelineOptions::default().with_artifact_root(dir);
    let config = TrainingPipelineConfig::with_timestamp(&options, "run");
    DataValidation::with_schema(
        DataIngestionArtifact {
            trained_file_path: train_path,
            test_file_path: test_path,
        },
        config.data_validation,
        schema,
    )
}

fn load_schema(text: &str) -> SchemaConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.yaml");
    write(&path, text);
    SchemaConfig::load(&path).unwrap()
}

#[test]
fn valid_splits_pass() {
    let dir = tempfile::tempdir().unwrap();
    let validation = setup(
        dir.path(),
        "case_id,continent,no_of_employees,case_status\nEZYV1,Asia,10,Denied\n",
        "case_id,continent,no_of_employees,case_status\nEZYV2,Europe,20,Certified\n",
    );

    let artifact = validation.initiate_data_validation().unwrap();
    assert!(artifact.validation_status);
    assert!(artifact.message.is_empty());
    assert!(artifact.report_file_path.exists());
}

#[test]
fn missing_column_fails_with_report() {
    let dir = tempfile::tempdir().unwrap();
    let validation = setup(
        dir.path(),
        "case_id,continent,no_of_employees,case_status\nEZYV1,Asia,10,Denied\n",
        "case_id,no_of_employees,case_status\nEZYV2,20,Certified\n",
    );

    let artifact = validation.initiate_data_validation().unwrap();
    assert!(!artifact.validation_status);

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&artifact.report_file_path).unwrap()).unwrap();
    insta::assert_json_snapshot!(report, @r#"
    {
      "validation_status": false,
      "message": "test dataframe has 3 columns, expected 4. test dataframe is missing categorical columns: continent.",
      "datasets": [
        {
          "dataset": "training",
          "rows": 1,
          "columns": 4,
          "expected_columns": 4,
          "column_count_ok": true,
          "missing_numerical_columns": [],
          "missing_categorical_columns": []
        },
        {
          "dataset": "test",
          "rows": 1,
          "columns": 3,
          "expected_columns": 4,
          "column_count_ok": false,
          "missing_numerical_columns": [],
          "missing_categorical_columns": [
            "continent"
          ]
        }
      ]
    }
    "#);
    assert_eq!(artifact.message, report["message"].as_str().unwrap());
}

#[test]
fn missing_split_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let validation = setup(dir.path(), "a\n1\n", "a\n1\n");
    std::fs::remove_file(dir.path().join("test.csv")).unwrap();
    assert!(validation.initiate_data_validation().is_err());
}
