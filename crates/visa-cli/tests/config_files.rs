//! The configuration shipped in `config/` loads and is internally consistent.

use std::path::{Path, PathBuf};

use visa_model::SchemaConfig;
use visa_train::{ModelClass, ModelConfig};

fn config_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

#[test]
fn test_shipped_schema() {
    let schema = SchemaConfig::load(&config_dir().join("schema.yaml")).unwrap();
    let columns = schema.column_names();
    assert_eq!(columns.len(), 12);
    assert_eq!(columns.last().map(String::as_str), Some("case_status"));

    for name in schema
        .numerical_columns
        .iter()
        .chain(&schema.categorical_columns)
        .chain(&schema.drop_columns)
    {
        assert!(columns.contains(name), "{name} is not a declared column");
    }
    let encoded: Vec<&String> = schema
        .oh_columns
        .iter()
        .chain(&schema.or_columns)
        .collect();
    assert!(!encoded.iter().any(|name| schema.drop_columns.contains(name)));
    assert!(schema.transform_columns.iter().any(|c| c == "company_age"));
}

#[test]
fn test_shipped_model_config() {
    let config = ModelConfig::load(&config_dir().join("model.yaml")).unwrap();
    assert_eq!(config.cv, 5);
    let classes: Vec<ModelClass> = config.candidates.iter().map(|c| c.class).collect();
    assert_eq!(
        classes,
        vec![
            ModelClass::KNeighbors,
            ModelClass::RandomForest,
            ModelClass::LogisticRegression
        ]
    );
    assert_eq!(config.n_combinations(), 6 + 4 + 3);
}
