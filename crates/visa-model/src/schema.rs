//! Dataset schema declared in `schema.yaml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::read_yaml_file;
use crate::error::Result;

/// Column groups for validation and transformation.
///
/// `columns` is a list of single-entry maps (`- case_id: category`), which
/// keeps the declared column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub columns: Vec<std::collections::BTreeMap<String, String>>,
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    /// One-hot encoded columns.
    #[serde(default)]
    pub oh_columns: Vec<String>,
    /// Ordinal encoded columns.
    #[serde(default)]
    pub or_columns: Vec<String>,
    /// Yeo-Johnson power transformed columns.
    #[serde(default)]
    pub transform_columns: Vec<String>,
    /// Standard scaled columns.
    #[serde(default)]
    pub num_features: Vec<String>,
}

impl SchemaConfig {
    pub fn load(path: &Path) -> Result<Self> {
        read_yaml_file(path)
    }

    /// Declared column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|entry| entry.keys().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r"
columns:
  - case_id: category
  - continent: category
  - yr_of_estab: int
numerical_columns:
  - yr_of_estab
categorical_columns:
  - case_id
  - continent
drop_columns:
  - case_id
  - yr_of_estab
oh_columns:
  - continent
transform_columns:
  - company_age
num_features:
  - company_age
";

    #[test]
    fn test_parse_schema_keeps_column_order() {
        let schema: SchemaConfig = serde_yaml::from_str(SCHEMA).unwrap();
        assert_eq!(
            schema.column_names(),
            vec!["case_id", "continent", "yr_of_estab"]
        );
        assert_eq!(schema.oh_columns, vec!["continent"]);
        assert!(schema.or_columns.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, SCHEMA).unwrap();
        let schema = SchemaConfig::load(&path).unwrap();
        assert_eq!(schema.drop_columns, vec!["case_id", "yr_of_estab"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SchemaConfig::load(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert!(matches!(err, crate::ConfigError::Io { .. }));
    }
}
