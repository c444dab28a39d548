//! Document store access and collection export.
//!
//! A collection is a list of JSON objects. [`export_collection_as_dataframe`]
//! turns one into a polars `DataFrame`:
//!
//! - columns appear in first-seen key order across documents
//! - the internal `_id` column is dropped
//! - the literal string `na` becomes null
//! - columns are typed `Int64`, `Float64` or `String` from their non-null values

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::Value;
use visa_model::StoreConfig;

use crate::error::{IngestError, Result};

/// One stored record.
pub type Document = serde_json::Map<String, Value>;

const ID_COLUMN: &str = "_id";
const NA_MARKER: &str = "na";

/// Read access to named collections.
pub trait DocumentStore {
    /// Database queried by [`export_collection_as_dataframe`].
    fn database_name(&self) -> &str;

    /// Fetch every document of `database.collection`.
    fn fetch_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>>;
}

/// Directory-backed document store.
///
/// Collections live at `<root>/<database>/<collection>.json` (a JSON array)
/// or `<root>/<database>/<collection>.jsonl` (one document per line).
#[derive(Debug, Clone)]
pub struct DocumentStoreClient {
    root: PathBuf,
    database_name: String,
}

impl DocumentStoreClient {
    /// Open the store described by `config`. The root directory must exist.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let root = PathBuf::from(&config.url);
        if !root.is_dir() {
            return Err(IngestError::StoreUnavailable {
                url: config.url.clone(),
            });
        }
        tracing::debug!(url = %config.url, database = %config.database_name, "connected to document store");
        Ok(Self {
            root,
            database_name: config.database_name.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, database: &str, collection: &str) -> Option<PathBuf> {
        let dir = self.root.join(database);
        ["json", "jsonl"]
            .iter()
            .map(|ext| dir.join(format!("{collection}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl DocumentStore for DocumentStoreClient {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn fetch_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(database, collection).ok_or_else(|| {
            IngestError::CollectionNotFound {
                database: database.to_string(),
                collection: collection.to_string(),
            }
        })?;

        let contents = fs::read_to_string(&path).map_err(|e| IngestError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        if path.extension().is_some_and(|ext| ext == "jsonl") {
            parse_json_lines(&contents, &path)
        } else {
            parse_json_array(&contents, &path)
        }
    }
}

fn into_document(value: Value, path: &Path, index: usize) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(IngestError::InvalidDocument {
            path: path.to_path_buf(),
            index,
            message: format!("expected an object, found {other}"),
        }),
    }
}

fn parse_json_array(contents: &str, path: &Path) -> Result<Vec<Document>> {
    let values: Vec<Value> =
        serde_json::from_str(contents).map_err(|e| IngestError::InvalidDocument {
            path: path.to_path_buf(),
            index: 0,
            message: e.to_string(),
        })?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| into_document(value, path, index))
        .collect()
}

fn parse_json_lines(contents: &str, path: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| IngestError::InvalidDocument {
            path: path.to_path_buf(),
            index,
            message: e.to_string(),
        })?;
        documents.push(into_document(value, path, index)?);
    }
    Ok(documents)
}

/// Store holding collections in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    database_name: String,
    collections: HashMap<(String, String), Vec<Document>>,
}

impl InMemoryStore {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            collections: HashMap::new(),
        }
    }

    /// Insert or replace a collection in this store's database.
    pub fn insert(&mut self, collection: impl Into<String>, documents: Vec<Document>) {
        self.collections
            .insert((self.database_name.clone(), collection.into()), documents);
    }
}

impl DocumentStore for InMemoryStore {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn fetch_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .ok_or_else(|| IngestError::CollectionNotFound {
                database: database.to_string(),
                collection: collection.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// `None` for JSON null and the `na` marker.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s == NA_MARKER => None,
        Some(other) => Some(other),
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = Option<&'a Value>>) -> ColumnKind {
    let mut kind = None;
    for value in values.flatten() {
        let this = match value {
            Value::Number(n) if n.is_i64() => ColumnKind::Int,
            Value::Number(_) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(ColumnKind::Int), ColumnKind::Int) => ColumnKind::Int,
            _ => ColumnKind::Float,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "Y" } else { "N" }.to_string(),
        other => other.to_string(),
    }
}

fn build_column(name: &str, documents: &[Document]) -> Column {
    let cells = || documents.iter().map(|doc| present(doc.get(name)));
    let series = match infer_kind(cells()) {
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = cells().map(|v| v.and_then(Value::as_i64)).collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells().map(|v| v.and_then(Value::as_f64)).collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Text => {
            let values: Vec<Option<String>> = cells().map(|v| v.map(value_text)).collect();
            Series::new(name.into(), values)
        }
    };
    series.into()
}

/// Convert documents into a `DataFrame`.
pub fn documents_to_dataframe(documents: &[Document]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for doc in documents {
        for key in doc.keys() {
            if key != ID_COLUMN && !names.contains(&key.as_str()) {
                names.push(key.as_str());
            }
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .map(|name| build_column(name, documents))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Export the named collection from the store's database as a `DataFrame`.
pub fn export_collection_as_dataframe<S>(store: &S, collection: &str) -> Result<DataFrame>
where
    S: DocumentStore + ?Sized,
{
    let database = store.database_name();
    let documents = store.fetch_collection(database, collection)?;
    if documents.is_empty() {
        return Err(IngestError::EmptyCollection {
            collection: collection.to_string(),
        });
    }

    let df = documents_to_dataframe(&documents)?;
    tracing::info!(
        database,
        collection,
        rows = df.height(),
        columns = df.width(),
        "exported collection"
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use visa_common::{column_f64, column_i64, column_strings};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    fn sample_store() -> InMemoryStore {
        let mut store = InMemoryStore::new("EasyVisa");
        store.insert(
            "visa_data",
            vec![
                doc(json!({"_id": "a1", "case_id": "EZYV01", "no_of_employees": 14513, "prevailing_wage": 592.2029, "region_of_employment": "West"})),
                doc(json!({"_id": "a2", "case_id": "EZYV02", "no_of_employees": 2412, "prevailing_wage": 83425, "region_of_employment": "na"})),
            ],
        );
        store
    }

    #[test]
    fn test_export_drops_id_and_keeps_order() {
        let df = export_collection_as_dataframe(&sample_store(), "visa_data").unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "case_id",
                "no_of_employees",
                "prevailing_wage",
                "region_of_employment"
            ]
        );
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_export_infers_types_and_na() {
        let df = export_collection_as_dataframe(&sample_store(), "visa_data").unwrap();
        assert_eq!(df.column("no_of_employees").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("prevailing_wage").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            column_i64(&df, "no_of_employees").unwrap(),
            vec![Some(14513), Some(2412)]
        );
        assert_eq!(
            column_f64(&df, "prevailing_wage").unwrap(),
            vec![Some(592.2029), Some(83425.0)]
        );
        assert_eq!(
            column_strings(&df, "region_of_employment").unwrap(),
            vec![Some("West".to_string()), None]
        );
    }

    #[test]
    fn test_missing_keys_become_null() {
        let docs = vec![
            doc(json!({"a": 1})),
            doc(json!({"a": 2, "b": true})),
        ];
        let df = documents_to_dataframe(&docs).unwrap();
        assert_eq!(
            column_strings(&df, "b").unwrap(),
            vec![None, Some("Y".to_string())]
        );
    }

    #[test]
    fn test_unknown_collection() {
        let err = export_collection_as_dataframe(&sample_store(), "other").unwrap_err();
        assert!(matches!(err, IngestError::CollectionNotFound { .. }));
    }

    #[test]
    fn test_empty_collection() {
        let mut store = InMemoryStore::new("EasyVisa");
        store.insert("visa_data", Vec::new());
        let err = export_collection_as_dataframe(&store, "visa_data").unwrap_err();
        assert!(matches!(err, IngestError::EmptyCollection { .. }));
    }

    #[test]
    fn test_client_reads_json_and_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("EasyVisa");
        fs::create_dir_all(&db_dir).unwrap();
        fs::write(
            db_dir.join("array.json"),
            r#"[{"_id": 1, "x": 1}, {"_id": 2, "x": 2}]"#,
        )
        .unwrap();
        fs::write(db_dir.join("lines.jsonl"), "{\"x\": 1}\n\n{\"x\": 2}\n{\"x\": 3}\n").unwrap();

        let config = StoreConfig {
            url: dir.path().display().to_string(),
            database_name: "EasyVisa".to_string(),
        };
        let client = DocumentStoreClient::connect(&config).unwrap();
        assert_eq!(client.fetch_collection("EasyVisa", "array").unwrap().len(), 2);
        assert_eq!(client.fetch_collection("EasyVisa", "lines").unwrap().len(), 3);
        assert!(matches!(
            client.fetch_collection("EasyVisa", "missing"),
            Err(IngestError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn test_client_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("EasyVisa");
        fs::create_dir_all(&db_dir).unwrap();
        fs::write(db_dir.join("bad.json"), "[1, 2]").unwrap();

        let config = StoreConfig {
            url: dir.path().display().to_string(),
            database_name: "EasyVisa".to_string(),
        };
        let client = DocumentStoreClient::connect(&config).unwrap();
        assert!(matches!(
            client.fetch_collection("EasyVisa", "bad"),
            Err(IngestError::InvalidDocument { index: 0, .. })
        ));
    }

    #[test]
    fn test_connect_missing_root() {
        let config = StoreConfig {
            url: "/nonexistent/store".to_string(),
            database_name: "EasyVisa".to_string(),
        };
        assert!(matches!(
            DocumentStoreClient::connect(&config),
            Err(IngestError::StoreUnavailable { .. })
        ));
    }
}
