//! Startup data load.
//!
//! Reads the dataset file (a JSON array of objects) and inserts every record
//! into the store in one batch. Runs once, from `main`, before the HTTP
//! listener is bound; any failure here is fatal to startup.
//!
//! Whether an already-populated collection gets another copy is decided by
//! [`LoadMode`]. The default, `append`, duplicates every record on each
//! restart against a persistent database.

use std::path::{Path, PathBuf};

use mongodb::bson::Document;
use serde_json::Value;

use crate::config::{DatasetConfig, LoadMode};
use crate::record::json_to_document;
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset must be a JSON array of objects, found {found}")]
    NotAnArray { found: &'static str },

    #[error("Dataset element {index} is not a JSON object, found {found}")]
    NotAnObject { index: usize, found: &'static str },

    #[error("Dataset element {index} cannot be stored: {source}")]
    Encode {
        index: usize,
        #[source]
        source: mongodb::bson::ser::Error,
    },

    #[error("Failed to load dataset into the store: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of the bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub mode: LoadMode,
    /// Documents in the collection before loading
    pub existing: u64,
    /// Documents removed by `replace`
    pub removed: u64,
    pub inserted: u64,
    /// True when `skip-if-populated` left the collection untouched
    pub skipped: bool,
}

/// Read `path` and decode it into documents ready for insertion.
pub async fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<Document>, BootstrapError> {
    let path = path.as_ref();
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| BootstrapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let value: Value =
        serde_json::from_slice(&contents).map_err(|source| BootstrapError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    parse_records(value)
}

/// Decode a JSON value that must be an array of objects.
pub fn parse_records(value: Value) -> Result<Vec<Document>, BootstrapError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(BootstrapError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => {
                json_to_document(object).map_err(|source| BootstrapError::Encode { index, source })
            }
            other => Err(BootstrapError::NotAnObject {
                index,
                found: json_kind(other),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Insert `documents` into `store` according to `mode`.
///
/// An empty dataset issues no insert call; document databases reject empty
/// batches.
pub async fn load_documents(
    store: &dyn DocumentStore,
    documents: Vec<Document>,
    mode: LoadMode,
) -> Result<BootstrapReport, BootstrapError> {
    let existing = store.count().await?;
    let mut report = BootstrapReport {
        mode,
        existing,
        removed: 0,
        inserted: 0,
        skipped: false,
    };

    match mode {
        LoadMode::Append if existing > 0 => {
            tracing::warn!(
                existing,
                incoming = documents.len(),
                "Collection already populated, appending another copy of the dataset"
            );
        }
        LoadMode::Append => {}
        LoadMode::Replace => {
            report.removed = store.clear().await?;
            tracing::debug!(removed = report.removed, "Cleared collection before load");
        }
        LoadMode::SkipIfPopulated if existing > 0 => {
            tracing::info!(existing, "Collection already populated, skipping dataset load");
            report.skipped = true;
            return Ok(report);
        }
        LoadMode::SkipIfPopulated => {}
    }

    if !documents.is_empty() {
        report.inserted = store.insert_many(documents).await?;
    }

    Ok(report)
}

/// Run the full bootstrap step: read the configured dataset and load it.
pub async fn run(
    store: &dyn DocumentStore,
    config: &DatasetConfig,
) -> Result<BootstrapReport, BootstrapError> {
    let documents = read_dataset(&config.path).await?;
    tracing::debug!(
        path = %config.path,
        records = documents.len(),
        "Read dataset"
    );

    let report = load_documents(store, documents, config.load_mode).await?;
    tracing::info!(
        backend = store.backend_name(),
        mode = %report.mode,
        existing = report.existing,
        removed = report.removed,
        inserted = report.inserted,
        skipped = report.skipped,
        "Dataset loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::io::Write;

    fn write_dataset(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn dataset_config(path: &Path, load_mode: LoadMode) -> DatasetConfig {
        DatasetConfig {
            path: path.to_string_lossy().into_owned(),
            load_mode,
        }
    }

    #[test]
    fn rejects_non_array_top_level() {
        let err = parse_records(json!({ "name": "a" })).unwrap_err();
        assert!(matches!(err, BootstrapError::NotAnArray { found: "an object" }));
    }

    #[test]
    fn rejects_non_object_elements() {
        let err = parse_records(json!([{ "name": "a" }, 3])).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::NotAnObject {
                index: 1,
                found: "a number"
            }
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset(dir.path().join("jsondata.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let file = write_dataset("[{\"name\": ");
        let err = read_dataset(file.path()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Parse { .. }));
    }

    #[tokio::test]
    async fn loads_every_record_into_a_fresh_store() {
        let file = write_dataset(r#"[{"name":"a"},{"name":"b"},{"name":"c","intensity":6}]"#);
        let store = MemoryStore::new();

        let report = run(&store, &dataset_config(file.path(), LoadMode::Append))
            .await
            .unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(report.existing, 0);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn shipped_dataset_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/jsondata.json");
        let documents = read_dataset(&path).await.unwrap();
        assert_eq!(documents.len(), 3);
        assert!(documents.iter().all(|d| d.contains_key("intensity")));
    }

    #[tokio::test]
    async fn empty_dataset_inserts_nothing() {
        let file = write_dataset("[]");
        let store = MemoryStore::new();

        let report = run(&store, &dataset_config(file.path(), LoadMode::Append))
            .await
            .unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn append_duplicates_on_repeated_runs() {
        let file = write_dataset(r#"[{"name":"a"},{"name":"b"}]"#);
        let store = MemoryStore::new();
        let config = dataset_config(file.path(), LoadMode::Append);

        run(&store, &config).await.unwrap();
        let second = run(&store, &config).await.unwrap();

        assert_eq!(second.existing, 2);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn append_twice_with_explicit_ids_fails() {
        let file = write_dataset(r#"[{"_id":"a","name":"a"},{"_id":"b","name":"b"}]"#);
        let store = MemoryStore::new();
        let config = dataset_config(file.path(), LoadMode::Append);

        run(&store, &config).await.unwrap();
        let err = run(&store, &config).await.unwrap_err();

        assert!(matches!(err, BootstrapError::Store(StoreError::DuplicateKey(_))));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_reloads_explicit_ids() {
        let file = write_dataset(r#"[{"_id":"a","name":"a"}]"#);
        let store = MemoryStore::new();
        let config = dataset_config(file.path(), LoadMode::Replace);

        run(&store, &config).await.unwrap();
        run(&store, &config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_keeps_a_single_copy() {
        let file = write_dataset(r#"[{"name":"a"},{"name":"b"}]"#);
        let store = MemoryStore::new();
        let config = dataset_config(file.path(), LoadMode::Replace);

        run(&store, &config).await.unwrap();
        let second = run(&store, &config).await.unwrap();

        assert_eq!(second.removed, 2);
        assert_eq!(second.inserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn skip_if_populated_leaves_existing_data() {
        let file = write_dataset(r#"[{"name":"a"},{"name":"b"}]"#);
        let store = MemoryStore::new();
        let config = dataset_config(file.path(), LoadMode::SkipIfPopulated);

        let first = run(&store, &config).await.unwrap();
        let second = run(&store, &config).await.unwrap();

        assert!(!first.skipped);
        assert!(second.skipped);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn store_failure_aborts_bootstrap() {
        let store = MemoryStore::new();
        store.shutdown().await;
        let documents = parse_records(json!([{ "name": "a" }])).unwrap();

        let err = load_documents(&store, documents, LoadMode::Append)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Store(StoreError::Unavailable(_))));
    }
}
