//! Named dataset storage
//!
//! A dataset is a JSON array of rows stored under a short name such as
//! `predictions` or `rosters`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::StoreError;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Abstract trait for dataset backends
#[async_trait::async_trait]
pub trait DatasetStore: Send + Sync {
    /// Read every row of a dataset
    async fn read_dataset(&self, name: &str) -> StoreResult<Vec<Value>>;

    /// Replace a dataset with `rows`
    async fn write_dataset(&self, name: &str, rows: Vec<Value>) -> StoreResult<()>;

    /// Names of all stored datasets, sorted
    async fn list_datasets(&self) -> StoreResult<Vec<String>>;
}

/// Read a dataset and deserialize each row
pub async fn read_rows<T: DeserializeOwned, S: DatasetStore + ?Sized>(
    store: &S,
    name: &str,
) -> StoreResult<Vec<T>> {
    store
        .read_dataset(name)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

/// Serialize rows and write them as a dataset
pub async fn write_rows<T: Serialize, S: DatasetStore + ?Sized>(
    store: &S,
    name: &str,
    rows: &[T],
) -> StoreResult<()> {
    let values = rows.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
    store.write_dataset(name, values).await
}

fn validate_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Local file-based store: one `<name>.json` file per dataset
pub struct LocalDatasetStore {
    data_dir: PathBuf,
}

impl LocalDatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn dataset_path(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.data_dir.join(format!("{name}.json")))
    }
}

#[async_trait::async_trait]
impl DatasetStore for LocalDatasetStore {
    async fn read_dataset(&self, name: &str) -> StoreResult<Vec<Value>> {
        let path = self.dataset_path(name)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let rows: Vec<Value> = serde_json::from_str(&content)?;
        tracing::debug!("Read {} rows from dataset {}", rows.len(), name);
        Ok(rows)
    }

    async fn write_dataset(&self, name: &str, rows: Vec<Value>) -> StoreResult<()> {
        let path = self.dataset_path(name)?;
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let content = serde_json::to_string_pretty(&rows)?;
        tokio::fs::write(&path, content).await?;
        tracing::debug!("Wrote {} rows to dataset {}", rows.len(), name);
        Ok(())
    }

    async fn list_datasets(&self) -> StoreResult<Vec<String>> {
        if !tokio::fs::try_exists(&self.data_dir).await? {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory store (for testing)
#[derive(Default)]
pub struct InMemoryDatasetStore {
    datasets: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DatasetStore for InMemoryDatasetStore {
    async fn read_dataset(&self, name: &str) -> StoreResult<Vec<Value>> {
        validate_name(name)?;
        let datasets = self.datasets.read().await;
        datasets.get(name).cloned().ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn write_dataset(&self, name: &str, rows: Vec<Value>) -> StoreResult<()> {
        validate_name(name)?;
        let mut datasets = self.datasets.write().await;
        datasets.insert(name.to_string(), rows);
        Ok(())
    }

    async fn list_datasets(&self) -> StoreResult<Vec<String>> {
        let datasets = self.datasets.read().await;
        let mut names: Vec<String> = datasets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        pred: f64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: "13604".to_string(), pred: 212.5 },
            Row { id: "0501".to_string(), pred: 120.0 },
        ]
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDatasetStore::new(temp_dir.path().join("datasets"));

        write_rows(&store, "predictions", &rows()).await.unwrap();
        let loaded: Vec<Row> = read_rows(&store, "predictions").await.unwrap();
        assert_eq!(loaded, rows());
        assert!(temp_dir.path().join("datasets").join("predictions.json").exists());
    }

    #[tokio::test]
    async fn test_local_store_lists_datasets() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDatasetStore::new(temp_dir.path());
        assert!(store.list_datasets().await.unwrap().is_empty());

        write_rows(&store, "rosters", &rows()).await.unwrap();
        write_rows(&store, "franchises", &rows()).await.unwrap();
        assert_eq!(store.list_datasets().await.unwrap(), vec!["franchises", "rosters"]);
    }

    #[tokio::test]
    async fn test_missing_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDatasetStore::new(temp_dir.path());
        let result = store.read_dataset("predictions").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dataset_names_cannot_escape_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDatasetStore::new(temp_dir.path());
        let result = store.write_dataset("../outside", Vec::new()).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryDatasetStore::new();
        assert!(matches!(store.read_dataset("live_scoring").await, Err(StoreError::NotFound(_))));

        write_rows(&store, "live_scoring", &rows()).await.unwrap();
        let loaded: Vec<Row> = read_rows(&store, "live_scoring").await.unwrap();
        assert_eq!(loaded, rows());
        assert_eq!(store.list_datasets().await.unwrap(), vec!["live_scoring"]);
    }
}
