use anyhow::Context;
use async_trait::async_trait;
use loculate_core::state::StoreRecord;
use loculate_engine::traits::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

fn pick(data: &StoreRecord, keys: &[&str]) -> StoreRecord {
    keys.iter()
        .filter_map(|k| data.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

/// Process-local store. Useful for tests and for hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: StoreRecord) -> Self {
        Self {
            data: Mutex::new(record),
        }
    }

    pub fn snapshot(&self) -> StoreRecord {
        self.data
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> anyhow::Result<StoreRecord> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(pick(&data, keys))
    }

    async fn set(&self, record: StoreRecord) -> anyhow::Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        data.extend(record);
        Ok(())
    }
}

/// Store persisted as one JSON object on disk.
///
/// Every call re-reads the file, so separate processes sharing the path see each
/// other's writes on their next access. Writes from this handle are serialized;
/// writes from other processes are last-writer-wins per file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> anyhow::Result<StoreRecord> {
        if !self.path.exists() {
            return Ok(StoreRecord::new());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read store: {}", self.path.display()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoreRecord::new());
        }
        serde_json::from_slice(&bytes)
            .with_context(|| format!("decode store JSON: {}", self.path.display()))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> anyhow::Result<StoreRecord> {
        let data = self.read_all()?;
        Ok(pick(&data, keys))
    }

    async fn set(&self, record: StoreRecord) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_all()?;
        data.extend(record);
        crate::fs::write_json_atomic(&self.path, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> StoreRecord {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn memory_get_returns_only_present_keys() {
        let store = MemoryStore::with_record(record(json!({"a": 1, "b": 2})));
        let got = store.get(&["a", "missing"]).await.unwrap();
        assert_eq!(got, record(json!({"a": 1})));
    }

    #[tokio::test]
    async fn memory_set_merges() {
        let store = MemoryStore::new();
        store.set(record(json!({"a": 1}))).await.unwrap();
        store.set(record(json!({"b": 2}))).await.unwrap();
        store.set(record(json!({"a": 3}))).await.unwrap();
        assert_eq!(store.snapshot(), record(json!({"a": 3, "b": 2})));
    }

    #[tokio::test]
    async fn file_store_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let first = JsonFileStore::at_path(&path);
        first
            .set(record(json!({"savedOrigins": ["A"], "selectedOriginIndex": 0})))
            .await
            .unwrap();
        first.set(record(json!({"theme": "dark"}))).await.unwrap();

        let second = JsonFileStore::at_path(&path);
        let got = second
            .get(&["savedOrigins", "theme", "selectedText"])
            .await
            .unwrap();
        assert_eq!(got, record(json!({"savedOrigins": ["A"], "theme": "dark"})));
    }

    #[tokio::test]
    async fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::at_path(dir.path().join("state.json"));
        assert!(store.get(&["theme"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::at_path(path).get(&["theme"]).await.is_err());
    }
}
