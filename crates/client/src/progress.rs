use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::ClientError;

/// Persisted upload progress, keyed by file name.
///
/// Holds the next chunk index to send. Written after each acknowledged
/// chunk and cleared on completion, so it always points at the first
/// unacknowledged chunk.
pub trait ProgressStore: Send + Sync {
    fn get(&self, file_name: &str) -> Result<Option<u32>, ClientError>;
    fn set(&self, file_name: &str, next_chunk: u32) -> Result<(), ClientError>;
    fn clear(&self, file_name: &str) -> Result<(), ClientError>;
}

/// In-memory progress store for tests and single-run sessions.
#[derive(Debug, Default)]
pub struct MemProgressStore {
    inner: Mutex<HashMap<String, u32>>,
}

impl MemProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemProgressStore {
    fn get(&self, file_name: &str) -> Result<Option<u32>, ClientError> {
        Ok(self.inner.lock().unwrap().get(file_name).copied())
    }

    fn set(&self, file_name: &str, next_chunk: u32) -> Result<(), ClientError> {
        self.inner
            .lock()
            .unwrap()
            .insert(file_name.to_string(), next_chunk);
        Ok(())
    }

    fn clear(&self, file_name: &str) -> Result<(), ClientError> {
        self.inner.lock().unwrap().remove(file_name);
        Ok(())
    }
}

/// File-backed progress store: one JSON object mapping file names to
/// the next chunk index, surviving process restarts.
#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<HashMap<String, u32>, ClientError> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, map: &HashMap<String, u32>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(map)?)?;
        Ok(())
    }
}

impl ProgressStore for JsonProgressStore {
    fn get(&self, file_name: &str) -> Result<Option<u32>, ClientError> {
        Ok(self.load()?.get(file_name).copied())
    }

    fn set(&self, file_name: &str, next_chunk: u32) -> Result<(), ClientError> {
        let mut map = self.load()?;
        map.insert(file_name.to_string(), next_chunk);
        self.save(&map)
    }

    fn clear(&self, file_name: &str) -> Result<(), ClientError> {
        let mut map = self.load()?;
        if map.remove(file_name).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}
