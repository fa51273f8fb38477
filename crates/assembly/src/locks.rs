use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-upload-name mutual exclusion.
///
/// Handles are created on first use and removed when the upload's
/// scratch space is reclaimed, so the registry does not grow with
/// upload churn. Unrelated uploads never contend.
#[derive(Debug, Default)]
pub struct LockMap {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock handle for `name`, creating it if absent.
    pub fn get(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inner = self.inner.lock().unwrap();
        Arc::clone(
            inner
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Drops the registry entry for `name`.
    ///
    /// Existing handles stay valid; only the shared entry goes away.
    pub fn remove(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.remove(name);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
