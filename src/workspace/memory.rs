use crate::error::{ProcessingError, Result};
use crate::models::Dataset;
use crate::workspace::{DatasetLock, FeatureStore};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory store for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    datasets: BTreeMap<String, Dataset>,
    locks: Arc<Mutex<HashSet<String>>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureStore for MemoryWorkspace {
    fn exists(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.datasets.keys().cloned().collect())
    }

    fn read_dataset(&self, name: &str) -> Result<Dataset> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| ProcessingError::DatasetNotFound {
                name: name.to_string(),
            })
    }

    fn write_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        self.datasets.insert(dataset.name.clone(), dataset.clone());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.datasets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ProcessingError::DatasetNotFound {
                name: name.to_string(),
            })
    }

    fn lock(&self, name: &str) -> Result<DatasetLock> {
        let mut held = self
            .locks
            .lock()
            .map_err(|_| ProcessingError::Config("lock registry poisoned".to_string()))?;
        if !held.insert(name.to_string()) {
            return Err(ProcessingError::DatasetLocked {
                name: name.to_string(),
            });
        }
        Ok(DatasetLock::registry(name, Arc::clone(&self.locks)))
    }

    fn is_locked(&self, name: &str) -> bool {
        self.locks
            .lock()
            .map(|held| held.contains(name))
            .unwrap_or(true)
    }
}
