//! Persistence for output datasets.
//!
//! A [`FeatureStore`] is the storage layer the pipeline writes through. It
//! persists named point datasets, extends their schema, and hands out
//! exclusive [`DatasetLock`]s. Record-level updates go through an
//! [`UpdateCursor`], which holds the lock for its whole lifetime and releases
//! it on every exit path.

pub mod cursor;
pub mod directory;
pub mod memory;

pub use cursor::UpdateCursor;
pub use directory::DirectoryWorkspace;
pub use memory::MemoryWorkspace;

use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, FieldDef};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub trait FeatureStore {
    fn exists(&self, name: &str) -> bool;

    /// Dataset names in the store, sorted.
    fn list(&self) -> Result<Vec<String>>;

    fn read_dataset(&self, name: &str) -> Result<Dataset>;

    /// Persist `dataset` under its name, replacing any existing dataset.
    fn write_dataset(&mut self, dataset: &Dataset) -> Result<()>;

    fn delete(&mut self, name: &str) -> Result<()>;

    /// Take the exclusive lock on a dataset.
    fn lock(&self, name: &str) -> Result<DatasetLock>;

    fn is_locked(&self, name: &str) -> bool;

    /// Persist a selection as a new dataset. With `overwrite` disabled an
    /// existing dataset of the same name is an error.
    fn copy_features(&mut self, dataset: &Dataset, overwrite: bool) -> Result<()> {
        if self.is_locked(&dataset.name) {
            return Err(ProcessingError::DatasetLocked {
                name: dataset.name.clone(),
            });
        }
        if !overwrite && self.exists(&dataset.name) {
            return Err(ProcessingError::DatasetExists {
                name: dataset.name.clone(),
            });
        }
        self.write_dataset(dataset)
    }

    /// Append null-initialised columns to a persisted dataset. Columns whose
    /// name is already present are left alone. Returns the number added.
    fn add_fields(&mut self, name: &str, fields: &[FieldDef]) -> Result<usize> {
        let lock = self.lock(name)?;
        let mut dataset = self.read_dataset(name)?;
        let added = dataset.add_fields(fields);
        if added > 0 {
            self.write_dataset(&dataset)?;
        }
        drop(lock);
        debug!("Added {} fields to {}", added, name);
        Ok(added)
    }
}

/// Exclusive hold on a dataset, released when dropped.
#[derive(Debug)]
pub struct DatasetLock {
    name: String,
    release: LockRelease,
}

#[derive(Debug)]
enum LockRelease {
    File(PathBuf),
    Registry(Arc<Mutex<HashSet<String>>>),
}

impl DatasetLock {
    pub(crate) fn file(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            release: LockRelease::File(path),
        }
    }

    pub(crate) fn registry(name: &str, registry: Arc<Mutex<HashSet<String>>>) -> Self {
        Self {
            name: name.to_string(),
            release: LockRelease::Registry(registry),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for DatasetLock {
    fn drop(&mut self) {
        match &self.release {
            LockRelease::File(path) => {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to release lock on {}: {}", self.name, e);
                }
            }
            LockRelease::Registry(registry) => match registry.lock() {
                Ok(mut held) => {
                    held.remove(&self.name);
                }
                Err(poisoned) => {
                    poisoned.into_inner().remove(&self.name);
                }
            },
        }
        debug!("Released lock on {}", self.name);
    }
}
