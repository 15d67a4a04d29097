use crate::error::Result;
use crate::models::{Dataset, PlayerRecord};
use crate::workspace::{DatasetLock, FeatureStore};
use tracing::debug;

/// Scoped read-write access to one persisted dataset.
///
/// Opening the cursor takes the dataset's exclusive lock. `commit` persists
/// the edited rows; dropping the cursor without committing discards them.
/// Either way the lock is released when the cursor goes away.
pub struct UpdateCursor<'s, S: FeatureStore + ?Sized> {
    store: &'s mut S,
    dataset: Dataset,
    lock: DatasetLock,
}

impl<'s, S: FeatureStore + ?Sized> UpdateCursor<'s, S> {
    pub fn open(store: &'s mut S, name: &str) -> Result<Self> {
        let lock = store.lock(name)?;
        let dataset = store.read_dataset(name)?;
        debug!("Opened update cursor on {} ({} rows)", name, dataset.len());
        Ok(Self {
            store,
            dataset,
            lock,
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn rows(&mut self) -> std::slice::IterMut<'_, PlayerRecord> {
        self.dataset.records.iter_mut()
    }

    /// Persist the rows and release the lock. Returns the number of rows.
    pub fn commit(self) -> Result<usize> {
        let UpdateCursor {
            store,
            dataset,
            lock,
        } = self;
        store.write_dataset(&dataset)?;
        debug!("Committed {} rows to {}", dataset.len(), lock.name());
        drop(lock);
        Ok(dataset.len())
    }
}
