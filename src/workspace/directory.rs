use crate::error::{ProcessingError, Result};
use crate::models::Dataset;
use crate::readers::read_point_shapefile;
use crate::utils::constants::{LOCK_EXTENSION, SHAPEFILE_COMPONENTS, SHAPEFILE_EXTENSION};
use crate::workspace::{DatasetLock, FeatureStore};
use crate::writers::ShapefileWriter;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::debug;

/// Shapefile datasets stored side by side in one directory.
///
/// Writes land in a scratch directory inside the workspace first, then each
/// component file is renamed into place on its own. A single rename is atomic
/// but the set is not: a replace that fails partway can leave new and old
/// components side by side. The `.shp` is renamed last, so a dataset that did
/// not exist before only shows up once its other components are in place.
pub struct DirectoryWorkspace {
    root: PathBuf,
    writer: ShapefileWriter,
}

impl DirectoryWorkspace {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            writer: ShapefileWriter::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.component_path(name, SHAPEFILE_EXTENSION)
    }

    fn component_path(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, extension))
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.component_path(name, LOCK_EXTENSION)
    }
}

/// Component extensions in the order a write renames them into place.
fn rename_order() -> impl Iterator<Item = &'static str> {
    SHAPEFILE_COMPONENTS
        .into_iter()
        .filter(|extension| *extension != SHAPEFILE_EXTENSION)
        .chain(std::iter::once(SHAPEFILE_EXTENSION))
}

impl FeatureStore for DirectoryWorkspace {
    fn exists(&self, name: &str) -> bool {
        self.dataset_path(name).exists()
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_shapefile = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(SHAPEFILE_EXTENSION))
                .unwrap_or(false);
            if is_shapefile {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_dataset(&self, name: &str) -> Result<Dataset> {
        let path = self.dataset_path(name);
        if !path.exists() {
            return Err(ProcessingError::DatasetNotFound {
                name: name.to_string(),
            });
        }
        read_point_shapefile(name, &path)
    }

    fn write_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        let scratch = Builder::new().prefix(".staging-").tempdir_in(&self.root)?;
        let staged = scratch
            .path()
            .join(format!("{}.{}", dataset.name, SHAPEFILE_EXTENSION));
        self.writer.write_dataset(dataset, &staged)?;

        for extension in rename_order() {
            let source = scratch
                .path()
                .join(format!("{}.{}", dataset.name, extension));
            let target = self.component_path(&dataset.name, extension);
            if source.exists() {
                fs::rename(&source, &target)?;
            } else if target.exists() {
                // stale component from an earlier write
                fs::remove_file(&target)?;
            }
        }

        debug!(
            "Persisted {} ({} records) in {}",
            dataset.name,
            dataset.len(),
            self.root.display()
        );
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let mut removed = false;
        for extension in SHAPEFILE_COMPONENTS {
            let path = self.component_path(name, extension);
            if path.exists() {
                fs::remove_file(&path)?;
                removed = true;
            }
        }
        if !removed {
            return Err(ProcessingError::DatasetNotFound {
                name: name.to_string(),
            });
        }
        debug!("Deleted {} from {}", name, self.root.display());
        Ok(())
    }

    fn lock(&self, name: &str) -> Result<DatasetLock> {
        let path = self.lock_path(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ProcessingError::DatasetLocked {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let lock = DatasetLock::file(name, path);
        writeln!(file, "{}", std::process::id())?;
        Ok(lock)
    }

    fn is_locked(&self, name: &str) -> bool {
        self.lock_path(name).exists()
    }
}
