use super::{svmlight, Dataset};

use crate::errors::DatasetError;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone, Debug, Deserialize)]
pub struct DatasetPaths {
    pub train: PathBuf,
    pub test: PathBuf,
}

/// Named train/test pairs, loaded on first use and shared afterwards.
pub struct DatasetCatalog {
    paths: HashMap<String, DatasetPaths>,
    train: Mutex<HashMap<String, Arc<Dataset>>>,
    test: Mutex<HashMap<String, Arc<Dataset>>>,
}

impl DatasetCatalog {
    pub fn new(paths: HashMap<String, DatasetPaths>) -> Self {
        Self {
            paths,
            train: Mutex::new(HashMap::new()),
            test: Mutex::new(HashMap::new()),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    fn paths(&self, name: &str) -> Result<&DatasetPaths, DatasetError> {
        self.paths
            .get(name)
            .ok_or_else(|| DatasetError::UnknownDataset(name.to_string()))
    }

    pub fn load_train(&self, name: &str) -> Result<Arc<Dataset>, DatasetError> {
        let mut cache = self.train.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = cache.get(name) {
            return Ok(Arc::clone(dataset));
        }

        let path = &self.paths(name)?.train;
        info!(dataset = name, path = ?path, "Loading training set");
        let dataset = Arc::new(svmlight::load(path, 0)?);
        cache.insert(name.to_string(), Arc::clone(&dataset));

        Ok(dataset)
    }

    /// Test sets are padded to the width of their training set and share its classes.
    pub fn load_test(&self, name: &str) -> Result<Arc<Dataset>, DatasetError> {
        let train = self.load_train(name)?;

        let mut cache = self.test.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = cache.get(name) {
            return Ok(Arc::clone(dataset));
        }

        let path = &self.paths(name)?.test;
        info!(dataset = name, path = ?path, "Loading test set");
        let dataset = Arc::new(svmlight::load_with_classes(
            path,
            train.d(),
            train.classes(),
        )?);
        cache.insert(name.to_string(), Arc::clone(&dataset));

        Ok(dataset)
    }
}
