use crate::errors::PersistenceError;
use crate::{config::StateStoreConfig, policies::Policy};

use std::{collections::HashMap, fs::File, io::BufReader, io::ErrorKind, path::Path};
use tracing::info;
use uuid::Uuid;

/// JSON snapshot of trained policies keyed by run id.
pub struct StateStore {
    config: StateStoreConfig,
}

impl StateStore {
    pub fn new(config: StateStoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Reads every stored policy. A missing file is an empty store.
    pub fn load(&self) -> Result<HashMap<Uuid, Box<dyn Policy>>, PersistenceError> {
        let file = match File::open(&self.config.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => return Err(err.into()),
        };

        let storage: HashMap<Uuid, Box<dyn Policy>> =
            serde_json::from_reader(BufReader::new(file))?;
        info!(path = ?self.config.path, policies = storage.len(), "Loaded state store");

        Ok(storage)
    }

    pub fn save(&self, storage: &HashMap<Uuid, Box<dyn Policy>>) -> Result<(), PersistenceError> {
        if storage.is_empty() {
            return Ok(());
        }

        info!(
            path = ?self.config.path,
            policies = storage.len(),
            "Persisting state store"
        );

        let serialized = serde_json::to_string(storage)?;
        std::fs::write(&self.config.path, serialized)?;
        Ok(())
    }
}
