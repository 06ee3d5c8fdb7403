//! Where the roster lives and which slot catalog it uses.

use std::path::PathBuf;

use directories::ProjectDirs;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::Result;
use crate::schedule::Catalog;
use crate::store::Store;

/// Snapshot file name inside the data directory
const STATE_FILE: &str = "state.json";

/// Default snapshot path in the platform data dir, falling back to the working directory
pub fn default_state_path() -> PathBuf {
    ProjectDirs::from("dk", "weekend", "weekend-roster")
        .map(|dirs| dirs.data_dir().join(STATE_FILE))
        .unwrap_or_else(|| PathBuf::from(STATE_FILE))
}

/// Resolved runtime settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub state_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    /// Fixed seed for reproducible distribution runs
    pub seed: Option<u64>,
}

impl Settings {
    pub fn store(&self) -> Store {
        Store::new(self.state_path.clone().unwrap_or_else(default_state_path))
    }

    /// The built-in catalog unless a catalog file was given
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => {
                let catalog = Catalog::load(path)?;
                info!(path = %path.display(), tasks = catalog.tasks.len(), cleaning = catalog.cleaning.len(), "loaded slot catalog");
                Ok(catalog)
            }
            None => Ok(Catalog::default()),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
