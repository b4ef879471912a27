// SPDX-License-Identifier: AGPL-3.0
// Storefront CLI - Application State

use std::path::PathBuf;
use std::sync::Arc;
use storefront_core::{
    CartSettings, CartStore, FileStorage, KeyValueStorage, SettingsStore, StoreError,
};

/// Application state shared by every command
pub struct AppState {
    pub settings: SettingsStore,
    pub cart: CartStore,
}

impl AppState {
    /// Create application state with all stores initialized
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, StoreError> {
        let settings = match config_path {
            Some(path) => SettingsStore::at_path(path)?,
            None => SettingsStore::new()?,
        };

        let current = settings.get();
        let storage = Self::open_storage(&current)?;
        let cart = CartStore::load(storage, &current)?;

        Ok(Self { settings, cart })
    }

    fn open_storage(settings: &CartSettings) -> Result<Arc<dyn KeyValueStorage>, StoreError> {
        let storage = match &settings.storage_dir {
            Some(dir) => FileStorage::in_dir(dir)?,
            None => FileStorage::new()?,
        };
        Ok(Arc::new(storage))
    }
}
