// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Settings persistence
//
// Settings are stored in a local JSON file next to the cart slot.
// No remote sync, the cart stays on the device until checkout.

use crate::pricing::{FlatRateTax, NoTax, PricingStrategy};
use crate::storage::validate_key;
use crate::types::StoreError;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tax applied on top of the cart subtotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    /// Include tax in the cart total
    #[serde(default)]
    pub enabled: bool,
    /// Fraction of the subtotal, 0.07 for 7%
    #[serde(default = "default_tax_rate", with = "crate::types::decimal_text")]
    pub rate: Decimal,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: default_tax_rate(),
        }
    }
}

/// Cart settings (frontend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSettings {
    /// Local storage slot holding the cart (default: "cartItems")
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Currency code sent to the payment provider
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub tax: TaxSettings,
    /// Override for the storage directory. None means the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_storage_key() -> String {
    "cartItems".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_tax_rate() -> Decimal {
    Decimal::new(7, 2)
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            currency: default_currency(),
            tax: TaxSettings::default(),
            storage_dir: None,
        }
    }
}

impl CartSettings {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_key(&self.storage_key)?;

        if self.currency.trim().is_empty() {
            return Err(StoreError::InvalidConfig("Currency is empty".to_string()));
        }

        // Reject bad rates even while tax is switched off
        FlatRateTax::new(self.tax.rate)?;

        Ok(())
    }

    /// Pricing strategy selected by these settings
    pub fn pricing_strategy(&self) -> Result<Box<dyn PricingStrategy>, StoreError> {
        if self.tax.enabled {
            Ok(Box::new(FlatRateTax::new(self.tax.rate)?))
        } else {
            Ok(Box::new(NoTax))
        }
    }
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<CartSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store in the platform config directory
    pub fn new() -> Result<Self, StoreError> {
        let file_path = Self::get_settings_path()?;
        Self::at_path(file_path)
    }

    /// Create a settings store backed by an explicit file
    pub fn at_path(file_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            tracing::info!("Loading settings from disk");
            let content = fs::read_to_string(&file_path)
                .map_err(|e| StoreError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                CartSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            CartSettings::default()
        };

        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                tracing::warn!("Invalid settings, using defaults: {}", e);
                CartSettings::default()
            }
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        // Persist default settings if file doesn't exist
        if !store.file_path.exists() {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    /// Get the path to the settings file
    fn get_settings_path() -> Result<PathBuf, StoreError> {
        let config_dir = directories::ProjectDirs::from("com", "storefront", "cart")
            .ok_or_else(|| StoreError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        Ok(config_dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist settings to disk
    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::FileIo(format!("Failed to create config dir: {}", e)))?;
        }

        let content = {
            let settings = self.settings.read();
            serde_json::to_string_pretty(&*settings).map_err(|e| {
                StoreError::Serialization(format!("Failed to serialize settings: {}", e))
            })?
        };

        fs::write(&self.file_path, content)
            .map_err(|e| StoreError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> CartSettings {
        self.settings.read().clone()
    }

    /// Validate, replace and persist settings
    pub fn update(&self, new_settings: CartSettings) -> Result<(), StoreError> {
        new_settings.validate()?;
        tracing::info!(
            "Updating settings, tax enabled: {}",
            new_settings.tax.enabled
        );
        {
            let mut settings = self.settings.write();
            *settings = new_settings;
        }

        let result = self.persist();
        if result.is_ok() {
            tracing::info!("Settings persisted successfully");
        } else {
            tracing::error!("Failed to persist settings: {:?}", result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CartSettings::default();
        assert_eq!(settings.storage_key, "cartItems");
        assert_eq!(settings.currency, "usd");
        assert!(!settings.tax.enabled);
        assert_eq!(settings.tax.rate, Decimal::new(7, 2));
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let settings: CartSettings =
            serde_json::from_str(r#"{ "tax": { "enabled": true } }"#).unwrap();
        assert_eq!(settings.storage_key, "cartItems");
        assert!(settings.tax.enabled);
        assert_eq!(settings.tax.rate, Decimal::new(7, 2));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = CartSettings::default();
        settings.storage_key = "../cart".to_string();
        assert!(settings.validate().is_err());

        let mut settings = CartSettings::default();
        settings.tax.rate = Decimal::new(2, 0);
        assert!(settings.validate().is_err());

        let mut settings = CartSettings::default();
        settings.currency = " ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_pricing_strategy_follows_tax_flag() {
        let mut settings = CartSettings::default();
        let subtotal = Decimal::new(100, 0);
        assert_eq!(settings.pricing_strategy().unwrap().total(subtotal), subtotal);

        settings.tax.enabled = true;
        assert_eq!(
            settings.pricing_strategy().unwrap().total(subtotal),
            Decimal::new(107, 0)
        );
    }

    #[test]
    fn test_store_creates_and_updates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::at_path(&path).unwrap();
        assert!(path.exists());

        let mut settings = store.get();
        settings.tax.enabled = true;
        store.update(settings).unwrap();

        let reopened = SettingsStore::at_path(&path).unwrap();
        assert!(reopened.get().tax.enabled);
    }

    #[test]
    fn test_store_recovers_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::at_path(&path).unwrap();
        assert_eq!(store.get(), CartSettings::default());
    }

    #[test]
    fn test_update_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at_path(dir.path().join("settings.json")).unwrap();

        let mut settings = store.get();
        settings.storage_key = String::new();
        assert!(store.update(settings).is_err());
        assert_eq!(store.get().storage_key, "cartItems");
    }
}
