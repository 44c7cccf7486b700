//! # Engine Configuration
//!
//! Settings for the pricing engine host.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PRICESTACK_DEFAULT_CURRENCY=CAD                                    │
//! │     PRICESTACK_STORE_CODE=store-west                                   │
//! │                                                                         │
//! │  2. TOML Config File (--config PATH)                                   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, default-store, default-catalog, stack caching on              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! cache_price_list_stack = true
//! default_currency = "USD"
//!
//! [store]
//! code = "store-west"
//! catalog_code = "master"
//!
//! [fixture]
//! path = "fixtures/sample.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use pricestack_core::{CurrencyCode, FacadeOptions, Store};

use crate::error::{CatalogError, CatalogResult};

// =============================================================================
// Pricing Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Reuse a still-valid price-list stack cached on the session.
    #[serde(default = "default_true")]
    pub cache_price_list_stack: bool,

    /// Currency new sessions start in.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            cache_price_list_stack: true,
            default_currency: default_currency(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_code")]
    pub code: String,

    /// Catalog whose price-list assignments apply to this store.
    #[serde(default = "default_catalog_code")]
    pub catalog_code: String,
}

fn default_store_code() -> String {
    "default-store".to_string()
}

fn default_catalog_code() -> String {
    "default-catalog".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            code: default_store_code(),
            catalog_code: default_catalog_code(),
        }
    }
}

// =============================================================================
// Fixture Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSettings {
    /// Catalog/price-list fixture to load.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub fixture: FixtureSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file, when given and present
    /// 3. Environment variables
    pub fn load(config_path: Option<&Path>) -> CatalogResult<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => {
                info!(?path, "Loading engine config from file");
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> CatalogResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.store.code.trim().is_empty() {
            return Err(CatalogError::InvalidConfig(
                "store.code must not be empty".into(),
            ));
        }

        if self.store.catalog_code.trim().is_empty() {
            return Err(CatalogError::InvalidConfig(
                "store.catalog_code must not be empty".into(),
            ));
        }

        self.currency()?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PRICESTACK_CACHE_STACK") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.pricing.cache_price_list_stack = true,
                "0" | "false" | "no" | "off" => self.pricing.cache_price_list_stack = false,
                _ => warn!(value = %value, "Unknown PRICESTACK_CACHE_STACK value"),
            }
        }

        if let Some(currency) = lookup("PRICESTACK_DEFAULT_CURRENCY") {
            debug!(currency = %currency, "Overriding default currency from environment");
            self.pricing.default_currency = currency;
        }

        if let Some(code) = lookup("PRICESTACK_STORE_CODE") {
            debug!(store = %code, "Overriding store code from environment");
            self.store.code = code;
        }

        if let Some(code) = lookup("PRICESTACK_CATALOG_CODE") {
            debug!(catalog = %code, "Overriding catalog code from environment");
            self.store.catalog_code = code;
        }

        if let Some(path) = lookup("PRICESTACK_FIXTURE") {
            self.fixture.path = Some(PathBuf::from(path));
        }
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn currency(&self) -> CatalogResult<CurrencyCode> {
        Ok(CurrencyCode::parse(&self.pricing.default_currency)?)
    }

    pub fn store(&self) -> Store {
        Store::new(&self.store.code, &self.store.catalog_code)
    }

    pub fn facade_options(&self) -> FacadeOptions {
        FacadeOptions {
            cache_price_list_stack: self.pricing.cache_price_list_stack,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
