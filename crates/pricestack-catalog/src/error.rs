//! # Catalog Error Types
//!
//! Errors raised while loading configuration and fixtures, or while pricing
//! through the in-memory collaborators.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  std::io / toml::de / serde_json                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogError (this module) ◄── PricingError (pricestack-core)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price-cart prints it and exits non-zero                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pricestack_core::PricingError;
use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    // =========================================================================
    // Loading Errors
    // =========================================================================
    /// A config or fixture file could not be read.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// A config or fixture file is not valid TOML for its schema.
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Output could not be rendered as JSON.
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    // =========================================================================
    // Content Errors
    // =========================================================================
    /// Configuration values are present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fixture refers to something it never defines.
    ///
    /// ## When This Occurs
    /// - A bundle constituent names an unknown sku or bundle
    /// - A cart item names an unknown sku
    /// - An assignment or base amount names an unknown price list
    #[error("Fixture references unknown {kind} '{reference}'")]
    UnknownReference { kind: String, reference: String },

    /// A fixture is well-formed TOML but semantically wrong.
    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    // =========================================================================
    // Pricing Errors
    // =========================================================================
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl CatalogError {
    pub(crate) fn unknown(kind: &str, reference: impl Into<String>) -> Self {
        CatalogError::UnknownReference {
            kind: kind.to_string(),
            reference: reference.into(),
        }
    }

    /// True for problems in config or fixture files rather than pricing.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Toml(_)
                | CatalogError::InvalidConfig(_)
                | CatalogError::UnknownReference { .. }
                | CatalogError::InvalidFixture(_)
        )
    }
}

impl From<pricestack_core::ValidationError> for CatalogError {
    fn from(err: pricestack_core::ValidationError) -> Self {
        CatalogError::InvalidConfig(err.to_string())
    }
}
