//! # Error Types
//!
//! Domain-specific error types for pricestack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pricestack-core errors (this file)                                     │
//! │  ├── PricingError     - A bundle/cart item price build failed          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pricestack-catalog errors (separate crate)                             │
//! │  └── CatalogError     - Fixture/config loading failures                │
//! │                                                                         │
//! │  Flow: ValidationError → PricingError → CatalogError → caller          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recoverable vs Fatal
//! ```text
//! ┌──────────────────────────────┬─────────────┬──────────────────────────┐
//! │ Variant                      │ Recoverable │ Caller usually...        │
//! ├──────────────────────────────┼─────────────┼──────────────────────────┤
//! │ StructuralMismatch           │ yes         │ drops the line item      │
//! │ MissingPriceTier             │ yes         │ marks item unavailable   │
//! │ ConstituentUnpriced          │ yes         │ marks item unavailable   │
//! │ Validation                   │ yes         │ rejects the request      │
//! │ InvalidStructure             │ no          │ alerts: corrupted cart   │
//! │ UnsupportedPricingSchedule   │ no          │ alerts: catalog setup    │
//! │ UnsupportedOperation         │ no          │ alerts: programming bug  │
//! └──────────────────────────────┴─────────────┴──────────────────────────┘
//! ```
//!
//! Errors are deterministic functions of cart and catalog state, so nothing
//! here is ever retried.

use thiserror::Error;

// =============================================================================
// Pricing Error
// =============================================================================

/// Failures of a single cart-item price build.
///
/// Any of these aborts the whole `build` for that cart item.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Cart and catalog trees disagree: a cart child has no constituent at
    /// the same `ordering`.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart bundle item            Catalog bundle
    ///  ├── ordering 1 (WIDGET)     ├── ordering 1
    ///  └── ordering 5 (GADGET) ✗   └── ordering 2
    ///                │
    ///                ▼
    /// StructuralMismatch { sku_code: "GADGET", ordering: 5 }
    ///                │
    ///                ▼
    /// UI shows: "GADGET is no longer part of this bundle"
    /// ```
    #[error("Cart item {sku_code} at ordering {ordering} has no matching bundle constituent")]
    StructuralMismatch { sku_code: String, ordering: i32 },

    /// A cart item has children but the constituent it matched is not a
    /// bundle. Indicates corrupted cart state.
    #[error("Cart item {sku_code} has bundle items but constituent {constituent_guid} is not a bundle")]
    InvalidStructure {
        sku_code: String,
        constituent_guid: String,
    },

    /// No price tier exists for the requested quantity.
    #[error("No price tier for {sku_code} at quantity {quantity}")]
    MissingPriceTier { sku_code: String, quantity: i64 },

    /// A calculated-bundle constituent price exposes other than exactly one
    /// pricing schedule.
    #[error("Constituent {sku_code} has {schedules} pricing schedules, expected exactly one")]
    UnsupportedPricingSchedule { sku_code: String, schedules: usize },

    /// The requested algorithm does not apply to this item (e.g. the
    /// calculated builder was handed a non-calculated sku).
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A calculated-bundle constituent has no promoted price at all.
    #[error("Bundle constituent item has no price for bundle item {sku_code}")]
    ConstituentUnpriced { sku_code: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl PricingError {
    /// True when the caller may drop the line item and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PricingError::StructuralMismatch { .. }
                | PricingError::MissingPriceTier { .. }
                | PricingError::ConstituentUnpriced { .. }
                | PricingError::Validation(_)
        )
    }

    /// The sku code to show the shopper, when the error is about one item.
    pub fn sku_code(&self) -> Option<&str> {
        match self {
            PricingError::StructuralMismatch { sku_code, .. }
            | PricingError::InvalidStructure { sku_code, .. }
            | PricingError::MissingPriceTier { sku_code, .. }
            | PricingError::UnsupportedPricingSchedule { sku_code, .. }
            | PricingError::ConstituentUnpriced { sku_code } => Some(sku_code),
            PricingError::UnsupportedOperation(_) | PricingError::Validation(_) => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any pricing work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two siblings at the same ordering).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================
