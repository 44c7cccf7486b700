//! # Validation Module
//!
//! Input checks run before any pricing work starts.
//!
//! ## What a Cart Tree Must Satisfy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GIFT-BOX qty 2              depth 1                                    │
//! │   ├── ordering 1 MUG qty 2   depth 2   quantity in 1..=MAX_ITEM_QUANTITY│
//! │   └── ordering 3 TEA qty 2   depth 2   orderings unique among siblings  │
//! │        └── ordering 1 ...    depth 3   depth <= MAX_BUNDLE_DEPTH        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricestack_core::validation::{validate_quantity, validate_price_list_guid};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! assert!(validate_price_list_guid("PL-RETAIL").is_ok());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::CartItemNode;
use crate::{MAX_BUNDLE_DEPTH, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Scalar Validators
// =============================================================================

/// Validates an order quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (9999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price-list guid.
pub fn validate_price_list_guid(guid: &str) -> ValidationResult<()> {
    validate_required("price_list_guid", guid)
}

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Tree Validators
// =============================================================================

/// Validates a whole cart item tree.
///
/// ## Rules
/// - Every node has a sku guid and a valid quantity
/// - Sibling `ordering` values are unique
/// - The tree is at most MAX_BUNDLE_DEPTH levels deep
pub fn validate_cart_tree(root: &CartItemNode) -> ValidationResult<()> {
    validate_node(root, 1)
}

fn validate_node(node: &CartItemNode, depth: usize) -> ValidationResult<()> {
    if depth > MAX_BUNDLE_DEPTH {
        return Err(ValidationError::OutOfRange {
            field: "bundle depth".to_string(),
            min: 1,
            max: MAX_BUNDLE_DEPTH as i64,
        });
    }

    validate_required("sku", &node.sku.guid)?;
    validate_quantity(node.quantity)?;

    let mut seen = HashSet::with_capacity(node.children.len());
    for child in &node.children {
        if !seen.insert(child.ordering) {
            return Err(ValidationError::Duplicate {
                field: "ordering".to_string(),
                value: child.ordering.to_string(),
            });
        }
    }

    for child in &node.children {
        validate_node(child, depth + 1)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
