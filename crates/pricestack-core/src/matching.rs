//! # Cart ↔ Bundle Tree Matching
//!
//! Pairs cart children with bundle constituents by `ordering`, depth by depth.
//!
//! ```text
//! match_bundle_items(cart GIFT-BOX, bundle GIFT-BOX)
//!   ordering 1 MUG      → c-mug                  (sku, leaf)
//!   ordering 3 TEA-SET  → c-tea                  (bundle, recurse)
//!       ordering 1 GREEN → c-green
//!       ordering 2 BLACK → c-black
//!
//! result: { cart-guid → constituent-guid, ... }
//! ```
//!
//! The map is built in an accumulator passed down the recursion; nothing is
//! shared between calls.

use std::collections::HashMap;

use crate::error::{PricingError, PricingResult};
use crate::types::{BundleDefinition, CartItemNode, ConstituentItem};

/// Cart-item guid → constituent guid.
pub type ItemMatches = HashMap<String, String>;

/// Matches `item`'s children against `bundle`'s constituents, recursively.
///
/// ## Errors
/// - `StructuralMismatch` when a cart child has no constituent at its ordering
/// - `InvalidStructure` when a cart child has children but its constituent
///   is a plain sku
pub fn match_bundle_items(item: &CartItemNode, bundle: &BundleDefinition) -> PricingResult<ItemMatches> {
    let mut matches = ItemMatches::new();
    match_level(item, bundle, &mut matches)?;
    Ok(matches)
}

fn match_level(
    item: &CartItemNode,
    bundle: &BundleDefinition,
    acc: &mut ItemMatches,
) -> PricingResult<()> {
    for child in &item.children {
        let constituent =
            bundle
                .constituent_at(child.ordering)
                .ok_or_else(|| PricingError::StructuralMismatch {
                    sku_code: child.sku.code.clone(),
                    ordering: child.ordering,
                })?;

        acc.insert(child.guid.clone(), constituent.guid.clone());

        match &constituent.item {
            ConstituentItem::Bundle(nested) => match_level(child, nested, acc)?,
            ConstituentItem::Sku(_) if child.has_children() => {
                return Err(PricingError::InvalidStructure {
                    sku_code: child.sku.code.clone(),
                    constituent_guid: constituent.guid.clone(),
                });
            }
            ConstituentItem::Sku(_) => {}
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
