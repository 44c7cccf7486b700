//! # Domain Types
//!
//! Cart-side and catalog-side trees the engine reads.
//!
//! ## Two Trees, One Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart (CartItemNode)                 Catalog (BundleDefinition)         │
//! │                                                                         │
//! │  GIFT-BOX  qty 1                     GIFT-BOX  calculated=true          │
//! │   ├── ordering 1  MUG       ◄──────►  ├── ordering 1  Sku(MUG)          │
//! │   └── ordering 3  TEA-SET   ◄──────►  ├── ordering 2  Sku(SPOON)        │
//! │        ├── ordering 1 GREEN ◄──────►  └── ordering 3  Bundle(TEA-SET)   │
//! │        └── ordering 2 BLACK ◄──────►        ├── ordering 1 Sku(GREEN)   │
//! │                                             └── ordering 2 Sku(BLACK)   │
//! │                                                                         │
//! │  Cart children match a SUBSET of constituents at the same depth.       │
//! │  Only Bundle constituents may have matching cart children.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Cart and catalog collaborators own these trees. The engine reads them and
//! only ever writes `CartItemNode::price` on nodes it visits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::money::Money;
use crate::price::Price;

// =============================================================================
// Sku Reference
// =============================================================================

/// Dual-key sku identity: immutable guid plus the human-readable code used in
/// shopper-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkuRef {
    pub guid: String,
    pub code: String,
}

impl SkuRef {
    pub fn new(guid: impl Into<String>, code: impl Into<String>) -> Self {
        SkuRef {
            guid: guid.into(),
            code: code.into(),
        }
    }
}

// =============================================================================
// Cart Item Node
// =============================================================================

/// A shopping-cart line item, possibly the root of a bundle's item tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemNode {
    pub guid: String,
    pub sku: SkuRef,

    /// Position within the parent's children, matched against
    /// `Constituent::ordering` at the same depth.
    #[serde(default)]
    pub ordering: i32,

    /// Effective quantity. For bundle items this already includes the
    /// parent's quantity.
    pub quantity: i64,

    #[serde(default)]
    pub children: Vec<CartItemNode>,

    /// Written by the engine; owned by the cart.
    #[serde(default)]
    pub price: Option<Price>,
}

impl CartItemNode {
    /// Creates a node with a fresh guid at ordering 0.
    pub fn new(sku: SkuRef, quantity: i64) -> Self {
        CartItemNode {
            guid: Uuid::new_v4().to_string(),
            sku,
            ordering: 0,
            quantity,
            children: Vec::new(),
            price: None,
        }
    }

    pub fn with_ordering(mut self, ordering: i32) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_child(mut self, child: CartItemNode) -> Self {
        self.children.push(child);
        self
    }

    /// True when the node carries bundle items.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

// =============================================================================
// Price Adjustment
// =============================================================================

/// A signed delta applied to one constituent, scoped to one price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PriceAdjustment {
    pub constituent_guid: String,
    pub price_list_guid: String,
    pub amount: Money,
}

impl PriceAdjustment {
    pub fn new(
        constituent_guid: impl Into<String>,
        price_list_guid: impl Into<String>,
        amount: Money,
    ) -> Self {
        PriceAdjustment {
            constituent_guid: constituent_guid.into(),
            price_list_guid: price_list_guid.into(),
            amount,
        }
    }
}

// =============================================================================
// Bundle Definition
// =============================================================================

/// How many constituents a shopper must pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// Every constituent is part of the bundle.
    #[default]
    All,
    /// The shopper picks `n` constituents.
    SelectN(u32),
}

impl SelectionRule {
    /// Builds a rule from a "select n" parameter, where 0 means all.
    pub fn from_parameter(n: u32) -> Self {
        if n == 0 {
            SelectionRule::All
        } else {
            SelectionRule::SelectN(n)
        }
    }
}

/// What a constituent refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstituentItem {
    Sku(SkuRef),
    Bundle(Arc<BundleDefinition>),
}

impl ConstituentItem {
    pub fn is_bundle(&self) -> bool {
        matches!(self, ConstituentItem::Bundle(_))
    }

    /// The sku this item is sold as (a nested bundle's root sku).
    pub fn sku(&self) -> &SkuRef {
        match self {
            ConstituentItem::Sku(sku) => sku,
            ConstituentItem::Bundle(bundle) => &bundle.root_sku,
        }
    }

    pub fn bundle(&self) -> Option<&Arc<BundleDefinition>> {
        match self {
            ConstituentItem::Bundle(bundle) => Some(bundle),
            ConstituentItem::Sku(_) => None,
        }
    }
}

/// One component of a bundle at a given ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constituent {
    pub guid: String,
    pub ordering: i32,

    /// Units of this item per bundle.
    #[serde(default = "default_constituent_quantity")]
    pub quantity: i64,

    pub item: ConstituentItem,

    /// Adjustments keyed by price-list guid.
    #[serde(default)]
    pub adjustments: HashMap<String, PriceAdjustment>,
}

fn default_constituent_quantity() -> i64 {
    1
}

impl Constituent {
    pub fn new(guid: impl Into<String>, ordering: i32, item: ConstituentItem) -> Self {
        Constituent {
            guid: guid.into(),
            ordering,
            quantity: default_constituent_quantity(),
            item,
            adjustments: HashMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Adds an adjustment for `price_list_guid`.
    pub fn with_adjustment(mut self, price_list_guid: impl Into<String>, amount: Money) -> Self {
        let price_list_guid = price_list_guid.into();
        let adjustment = PriceAdjustment::new(self.guid.clone(), price_list_guid.clone(), amount);
        self.adjustments.insert(price_list_guid, adjustment);
        self
    }

    pub fn adjustment_for(&self, price_list_guid: &str) -> Option<&PriceAdjustment> {
        self.adjustments.get(price_list_guid)
    }
}

/// Catalog definition of a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDefinition {
    pub guid: String,

    /// The sku the bundle itself is sold as.
    pub root_sku: SkuRef,

    /// Calculated bundles are priced as the sum of their constituents;
    /// assigned bundles carry their own price.
    pub calculated: bool,

    #[serde(default)]
    pub selection: SelectionRule,

    pub constituents: Vec<Constituent>,
}

impl BundleDefinition {
    pub fn constituent_at(&self, ordering: i32) -> Option<&Constituent> {
        self.constituents.iter().find(|c| c.ordering == ordering)
    }

    /// True when the shopper chooses a subset of the constituents.
    pub fn has_optional_slots(&self) -> bool {
        match self.selection {
            SelectionRule::All => false,
            SelectionRule::SelectN(n) => (n as usize) < self.constituents.len(),
        }
    }

    /// Every constituent of this bundle and its nested bundles, depth-first
    /// in ordering.
    pub fn constituents_recursive(&self) -> Vec<&Constituent> {
        let mut found = Vec::new();
        collect_constituents(self, &mut found);
        found
    }
}

fn collect_constituents<'a>(bundle: &'a BundleDefinition, acc: &mut Vec<&'a Constituent>) {
    for constituent in &bundle.constituents {
        acc.push(constituent);
        if let ConstituentItem::Bundle(nested) = &constituent.item {
            collect_constituents(nested, acc);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
