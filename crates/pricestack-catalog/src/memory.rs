//! # In-Memory Collaborators
//!
//! Concrete implementations of the traits pricestack-core consumes, backed by
//! plain maps. Fixtures, tests and the `price-cart` binary use these.
//!
//! ## Promoted Price Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  promoted_price(MUG, stack [PL-VIP, PL-RETAIL])                         │
//! │                                                                         │
//! │  PL-VIP    has amounts for MUG?  no                                     │
//! │  PL-RETAIL has amounts for MUG?  yes ──► tiers { 1: 10.00, 6: 9.00 }    │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                  promotion hook (black box)             │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                   Price (computed prices set)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use pricestack_core::{
    BundleDefinition, CatalogLookup, CurrencyCode, Money, Price, PriceListAssignment,
    PriceListAssignmentSource, PriceListStack, PriceSchedule, PriceTier, PromotedPriceLookup,
    SkuRef, Store, TagContext,
};

// =============================================================================
// Catalog
// =============================================================================

/// Skus and bundle definitions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    skus: HashMap<String, SkuRef>,
    guids_by_code: HashMap<String, String>,
    bundles: HashMap<String, Arc<BundleDefinition>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sku(&mut self, sku: SkuRef) {
        self.guids_by_code.insert(sku.code.clone(), sku.guid.clone());
        self.skus.insert(sku.guid.clone(), sku);
    }

    /// Registers a bundle under its root sku (and the root sku itself).
    pub fn add_bundle(&mut self, bundle: Arc<BundleDefinition>) {
        self.add_sku(bundle.root_sku.clone());
        self.bundles.insert(bundle.root_sku.guid.clone(), bundle);
    }

    pub fn sku(&self, guid: &str) -> Option<&SkuRef> {
        self.skus.get(guid)
    }

    pub fn sku_by_code(&self, code: &str) -> Option<&SkuRef> {
        self.guids_by_code.get(code).and_then(|guid| self.skus.get(guid))
    }

    pub fn sku_count(&self) -> usize {
        self.skus.len()
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn bundle_for_sku(&self, sku_guid: &str) -> Option<Arc<BundleDefinition>> {
        self.bundles.get(sku_guid).cloned()
    }
}

// =============================================================================
// Price Lists
// =============================================================================

/// A price list: a named set of base amounts in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceListDescriptor {
    pub guid: String,
    pub name: String,
    pub currency: CurrencyCode,
}

/// One base amount row: a tier of one sku in one price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseAmount {
    pub min_quantity: i64,
    pub list: Money,
    pub sale: Option<Money>,
    /// Promotion already applied upstream, if any.
    pub promoted: Option<Money>,
}

#[derive(Debug, Clone, Default)]
struct SkuAmounts {
    tiers: BTreeMap<i64, BaseAmount>,
    schedules: Vec<PriceSchedule>,
}

/// Applies catalog promotions to a base price. Treated as a black box.
pub type PromotionFn = dyn Fn(&SkuRef, &mut Price, &Store, &TagContext) + Send + Sync;

/// Price lists, their assignments and base amounts.
#[derive(Clone, Default)]
pub struct InMemoryPriceLists {
    price_lists: HashMap<String, PriceListDescriptor>,
    assignments: Vec<PriceListAssignment>,
    amounts: HashMap<(String, String), SkuAmounts>,
    promotion: Option<Arc<PromotionFn>>,
}

impl InMemoryPriceLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the promotion hook run on every promoted-price lookup.
    pub fn with_promotion<F>(mut self, promotion: F) -> Self
    where
        F: Fn(&SkuRef, &mut Price, &Store, &TagContext) + Send + Sync + 'static,
    {
        self.promotion = Some(Arc::new(promotion));
        self
    }

    pub fn add_price_list(&mut self, descriptor: PriceListDescriptor) {
        self.price_lists.insert(descriptor.guid.clone(), descriptor);
    }

    pub fn price_list(&self, guid: &str) -> Option<&PriceListDescriptor> {
        self.price_lists.get(guid)
    }

    /// Assignments are kept in insertion order; that order breaks priority
    /// ties.
    pub fn add_assignment(&mut self, assignment: PriceListAssignment) {
        self.assignments.push(assignment);
    }

    /// Adds a one-time base amount for `sku_guid` in `price_list_guid`.
    pub fn add_base_amount(&mut self, price_list_guid: &str, sku_guid: &str, amount: BaseAmount) {
        self.add_scheduled_amount(price_list_guid, sku_guid, amount, PriceSchedule::PurchaseTime);
    }

    /// Adds a base amount charged on `schedule`.
    pub fn add_scheduled_amount(
        &mut self,
        price_list_guid: &str,
        sku_guid: &str,
        amount: BaseAmount,
        schedule: PriceSchedule,
    ) {
        let entry = self
            .amounts
            .entry((price_list_guid.to_string(), sku_guid.to_string()))
            .or_default();
        entry.tiers.insert(amount.min_quantity, amount);
        if !entry.schedules.contains(&schedule) {
            entry.schedules.push(schedule);
        }
    }

    fn base_price(&self, price_list_guid: &str, sku: &SkuRef, currency: &CurrencyCode) -> Option<Price> {
        let amounts = self
            .amounts
            .get(&(price_list_guid.to_string(), sku.guid.clone()))?;

        let mut price = Price::with_schedules(currency.clone(), amounts.schedules.clone());
        for amount in amounts.tiers.values() {
            let mut tier = PriceTier::new(amount.min_quantity, amount.list).with_price_list(price_list_guid);
            tier.sale_price = amount.sale;
            if let Some(promoted) = amount.promoted {
                tier.set_computed_price_if_lower(promoted);
            }
            price.add_or_update_tier(tier);
        }
        Some(price)
    }
}

impl std::fmt::Debug for InMemoryPriceLists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPriceLists")
            .field("price_lists", &self.price_lists.len())
            .field("assignments", &self.assignments.len())
            .field("amounts", &self.amounts.len())
            .field("promotion", &self.promotion.is_some())
            .finish()
    }
}

impl PriceListAssignmentSource for InMemoryPriceLists {
    fn active_assignments(&self, catalog_code: &str, currency: &CurrencyCode) -> Vec<PriceListAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.catalog_code == catalog_code && &a.currency == currency)
            .cloned()
            .collect()
    }
}

impl PromotedPriceLookup for InMemoryPriceLists {
    fn promoted_price(
        &self,
        sku: &SkuRef,
        stack: &PriceListStack,
        store: &Store,
        tags: &TagContext,
    ) -> Option<Price> {
        let (price_list, mut price) = stack.price_lists().iter().find_map(|guid| {
            self.base_price(guid, sku, &stack.currency)
                .map(|price| (guid, price))
        })?;

        debug!(sku = %sku.code, price_list = %price_list, "Found base price");

        if let Some(promotion) = &self.promotion {
            promotion(sku, &mut price, store, tags);
        }

        Some(price)
    }

    fn defines_price(&self, price_list_guid: &str, sku: &SkuRef) -> bool {
        self.amounts
            .contains_key(&(price_list_guid.to_string(), sku.guid.clone()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
