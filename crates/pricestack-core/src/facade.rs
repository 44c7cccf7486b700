//! # Price Lookup Facade
//!
//! The single entry point cart and checkout pipelines call.
//!
//! ## Orchestration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_for_cart_item(item, store, session)                              │
//! │     │                                                                   │
//! │     ├── validate_cart_tree(item)                                        │
//! │     ├── resolve_stack(store.catalog_code, session)  ◄── session cache   │
//! │     │                                                                   │
//! │     ├── CatalogLookup says bundle?                                      │
//! │     │     yes ──► BundlePriceBuilderFactory ──► Assigned | Calculated   │
//! │     │     no  ──► PromotedPriceLookup                                   │
//! │     │                                                                   │
//! │     └── attach result to item.price                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Collaborators
//! Catalog access, promoted prices, assignments and selling-context
//! evaluation are traits injected at construction. Nothing here touches a
//! database, a rule engine or the filesystem.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::bundle::BundlePriceBuilderFactory;
use crate::error::PricingResult;
use crate::price::Price;
use crate::session::{PricingSession, Store, TagContext};
use crate::stack::{PriceListStack, PriceListStackResolver};
use crate::types::{BundleDefinition, CartItemNode, PriceAdjustment, SkuRef};
use crate::validation::validate_cart_tree;

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Sku and bundle-definition access.
pub trait CatalogLookup: Send + Sync {
    /// The bundle definition sold under `sku_guid`, if the sku is a bundle.
    fn bundle_for_sku(&self, sku_guid: &str) -> Option<Arc<BundleDefinition>>;
}

/// Base prices with catalog promotions already applied.
pub trait PromotedPriceLookup: Send + Sync {
    fn promoted_price(
        &self,
        sku: &SkuRef,
        stack: &PriceListStack,
        store: &Store,
        tags: &TagContext,
    ) -> Option<Price>;

    /// Whether `price_list_guid` defines any price for `sku`.
    fn defines_price(&self, price_list_guid: &str, sku: &SkuRef) -> bool;
}

// =============================================================================
// Options & Request
// =============================================================================

/// Behaviour switches the host application passes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    /// Reuse a still-valid stack cached on the session.
    pub cache_price_list_stack: bool,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        FacadeOptions {
            cache_price_list_stack: true,
        }
    }
}

/// Everything a builder needs for one top-level build.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest<'a> {
    pub store: &'a Store,
    pub tags: &'a TagContext,
    pub stack: &'a PriceListStack,
}

// =============================================================================
// Facade
// =============================================================================

pub struct PriceLookupFacade {
    catalog: Arc<dyn CatalogLookup>,
    prices: Arc<dyn PromotedPriceLookup>,
    resolver: PriceListStackResolver,
    options: FacadeOptions,
}

impl PriceLookupFacade {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        prices: Arc<dyn PromotedPriceLookup>,
        resolver: PriceListStackResolver,
    ) -> Self {
        PriceLookupFacade {
            catalog,
            prices,
            resolver,
            options: FacadeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FacadeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> FacadeOptions {
        self.options
    }

    pub(crate) fn catalog(&self) -> &dyn CatalogLookup {
        self.catalog.as_ref()
    }

    /// Promoted price of `sku` for the request's stack, store and tags.
    pub(crate) fn promoted_price(&self, sku: &SkuRef, request: &PricingRequest<'_>) -> Option<Price> {
        self.prices
            .promoted_price(sku, request.stack, request.store, request.tags)
    }

    /// Returns the session's cached stack when it is still valid for
    /// `catalog_code`, otherwise resolves a fresh one and caches it on the
    /// session.
    pub fn resolve_stack(&self, catalog_code: &str, session: &mut PricingSession) -> PriceListStack {
        if self.options.cache_price_list_stack {
            if let Some(cached) = session.valid_price_list_stack(catalog_code) {
                debug!(catalog = %catalog_code, "Price list stack cache hit");
                return cached.clone();
            }
        }

        let stack = self
            .resolver
            .resolve(catalog_code, session.currency(), session.tags());

        if self.options.cache_price_list_stack {
            session.cache_price_list_stack(catalog_code, stack.clone());
        }

        stack
    }

    /// Prices one cart item, bundle or not, and attaches the result to it.
    ///
    /// `Ok(None)` means no price is available for the item.
    pub fn price_for_cart_item(
        &self,
        item: &mut CartItemNode,
        store: &Store,
        session: &mut PricingSession,
    ) -> PricingResult<Option<Price>> {
        validate_cart_tree(item)?;

        let stack = self.resolve_stack(&store.catalog_code, session);
        let request = PricingRequest {
            store,
            tags: session.tags(),
            stack: &stack,
        };

        let price = match self.catalog.bundle_for_sku(&item.sku.guid) {
            Some(bundle) => {
                let builder = BundlePriceBuilderFactory::create(self, bundle);
                builder.build(item, &request)?
            }
            None => self.promoted_price(&item.sku, &request),
        };

        if price.is_none() {
            info!(sku = %item.sku.code, store = %store.code, "No price available for cart item");
        }

        item.price = price.clone();
        Ok(price)
    }

    /// Adjustments for the bundle's constituents (nested bundles included),
    /// taken from the first price list in the stack that prices the bundle's
    /// root sku.
    ///
    /// Never absent: no such price list gives an empty map.
    pub fn adjustments_for_bundle(
        &self,
        bundle: &BundleDefinition,
        catalog_code: &str,
        session: &mut PricingSession,
    ) -> HashMap<String, PriceAdjustment> {
        let stack = self.resolve_stack(catalog_code, session);
        self.adjustments_in_stack(bundle, &stack)
    }

    pub(crate) fn adjustments_in_stack(
        &self,
        bundle: &BundleDefinition,
        stack: &PriceListStack,
    ) -> HashMap<String, PriceAdjustment> {
        let Some(price_list) = stack
            .price_lists()
            .iter()
            .find(|guid| self.prices.defines_price(guid, &bundle.root_sku))
        else {
            debug!(sku = %bundle.root_sku.code, "No price list prices bundle root");
            return HashMap::new();
        };

        let adjustments: HashMap<String, PriceAdjustment> = bundle
            .constituents_recursive()
            .into_iter()
            .filter_map(|constituent| constituent.adjustment_for(price_list))
            .filter(|adjustment| {
                // Assigned bundles only get dearer, calculated only cheaper
                if bundle.calculated {
                    adjustment.amount.is_negative()
                } else {
                    adjustment.amount.is_positive()
                }
            })
            .map(|adjustment| (adjustment.constituent_guid.clone(), adjustment.clone()))
            .collect();

        debug!(
            sku = %bundle.root_sku.code,
            price_list = %price_list,
            count = adjustments.len(),
            "Collected bundle adjustments"
        );

        adjustments
    }

    /// True for calculated bundles, whose price is always derivable;
    /// otherwise true iff a promoted price exists.
    pub fn has_price(&self, sku: &SkuRef, store: &Store, session: &mut PricingSession) -> bool {
        if let Some(bundle) = self.catalog.bundle_for_sku(&sku.guid) {
            if bundle.calculated {
                return true;
            }
        }

        let stack = self.resolve_stack(&store.catalog_code, session);
        self.prices
            .promoted_price(sku, &stack, store, session.tags())
            .is_some()
    }
}

impl std::fmt::Debug for PriceLookupFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceLookupFacade")
            .field("resolver", &self.resolver)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{CurrencyCode, Money};
    use crate::price::PriceTier;
    use crate::stack::{PriceListAssignment, PriceListAssignmentSource, SellingContext};
    use crate::types::{Constituent, ConstituentItem, SelectionRule};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    fn sku(code: &str) -> SkuRef {
        SkuRef::new(format!("guid-{}", code), code)
    }

    struct Bundles(Vec<Arc<BundleDefinition>>);

    impl CatalogLookup for Bundles {
        fn bundle_for_sku(&self, sku_guid: &str) -> Option<Arc<BundleDefinition>> {
            self.0.iter().find(|b| b.root_sku.guid == sku_guid).cloned()
        }
    }

    /// Every sku costs 10.00 in "PL-RETAIL"; BUNDLE is also priced in "PL-VIP".
    struct FlatPrices;

    impl PromotedPriceLookup for FlatPrices {
        fn promoted_price(
            &self,
            sku: &SkuRef,
            stack: &PriceListStack,
            _store: &Store,
            _tags: &TagContext,
        ) -> Option<Price> {
            let price_list = stack
                .price_lists()
                .iter()
                .find(|pl| self.defines_price(pl, sku))?;
            Some(Price::single_tier(
                stack.currency.clone(),
                PriceTier::new(1, Money::from_cents(1000)).with_price_list(price_list.clone()),
            ))
        }

        fn defines_price(&self, price_list_guid: &str, sku: &SkuRef) -> bool {
            match price_list_guid {
                "PL-RETAIL" => sku.code != "UNPRICED",
                "PL-VIP" => sku.code == "BUNDLE",
                _ => false,
            }
        }
    }

    struct CountingAssignments {
        calls: AtomicUsize,
        price_lists: Vec<&'static str>,
    }

    impl PriceListAssignmentSource for CountingAssignments {
        fn active_assignments(
            &self,
            catalog_code: &str,
            currency: &CurrencyCode,
        ) -> Vec<PriceListAssignment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.price_lists
                .iter()
                .enumerate()
                .map(|(i, pl)| PriceListAssignment {
                    guid: format!("a-{}", i),
                    price_list_guid: pl.to_string(),
                    catalog_code: catalog_code.to_string(),
                    currency: currency.clone(),
                    priority: i as i32,
                    selling_context: None,
                })
                .collect()
        }
    }

    /// Only the "master" catalog has an assignment.
    struct CatalogAssignments;

    impl PriceListAssignmentSource for CatalogAssignments {
        fn active_assignments(
            &self,
            catalog_code: &str,
            currency: &CurrencyCode,
        ) -> Vec<PriceListAssignment> {
            if catalog_code != "master" {
                return Vec::new();
            }
            vec![PriceListAssignment {
                guid: "a-master".to_string(),
                price_list_guid: "PL-RETAIL".to_string(),
                catalog_code: catalog_code.to_string(),
                currency: currency.clone(),
                priority: 1,
                selling_context: None,
            }]
        }
    }

    fn bundle(calculated: bool) -> Arc<BundleDefinition> {
        let nested = Arc::new(BundleDefinition {
            guid: "b-nested".to_string(),
            root_sku: sku("NESTED"),
            calculated: true,
            selection: SelectionRule::All,
            constituents: vec![Constituent::new("c-n1", 1, ConstituentItem::Sku(sku("N1")))
                .with_adjustment("PL-VIP", Money::from_cents(-50))],
        });

        Arc::new(BundleDefinition {
            guid: "b-1".to_string(),
            root_sku: sku("BUNDLE"),
            calculated,
            selection: SelectionRule::All,
            constituents: vec![
                Constituent::new("c-1", 1, ConstituentItem::Sku(sku("A")))
                    .with_adjustment("PL-VIP", Money::from_cents(500))
                    .with_adjustment("PL-RETAIL", Money::from_cents(900)),
                Constituent::new("c-2", 2, ConstituentItem::Sku(sku("B")))
                    .with_adjustment("PL-VIP", Money::from_cents(-300)),
                Constituent::new("c-3", 3, ConstituentItem::Sku(sku("C")))
                    .with_adjustment("PL-VIP", Money::zero()),
                Constituent::new("c-4", 4, ConstituentItem::Bundle(nested)),
            ],
        })
    }

    fn build_facade(
        price_lists: Vec<&'static str>,
        bundles: Vec<Arc<BundleDefinition>>,
    ) -> (PriceLookupFacade, Arc<CountingAssignments>) {
        let assignments = Arc::new(CountingAssignments {
            calls: AtomicUsize::new(0),
            price_lists,
        });
        let accept_all = |_: &SellingContext, _: &TagContext| true;
        let resolver = PriceListStackResolver::new(assignments.clone(), Arc::new(accept_all));
        let facade = PriceLookupFacade::new(Arc::new(Bundles(bundles)), Arc::new(FlatPrices), resolver);
        (facade, assignments)
    }

    fn session() -> PricingSession {
        PricingSession::new(usd(), TagContext::new())
    }

    #[test]
    fn test_resolve_stack_uses_session_cache() {
        let (facade, assignments) = build_facade(vec!["PL-RETAIL"], vec![]);
        let mut session = session();

        facade.resolve_stack("CAT", &mut session);
        facade.resolve_stack("CAT", &mut session);
        assert_eq!(assignments.calls.load(Ordering::SeqCst), 1);

        session.set_tag("SEGMENT", "vip");
        facade.resolve_stack("CAT", &mut session);
        assert_eq!(assignments.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cached_stack_is_per_catalog() {
        let assignments = Arc::new(CatalogAssignments);
        let accept_all = |_: &SellingContext, _: &TagContext| true;
        let resolver = PriceListStackResolver::new(assignments, Arc::new(accept_all));
        let facade = PriceLookupFacade::new(Arc::new(Bundles(vec![])), Arc::new(FlatPrices), resolver);
        let mut session = session();

        let master = facade.resolve_stack("master", &mut session);
        assert_eq!(master.price_lists(), &["PL-RETAIL".to_string()]);

        let elsewhere = facade.resolve_stack("elsewhere", &mut session);
        assert!(elsewhere.is_empty());

        let master = facade.resolve_stack("master", &mut session);
        assert_eq!(master.len(), 1);
    }

    #[test]
    fn test_resolve_stack_without_cache() {
        let (facade, assignments) = build_facade(vec!["PL-RETAIL"], vec![]);
        let facade = facade.with_options(FacadeOptions {
            cache_price_list_stack: false,
        });
        let mut session = session();

        facade.resolve_stack("CAT", &mut session);
        facade.resolve_stack("CAT", &mut session);
        assert_eq!(assignments.calls.load(Ordering::SeqCst), 2);
        assert!(session.valid_price_list_stack("CAT").is_none());
    }

    #[test]
    fn test_adjustments_from_first_price_list_pricing_root() {
        let (facade, _) = build_facade(vec!["PL-VIP", "PL-RETAIL"], vec![]);

        let assigned = facade.adjustments_for_bundle(&bundle(false), "CAT", &mut session());
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned["c-1"].amount.cents(), 500);
        assert_eq!(assigned["c-1"].price_list_guid, "PL-VIP");

        let calculated = facade.adjustments_for_bundle(&bundle(true), "CAT", &mut session());
        assert_eq!(calculated.len(), 2);
        assert_eq!(calculated["c-2"].amount.cents(), -300);
        assert_eq!(calculated["c-n1"].amount.cents(), -50);
    }

    #[test]
    fn test_adjustments_empty_when_nothing_prices_root() {
        let (facade, _) = build_facade(vec!["PL-OTHER"], vec![]);
        let adjustments = facade.adjustments_for_bundle(&bundle(false), "CAT", &mut session());
        assert!(adjustments.is_empty());

        let (facade, _) = build_facade(vec![], vec![]);
        let adjustments = facade.adjustments_for_bundle(&bundle(true), "CAT", &mut session());
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_price_for_plain_sku_attaches_price() {
        let (facade, _) = build_facade(vec!["PL-RETAIL"], vec![]);
        let mut item = CartItemNode::new(sku("A"), 1);
        let store = Store::new("STORE", "CAT");

        let price = facade
            .price_for_cart_item(&mut item, &store, &mut session())
            .unwrap()
            .unwrap();

        assert_eq!(price.list_price(1), Some(Money::from_cents(1000)));
        assert_eq!(item.price, Some(price));
    }

    #[test]
    fn test_price_for_unpriced_sku_is_none() {
        let (facade, _) = build_facade(vec!["PL-RETAIL"], vec![]);
        let mut item = CartItemNode::new(sku("UNPRICED"), 1);
        let store = Store::new("STORE", "CAT");

        let price = facade
            .price_for_cart_item(&mut item, &store, &mut session())
            .unwrap();
        assert!(price.is_none());
        assert!(item.price.is_none());
    }

    #[test]
    fn test_invalid_cart_is_rejected_before_pricing() {
        let (facade, assignments) = build_facade(vec!["PL-RETAIL"], vec![]);
        let mut item = CartItemNode::new(sku("A"), 0);
        let store = Store::new("STORE", "CAT");

        let err = facade
            .price_for_cart_item(&mut item, &store, &mut session())
            .unwrap_err();
        assert!(matches!(err, crate::error::PricingError::Validation(_)));
        assert_eq!(assignments.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_calculated_bundle_without_constituents_prices_at_zero() {
        let empty = Arc::new(BundleDefinition {
            guid: "b-empty".to_string(),
            root_sku: sku("EMPTY"),
            calculated: true,
            selection: SelectionRule::All,
            constituents: vec![],
        });
        let (facade, _) = build_facade(vec!["PL-RETAIL"], vec![empty]);
        let store = Store::new("STORE", "CAT");
        let mut session = session();
        let mut item = CartItemNode::new(sku("EMPTY"), 1);

        let price = facade
            .price_for_cart_item(&mut item, &store, &mut session)
            .unwrap()
            .unwrap();

        let tier = price.tier_for_quantity(1).unwrap();
        assert_eq!(tier.list_price, Money::zero());
        assert_eq!(tier.computed_price, Some(Money::zero()));
        assert_eq!(item.price, Some(price));
        assert!(facade.has_price(&sku("EMPTY"), &store, &mut session));
    }

    #[test]
    fn test_has_price() {
        let (facade, _) = build_facade(vec!["PL-RETAIL"], vec![bundle(true)]);
        let store = Store::new("STORE", "CAT");
        let mut session = session();

        assert!(facade.has_price(&sku("A"), &store, &mut session));
        assert!(!facade.has_price(&sku("UNPRICED"), &store, &mut session));

        // Calculated bundles are always priceable, even with an empty stack
        let (facade, _) = build_facade(vec![], vec![bundle(true)]);
        assert!(facade.has_price(&sku("BUNDLE"), &store, &mut self::session()));
    }
}
