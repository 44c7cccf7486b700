//! # Calculated Bundles
//!
//! A calculated bundle costs the sum of its constituents, each reduced by its
//! negative adjustment and never below zero.
//!
//! ```text
//! GIFT-BOX (calculated)                          build() bottom-up
//!  ├── MUG      10.00, adj -1.00  ──► computed  9.00 ─┐
//!  └── TEA-SET (calculated)                           │
//!       ├── GREEN  4.00, adj -9.00 ──► computed 0.00 ─┤ aggregate
//!       └── BLACK  5.00            ──► computed 5.00 ─┤   ▼
//!            TEA-SET  ◄── aggregate ──────────────────┘ GIFT-BOX
//! ```
//!
//! Promoted-price lookups are memoized by sku guid, and nested bundle prices
//! by sku guid plus the selection beneath them, for the duration of one
//! `build` call only.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bundle::aggregator::PricedBundleAggregator;
use crate::error::{PricingError, PricingResult};
use crate::facade::{PriceLookupFacade, PricingRequest};
use crate::matching::match_bundle_items;
use crate::money::Money;
use crate::price::Price;
use crate::types::{BundleDefinition, CartItemNode, Constituent};

/// Prices already worked out during one build.
#[derive(Debug, Default)]
struct PriceMemo {
    /// Sku guid → promoted price.
    prices: HashMap<String, Price>,
    /// Selection key → priced nested bundle subtree.
    bundles: HashMap<String, CartItemNode>,
}

#[derive(Debug)]
pub struct CalculatedBundlePriceBuilder<'a> {
    facade: &'a PriceLookupFacade,
}

impl<'a> CalculatedBundlePriceBuilder<'a> {
    pub fn new(facade: &'a PriceLookupFacade) -> Self {
        CalculatedBundlePriceBuilder { facade }
    }

    /// Prices `item` and every node beneath it.
    ///
    /// ## Errors
    /// - `UnsupportedOperation` if `item` is not a calculated bundle
    /// - `StructuralMismatch` / `InvalidStructure` if cart and bundle disagree
    /// - `ConstituentUnpriced` if a constituent has no promoted price
    /// - `UnsupportedPricingSchedule` if a constituent price has other than
    ///   one schedule
    /// - `MissingPriceTier` if no tier covers a constituent's quantity
    pub fn build(
        &self,
        item: &mut CartItemNode,
        request: &PricingRequest<'_>,
    ) -> PricingResult<Option<Price>> {
        let bundle = self.calculated_bundle(item).ok_or_else(|| {
            PricingError::UnsupportedOperation(format!(
                "{} is not a calculated bundle",
                item.sku.code
            ))
        })?;

        match_bundle_items(item, &bundle)?;

        let mut memo = PriceMemo::default();
        self.build_bundle(item, &bundle, request, &mut memo)
    }

    fn calculated_bundle(&self, item: &CartItemNode) -> Option<Arc<BundleDefinition>> {
        self.facade
            .catalog()
            .bundle_for_sku(&item.sku.guid)
            .filter(|bundle| bundle.calculated)
    }

    fn build_bundle(
        &self,
        item: &mut CartItemNode,
        bundle: &BundleDefinition,
        request: &PricingRequest<'_>,
        memo: &mut PriceMemo,
    ) -> PricingResult<Option<Price>> {
        for child in item.children.iter_mut() {
            let constituent =
                bundle
                    .constituent_at(child.ordering)
                    .ok_or_else(|| PricingError::StructuralMismatch {
                        sku_code: child.sku.code.clone(),
                        ordering: child.ordering,
                    })?;

            child.price = match self.calculated_bundle(child) {
                Some(nested) => self.nested_bundle_price(child, &nested, request, memo)?,
                None => Some(self.constituent_price(child, constituent, request, memo)?),
            };
        }

        let selected = PricedBundleAggregator::select(bundle, item);
        let price = PricedBundleAggregator::new(request.stack.currency.clone()).aggregate(&selected);

        if price.is_none() {
            debug!(sku = %item.sku.code, "Calculated bundle has an unpriced selection");
        }

        Ok(price)
    }

    /// Price of a nested calculated bundle. A repeat of a subtree already
    /// priced in this build reuses its prices, children included.
    fn nested_bundle_price(
        &self,
        child: &mut CartItemNode,
        nested: &BundleDefinition,
        request: &PricingRequest<'_>,
        memo: &mut PriceMemo,
    ) -> PricingResult<Option<Price>> {
        let key = selection_key(child);
        if let Some(priced) = memo.bundles.get(&key) {
            debug!(sku = %child.sku.code, "Nested bundle memo hit");
            copy_child_prices(priced, child);
            return Ok(priced.price.clone());
        }

        let price = self.build_bundle(child, nested, request, memo)?;

        let mut priced = child.clone();
        priced.price = price.clone();
        memo.bundles.insert(key, priced);
        Ok(price)
    }

    /// The child's promoted price with the constituent's contribution written
    /// into the tier covering the child's quantity.
    fn constituent_price(
        &self,
        child: &CartItemNode,
        constituent: &Constituent,
        request: &PricingRequest<'_>,
        memo: &mut PriceMemo,
    ) -> PricingResult<Price> {
        let mut price = match memo.prices.get(&child.sku.guid) {
            Some(cached) => {
                debug!(sku = %child.sku.code, "Constituent price memo hit");
                cached.clone()
            }
            None => {
                let fetched = self
                    .facade
                    .promoted_price(&child.sku, request)
                    .ok_or_else(|| {
                        warn!(sku = %child.sku.code, "Bundle constituent has no price");
                        PricingError::ConstituentUnpriced {
                            sku_code: child.sku.code.clone(),
                        }
                    })?;
                memo.prices.insert(child.sku.guid.clone(), fetched.clone());
                fetched
            }
        };

        let schedules = price.schedules().len();
        if schedules != 1 {
            return Err(PricingError::UnsupportedPricingSchedule {
                sku_code: child.sku.code.clone(),
                schedules,
            });
        }

        let tier = price
            .tier_for_quantity_mut(child.quantity)
            .ok_or_else(|| PricingError::MissingPriceTier {
                sku_code: child.sku.code.clone(),
                quantity: child.quantity,
            })?;

        // Only discounts apply to calculated bundles
        let adjustment = tier
            .price_list_guid
            .as_deref()
            .and_then(|price_list| constituent.adjustment_for(price_list))
            .map(|adjustment| adjustment.amount.min_zero())
            .unwrap_or_else(Money::zero);

        let contribution = (tier.list_or_sale_lowest() + adjustment).floor_at_zero();
        tier.set_computed_price_if_lower(contribution);

        Ok(price)
    }
}

/// Identifies a cart subtree by sku, quantity and the selection beneath it.
fn selection_key(node: &CartItemNode) -> String {
    let mut key = format!("{}x{}", node.sku.guid, node.quantity);
    if node.has_children() {
        key.push('(');
        for child in &node.children {
            key.push_str(&format!("{}:{},", child.ordering, selection_key(child)));
        }
        key.push(')');
    }
    key
}

/// Copies prices between two subtrees of the same shape.
fn copy_child_prices(from: &CartItemNode, to: &mut CartItemNode) {
    for (source, target) in from.children.iter().zip(to.children.iter_mut()) {
        target.price = source.price.clone();
        copy_child_prices(source, target);
    }
}
