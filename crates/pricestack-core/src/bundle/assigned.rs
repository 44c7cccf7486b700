//! Assigned bundles: the bundle's own price, raised by positive constituent
//! adjustments.

use std::sync::Arc;
use tracing::debug;

use crate::error::PricingResult;
use crate::facade::{PriceLookupFacade, PricingRequest};
use crate::matching::match_bundle_items;
use crate::money::Money;
use crate::price::Price;
use crate::types::{BundleDefinition, CartItemNode};

#[derive(Debug)]
pub struct AssignedBundlePriceBuilder<'a> {
    facade: &'a PriceLookupFacade,
    bundle: Arc<BundleDefinition>,
}

impl<'a> AssignedBundlePriceBuilder<'a> {
    pub fn new(facade: &'a PriceLookupFacade, bundle: Arc<BundleDefinition>) -> Self {
        AssignedBundlePriceBuilder { facade, bundle }
    }

    /// Prices the bundle root. Only strictly positive adjustments of the
    /// constituents present in the cart count; zero and negative ones are
    /// ignored.
    pub fn build(
        &self,
        item: &CartItemNode,
        request: &PricingRequest<'_>,
    ) -> PricingResult<Option<Price>> {
        let matches = match_bundle_items(item, &self.bundle)?;
        let adjustments = self.facade.adjustments_in_stack(&self.bundle, request.stack);

        let total: Money = matches
            .values()
            .filter_map(|constituent_guid| adjustments.get(constituent_guid))
            .map(|adjustment| adjustment.amount)
            .filter(|amount| amount.is_positive())
            .sum();

        let Some(mut price) = self.facade.promoted_price(&item.sku, request) else {
            return Ok(None);
        };

        if !total.is_positive() {
            return Ok(Some(price));
        }

        debug!(sku = %item.sku.code, total = %total, "Applying bundle adjustments");
        apply_adjustment_total(&mut price, total);
        Ok(Some(price))
    }
}

/// Raises every tier by `total`. The computed price is re-derived through the
/// ratchet so it never exceeds a cheaper candidate already known.
fn apply_adjustment_total(price: &mut Price, total: Money) {
    for tier in price.tiers_mut() {
        tier.list_price += total;
        if let Some(sale) = tier.sale_price.as_mut() {
            *sale += total;
        }
        if let Some(computed) = tier.computed_price {
            tier.clear_computed_price();
            tier.set_computed_price_if_lower(computed + total);
        }
    }
}
