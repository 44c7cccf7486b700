//! # Priced Bundle Aggregator
//!
//! Folds the prices of a bundle's selected constituents into one tier.
//!
//! ```text
//! selected constituent     qty   list    sale    computed/lowest
//! ───────────────────────  ───   ─────   ─────   ───────────────
//! MUG                       1    10.00    9.00    8.00
//! SPOON                     2     2.00     -      1.50
//! ───────────────────────────────────────────────────────────────
//! bundle tier (min qty 1)        14.00     -     11.00
//!                                         ▲
//!                   sale only when every constituent has one
//! ```

use crate::money::{CurrencyCode, Money};
use crate::price::{Price, PriceTier};
use crate::types::{BundleDefinition, CartItemNode, Constituent};

/// A constituent chosen for the bundle, with the price its cart item carries.
#[derive(Debug, Clone, Copy)]
pub struct SelectedConstituent<'a> {
    pub constituent: &'a Constituent,
    pub price: Option<&'a Price>,
    /// Order quantity used to pick the tier.
    pub quantity: i64,
}

/// Builds the synthesized price of a calculated bundle.
#[derive(Debug, Clone)]
pub struct PricedBundleAggregator {
    currency: CurrencyCode,
}

impl PricedBundleAggregator {
    pub fn new(currency: CurrencyCode) -> Self {
        PricedBundleAggregator { currency }
    }

    /// Pairs constituents with cart children. Every constituent is selected
    /// when the bundle has no optional slots, otherwise only those in the cart.
    pub fn select<'a>(
        bundle: &'a BundleDefinition,
        item: &'a CartItemNode,
    ) -> Vec<SelectedConstituent<'a>> {
        let optional = bundle.has_optional_slots();

        bundle
            .constituents
            .iter()
            .filter_map(|constituent| {
                let child = item
                    .children
                    .iter()
                    .find(|child| child.ordering == constituent.ordering);

                match child {
                    Some(child) => Some(SelectedConstituent {
                        constituent,
                        price: child.price.as_ref(),
                        quantity: child.quantity,
                    }),
                    None if optional => None,
                    None => Some(SelectedConstituent {
                        constituent,
                        price: None,
                        quantity: item.quantity,
                    }),
                }
            })
            .collect()
    }

    /// One price with a single tier at minimum quantity 1, or `None` when a
    /// selected constituent has no usable price.
    ///
    /// An empty selection prices at 0.00, the same as an assigned bundle
    /// with nothing added.
    pub fn aggregate(&self, selected: &[SelectedConstituent<'_>]) -> Option<Price> {
        if selected.is_empty() {
            return Some(self.zero_price());
        }

        let mut list = Money::zero();
        let mut sale = Some(Money::zero());
        let mut computed = Money::zero();

        for entry in selected {
            let tier = entry.price?.tier_for_quantity(entry.quantity)?;
            let units = entry.constituent.quantity;

            list += tier.list_price.multiply_quantity(units);
            sale = match (sale, tier.sale_price) {
                (Some(sum), Some(unit)) => Some(sum + unit.multiply_quantity(units)),
                _ => None,
            };
            computed += tier.lowest_price().multiply_quantity(units);
        }

        let mut tier = PriceTier::new(1, list);
        tier.sale_price = sale;
        tier.set_computed_price_if_lower(computed);

        Some(Price::single_tier(self.currency.clone(), tier))
    }

    fn zero_price(&self) -> Price {
        let mut tier = PriceTier::new(1, Money::zero());
        tier.set_computed_price_if_lower(Money::zero());
        Price::single_tier(self.currency.clone(), tier)
    }
}
