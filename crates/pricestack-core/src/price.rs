//! # Price Module
//!
//! The `Price` / `PriceTier` value types both bundle strategies write into.
//!
//! ## Shape of a Price
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Price (currency: CAD, schedules: [PurchaseTime])                       │
//! │                                                                         │
//! │   min qty ──► PriceTier                                                 │
//! │   ───────     ───────────────────────────────────────────────────       │
//! │      1    ──► list 10.00 │ sale  9.00 │ computed 8.50 │ PL-RETAIL       │
//! │      5    ──► list  9.00 │ sale  -    │ computed  -   │ PL-RETAIL       │
//! │     10    ──► list  8.00 │ sale  7.50 │ computed  -   │ PL-RETAIL       │
//! │                                                                         │
//! │  tier_for_quantity(7)  → the "5" tier (greatest min qty <= 7)           │
//! │  lowest_price(7)       → 9.00                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Computed-Price Ratchet
//! The computed (promoted) price of a tier only ever goes down while a price
//! is being built: [`PriceTier::set_computed_price_if_lower`] is the single
//! place that comparison lives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::{CurrencyCode, Money};

// =============================================================================
// Price Tier
// =============================================================================

/// A price breakpoint for a minimum order quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceTier {
    /// Smallest order quantity this tier applies to.
    pub min_quantity: i64,

    /// Regular price.
    pub list_price: Money,

    /// Price-list sale price, when one is set.
    #[serde(default)]
    pub sale_price: Option<Money>,

    /// Promoted price computed at lookup/build time.
    #[serde(default)]
    pub computed_price: Option<Money>,

    /// Price list the amounts came from. Synthesized bundle tiers have none.
    #[serde(default)]
    pub price_list_guid: Option<String>,
}

impl PriceTier {
    /// Creates a tier with only a list price.
    pub fn new(min_quantity: i64, list_price: Money) -> Self {
        PriceTier {
            min_quantity,
            list_price,
            sale_price: None,
            computed_price: None,
            price_list_guid: None,
        }
    }

    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    pub fn with_price_list(mut self, price_list_guid: impl Into<String>) -> Self {
        self.price_list_guid = Some(price_list_guid.into());
        self
    }

    /// The lower of list and sale price.
    pub fn list_or_sale_lowest(&self) -> Money {
        match self.sale_price {
            Some(sale) => sale.min(self.list_price),
            None => self.list_price,
        }
    }

    /// The lowest of list, sale and computed price.
    pub fn lowest_price(&self) -> Money {
        match self.computed_price {
            Some(computed) => computed.min(self.list_or_sale_lowest()),
            None => self.list_or_sale_lowest(),
        }
    }

    /// Stores `candidate` as the computed price when there is none yet or when
    /// it is strictly lower than the current one. Returns whether it was kept.
    ///
    /// ```rust
    /// use pricestack_core::money::Money;
    /// use pricestack_core::price::PriceTier;
    ///
    /// let mut tier = PriceTier::new(1, Money::from_cents(10000));
    /// tier.set_computed_price_if_lower(Money::from_cents(5000));
    /// tier.set_computed_price_if_lower(Money::from_cents(3000));
    /// tier.set_computed_price_if_lower(Money::from_cents(4000));
    /// assert_eq!(tier.computed_price, Some(Money::from_cents(3000)));
    /// ```
    pub fn set_computed_price_if_lower(&mut self, candidate: Money) -> bool {
        match self.computed_price {
            Some(current) if candidate >= current => false,
            _ => {
                self.computed_price = Some(candidate);
                true
            }
        }
    }

    pub fn clear_computed_price(&mut self) {
        self.computed_price = None;
    }
}

// =============================================================================
// Pricing Schedules
// =============================================================================

/// When a price is charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceSchedule {
    /// Charged once, at checkout.
    PurchaseTime,
    /// Charged on a recurring payment schedule ("monthly", "annually").
    Recurring { period: String },
}

// =============================================================================
// Price
// =============================================================================

/// A currency plus an ordered mapping from minimum quantity to tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Price {
    pub currency: CurrencyCode,

    #[ts(type = "Record<string, PriceTier>")]
    tiers: BTreeMap<i64, PriceTier>,

    schedules: Vec<PriceSchedule>,
}

impl Price {
    /// Creates an empty one-time (purchase-time) price.
    pub fn new(currency: CurrencyCode) -> Self {
        Price {
            currency,
            tiers: BTreeMap::new(),
            schedules: vec![PriceSchedule::PurchaseTime],
        }
    }

    /// Creates an empty price covering the given schedules.
    pub fn with_schedules(currency: CurrencyCode, schedules: Vec<PriceSchedule>) -> Self {
        Price {
            currency,
            tiers: BTreeMap::new(),
            schedules,
        }
    }

    /// Creates a one-time price with a single tier.
    pub fn single_tier(currency: CurrencyCode, tier: PriceTier) -> Self {
        let mut price = Price::new(currency);
        price.add_or_update_tier(tier);
        price
    }

    /// Inserts a tier, replacing any tier at the same minimum quantity.
    pub fn add_or_update_tier(&mut self, tier: PriceTier) {
        self.tiers.insert(tier.min_quantity, tier);
    }

    /// Tiers in ascending minimum-quantity order.
    pub fn tiers(&self) -> impl Iterator<Item = &PriceTier> {
        self.tiers.values()
    }

    pub fn tiers_mut(&mut self) -> impl Iterator<Item = &mut PriceTier> {
        self.tiers.values_mut()
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn schedules(&self) -> &[PriceSchedule] {
        &self.schedules
    }

    /// The tier with the greatest minimum quantity not above `quantity`.
    pub fn tier_for_quantity(&self, quantity: i64) -> Option<&PriceTier> {
        self.tiers
            .range(..=quantity)
            .next_back()
            .map(|(_, tier)| tier)
    }

    pub fn tier_for_quantity_mut(&mut self, quantity: i64) -> Option<&mut PriceTier> {
        self.tiers
            .range_mut(..=quantity)
            .next_back()
            .map(|(_, tier)| tier)
    }

    /// Lowest of list/sale/computed at `quantity`.
    pub fn lowest_price(&self, quantity: i64) -> Option<Money> {
        self.tier_for_quantity(quantity).map(PriceTier::lowest_price)
    }

    pub fn list_price(&self, quantity: i64) -> Option<Money> {
        self.tier_for_quantity(quantity).map(|tier| tier.list_price)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
