//! # Bundle Pricing
//!
//! Two strategies, picked once per bundle from its `calculated` flag.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BundlePriceBuilderFactory::create(facade, bundle)                      │
//! │        │                                                                │
//! │        ├── calculated = false ──► Assigned                              │
//! │        │     root sku price + positive constituent adjustments          │
//! │        │                                                                │
//! │        └── calculated = true  ──► Calculated                            │
//! │              Σ (constituent price + negative adjustment, floored at 0)  │
//! │              └──► PricedBundleAggregator                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod aggregator;
pub mod assigned;
pub mod calculated;

use std::sync::Arc;
use tracing::debug;

use crate::error::PricingResult;
use crate::facade::{PriceLookupFacade, PricingRequest};
use crate::price::Price;
use crate::types::{BundleDefinition, CartItemNode};

pub use aggregator::{PricedBundleAggregator, SelectedConstituent};
pub use assigned::AssignedBundlePriceBuilder;
pub use calculated::CalculatedBundlePriceBuilder;

/// The pricing strategy for one bundle.
#[derive(Debug)]
pub enum BundlePriceBuilder<'a> {
    Assigned(AssignedBundlePriceBuilder<'a>),
    Calculated(CalculatedBundlePriceBuilder<'a>),
}

impl BundlePriceBuilder<'_> {
    /// Builds the price of `item`, writing prices onto the nodes visited.
    pub fn build(
        &self,
        item: &mut CartItemNode,
        request: &PricingRequest<'_>,
    ) -> PricingResult<Option<Price>> {
        match self {
            BundlePriceBuilder::Assigned(builder) => builder.build(item, request),
            BundlePriceBuilder::Calculated(builder) => builder.build(item, request),
        }
    }
}

/// Selects the strategy for a bundle. Callers only hand it real bundles.
pub struct BundlePriceBuilderFactory;

impl BundlePriceBuilderFactory {
    pub fn create(facade: &PriceLookupFacade, bundle: Arc<BundleDefinition>) -> BundlePriceBuilder<'_> {
        debug!(
            sku = %bundle.root_sku.code,
            calculated = bundle.calculated,
            "Selected bundle price builder"
        );

        if bundle.calculated {
            BundlePriceBuilder::Calculated(CalculatedBundlePriceBuilder::new(facade))
        } else {
            BundlePriceBuilder::Assigned(AssignedBundlePriceBuilder::new(facade, bundle))
        }
    }
}
