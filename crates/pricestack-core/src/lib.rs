//! # pricestack-core: Bundle Pricing Engine
//!
//! Computes prices for shopping-cart line items, including recursively priced
//! bundles, and resolves which price lists apply to a shopper. Pure logic:
//! every collaborator is a trait supplied by the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cart / Checkout Pipeline                            │
//! │                               │                                         │
//! │  ┌────────────────────────────▼────────────────────────────────────┐   │
//! │  │               ★ pricestack-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   PriceLookupFacade                                             │   │
//! │  │     ├── PriceListStackResolver ──► PriceListStack               │   │
//! │  │     ├── BundlePriceBuilderFactory                               │   │
//! │  │     │     ├── AssignedBundlePriceBuilder                        │   │
//! │  │     │     └── CalculatedBundlePriceBuilder                      │   │
//! │  │     │            └── PricedBundleAggregator                     │   │
//! │  │     └── PromotedPriceLookup (trait)                             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO RULE ENGINE                         │   │
//! │  └────────────────────────────┬────────────────────────────────────┘   │
//! │                               │ traits                                  │
//! │  ┌────────────────────────────▼────────────────────────────────────┐   │
//! │  │        pricestack-catalog (in-memory collaborators, fixtures)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money and currency codes
//! - [`price`] - `Price` / `PriceTier` and the set-if-lower ratchet
//! - [`types`] - Cart item trees and bundle definitions
//! - [`session`] - Shopper tags, store and the cached stack
//! - [`stack`] - Price-list assignments and stack resolution
//! - [`matching`] - Cart ↔ bundle tree matching
//! - [`bundle`] - Assigned and calculated bundle builders, aggregator
//! - [`facade`] - The orchestrating entry point
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **No I/O**: catalogs, price lists and rule engines are injected traits
//! 2. **Integer Money**: amounts are cents (i64)
//! 3. **Explicit Errors**: every failure is a typed `PricingError`
//! 4. **Scoped State**: per-build memos live on the call stack only
//!
//! ## Example Usage
//!
//! ```rust
//! use pricestack_core::money::Money;
//! use pricestack_core::price::PriceTier;
//!
//! let mut tier = PriceTier::new(1, Money::from_cents(1000));
//! tier.set_computed_price_if_lower(Money::from_cents(800));
//! tier.set_computed_price_if_lower(Money::from_cents(900));
//!
//! assert_eq!(tier.lowest_price(), Money::from_cents(800));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bundle;
pub mod error;
pub mod facade;
pub mod matching;
pub mod money;
pub mod price;
pub mod session;
pub mod stack;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bundle::{BundlePriceBuilder, BundlePriceBuilderFactory, PricedBundleAggregator};
pub use error::{PricingError, PricingResult, ValidationError};
pub use facade::{CatalogLookup, FacadeOptions, PriceLookupFacade, PricingRequest, PromotedPriceLookup};
pub use money::{CurrencyCode, Money};
pub use price::{Price, PriceSchedule, PriceTier};
pub use session::{PricingSession, Store, TagContext};
pub use stack::{
    PriceListAssignment, PriceListAssignmentSource, PriceListStack, PriceListStackResolver,
    SellingContext, SellingContextEvaluator, TagCondition, TagOperator,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum effective quantity of a single cart item.
///
/// ## Business Reason
/// A sanity guard chosen by this crate, not a limit of the pricing model.
/// Bundle item quantities are multiplied through the tree, so a typo in one
/// node would otherwise ripple into every tier lookup beneath it.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Maximum depth of a cart item tree, root included.
pub const MAX_BUNDLE_DEPTH: usize = 16;
