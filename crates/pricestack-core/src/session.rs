//! # Session and Context
//!
//! What the caller knows about the shopper: currency, tag context, and a
//! previously resolved price-list stack it may reuse.
//!
//! ## Stack Cache Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingSession                                                         │
//! │                                                                         │
//! │  resolve_stack() ──► valid & same currency & catalog? ──► reuse         │
//! │                            │ no                                         │
//! │                            ▼                                            │
//! │                      resolver runs ──► cache_price_list_stack()         │
//! │                                                                         │
//! │  set_currency() / set_tag() / remove_tag() ──► cache invalidated        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::CurrencyCode;
use crate::stack::PriceListStack;

/// Tag carrying the moment the shopper started shopping (RFC 3339).
pub const SHOPPING_START_TIME_TAG: &str = "SHOPPING_START_TIME";

// =============================================================================
// Tag Context
// =============================================================================

/// Key/value tags describing the shopper (segment, geography, start time).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagContext {
    tags: BTreeMap<String, String>,
}

impl TagContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The parsed `SHOPPING_START_TIME` tag, if present and well formed.
    pub fn shopping_start_time(&self) -> Option<DateTime<Utc>> {
        self.get(SHOPPING_START_TIME_TAG)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl FromIterator<(String, String)> for TagContext {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        TagContext {
            tags: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// The storefront a cart is priced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub code: String,
    pub catalog_code: String,
}

impl Store {
    pub fn new(code: impl Into<String>, catalog_code: impl Into<String>) -> Self {
        Store {
            code: code.into(),
            catalog_code: catalog_code.into(),
        }
    }
}

// =============================================================================
// Pricing Session
// =============================================================================

/// Per-shopper pricing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSession {
    currency: CurrencyCode,
    tags: TagContext,
    #[serde(default)]
    price_list_stack: Option<PriceListStack>,
    /// Catalog the cached stack was resolved for.
    #[serde(default)]
    stack_catalog: Option<String>,
    #[serde(default)]
    stack_valid: bool,
}

impl PricingSession {
    pub fn new(currency: CurrencyCode, tags: TagContext) -> Self {
        PricingSession {
            currency,
            tags,
            price_list_stack: None,
            stack_catalog: None,
            stack_valid: false,
        }
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn tags(&self) -> &TagContext {
        &self.tags
    }

    /// Switches currency; the cached stack no longer applies.
    pub fn set_currency(&mut self, currency: CurrencyCode) {
        if currency != self.currency {
            self.currency = currency;
            self.invalidate_price_list_stack();
        }
    }

    /// Sets one tag; selling contexts may evaluate differently now.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.tags.insert(key.into(), value.into());
        self.invalidate_price_list_stack();
    }

    pub fn remove_tag(&mut self, key: &str) {
        if self.tags.tags.remove(key).is_some() {
            self.invalidate_price_list_stack();
        }
    }

    /// The cached stack, only while it is valid for the current currency and
    /// was resolved for `catalog_code`.
    pub fn valid_price_list_stack(&self, catalog_code: &str) -> Option<&PriceListStack> {
        if !self.stack_valid || self.stack_catalog.as_deref() != Some(catalog_code) {
            return None;
        }
        self.price_list_stack
            .as_ref()
            .filter(|stack| stack.currency == self.currency)
    }

    pub fn cache_price_list_stack(&mut self, catalog_code: impl Into<String>, stack: PriceListStack) {
        self.price_list_stack = Some(stack);
        self.stack_catalog = Some(catalog_code.into());
        self.stack_valid = true;
    }

    pub fn invalidate_price_list_stack(&mut self) {
        self.stack_valid = false;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
