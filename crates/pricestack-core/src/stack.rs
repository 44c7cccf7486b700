//! # Price-List Stack Resolution
//!
//! Decides which price lists apply to a shopper, highest priority first.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (catalog, currency, tags)                                              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  PriceListAssignmentSource::active_assignments(catalog, currency)       │
//! │        │   [A: prio 2, PL-WHOLESALE]  [B: prio 1, PL-VIP (segment=vip)] │
//! │        ▼                                                                │
//! │  SellingContextEvaluator (injected) ──► drop B when segment != vip      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  stable sort by priority ascending (ties keep source order)             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  PriceListStack { currency, [PL-WHOLESALE] }                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No assignments is not an error: the result is an empty stack.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use ts_rs::TS;

use crate::money::CurrencyCode;
use crate::session::TagContext;

// =============================================================================
// Price-List Stack
// =============================================================================

/// A currency plus unique price-list guids in strict priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceListStack {
    pub currency: CurrencyCode,
    price_lists: Vec<String>,
}

impl PriceListStack {
    pub fn new(currency: CurrencyCode) -> Self {
        PriceListStack {
            currency,
            price_lists: Vec::new(),
        }
    }

    /// Appends a price list at the lowest priority. Already-present guids are
    /// ignored so the stack stays unique.
    pub fn push(&mut self, price_list_guid: impl Into<String>) -> bool {
        let guid = price_list_guid.into();
        if self.price_lists.contains(&guid) {
            return false;
        }
        self.price_lists.push(guid);
        true
    }

    pub fn price_lists(&self) -> &[String] {
        &self.price_lists
    }

    pub fn is_empty(&self) -> bool {
        self.price_lists.is_empty()
    }

    pub fn len(&self) -> usize {
        self.price_lists.len()
    }
}

// =============================================================================
// Assignments & Selling Contexts
// =============================================================================

/// How a tag condition compares the shopper's tag to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagOperator {
    Equals,
    NotEquals,
    /// Value is a comma-separated list.
    OneOf,
    /// Shopping start time is before the RFC 3339 value.
    Before,
    /// Shopping start time is at or after the RFC 3339 value.
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCondition {
    pub tag: String,
    pub operator: TagOperator,
    pub value: String,
}

/// A conditional predicate gating a price-list assignment.
///
/// Conditions are combined with AND; an empty context is always satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellingContext {
    pub guid: String,
    #[serde(default)]
    pub conditions: Vec<TagCondition>,
}

/// Links a price list to a (catalog, currency) at a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListAssignment {
    pub guid: String,
    pub price_list_guid: String,
    pub catalog_code: String,
    pub currency: CurrencyCode,

    /// Lower wins.
    pub priority: i32,

    #[serde(default)]
    pub selling_context: Option<SellingContext>,
}

/// Source of active price-list assignments.
pub trait PriceListAssignmentSource: Send + Sync {
    /// Active assignments for `(catalog_code, currency)`, in a stable order.
    fn active_assignments(
        &self,
        catalog_code: &str,
        currency: &CurrencyCode,
    ) -> Vec<PriceListAssignment>;
}

/// Evaluates a selling context against the shopper's tags.
///
/// Usually backed by a rule engine; any `Fn(&SellingContext, &TagContext) -> bool`
/// works as a fake.
pub trait SellingContextEvaluator: Send + Sync {
    fn is_satisfied(&self, context: &SellingContext, tags: &TagContext) -> bool;
}

impl<F> SellingContextEvaluator for F
where
    F: Fn(&SellingContext, &TagContext) -> bool + Send + Sync,
{
    fn is_satisfied(&self, context: &SellingContext, tags: &TagContext) -> bool {
        self(context, tags)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the ordered, context-filtered price-list stack.
#[derive(Clone)]
pub struct PriceListStackResolver {
    assignments: Arc<dyn PriceListAssignmentSource>,
    evaluator: Arc<dyn SellingContextEvaluator>,
}

impl PriceListStackResolver {
    pub fn new(
        assignments: Arc<dyn PriceListAssignmentSource>,
        evaluator: Arc<dyn SellingContextEvaluator>,
    ) -> Self {
        PriceListStackResolver {
            assignments,
            evaluator,
        }
    }

    pub fn resolve(
        &self,
        catalog_code: &str,
        currency: &CurrencyCode,
        tags: &TagContext,
    ) -> PriceListStack {
        let candidates = self.assignments.active_assignments(catalog_code, currency);
        let considered = candidates.len();

        let mut kept: Vec<PriceListAssignment> = candidates
            .into_iter()
            .filter(|assignment| match &assignment.selling_context {
                Some(context) => self.evaluator.is_satisfied(context, tags),
                None => true,
            })
            .collect();

        // sort_by_key is stable: equal priorities keep source order
        kept.sort_by_key(|assignment| assignment.priority);

        let mut stack = PriceListStack::new(currency.clone());
        for assignment in kept {
            stack.push(assignment.price_list_guid);
        }

        debug!(
            catalog = %catalog_code,
            currency = %currency,
            considered,
            kept = stack.len(),
            "Resolved price list stack"
        );

        stack
    }
}

impl std::fmt::Debug for PriceListStackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceListStackResolver").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
