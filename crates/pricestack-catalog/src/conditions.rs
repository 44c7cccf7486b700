//! # Tag-Condition Selling Contexts
//!
//! A small evaluator for selling contexts expressed as tag conditions.
//!
//! ```text
//! SellingContext "ctx-vip-spring"
//!   SEGMENT             equals  vip                    ─┐
//!   COUNTRY             one_of  CA,US                   ├─ all must hold
//!   SHOPPING_START_TIME after   2026-03-01T00:00:00Z   ─┘
//! ```
//!
//! A condition on a tag the shopper does not carry fails, except
//! `not_equals`, which holds.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use pricestack_core::{SellingContext, SellingContextEvaluator, TagCondition, TagContext, TagOperator};

#[derive(Debug, Clone, Copy, Default)]
pub struct TagConditionEvaluator;

impl TagConditionEvaluator {
    pub fn new() -> Self {
        TagConditionEvaluator
    }

    fn condition_holds(condition: &TagCondition, tags: &TagContext) -> bool {
        match condition.operator {
            TagOperator::Equals => tags.get(&condition.tag) == Some(condition.value.as_str()),
            TagOperator::NotEquals => tags.get(&condition.tag) != Some(condition.value.as_str()),
            TagOperator::OneOf => tags.get(&condition.tag).is_some_and(|actual| {
                condition
                    .value
                    .split(',')
                    .any(|candidate| candidate.trim() == actual)
            }),
            TagOperator::Before => {
                Self::compare_start_time(condition, tags, |start, bound| start < bound)
            }
            TagOperator::After => {
                Self::compare_start_time(condition, tags, |start, bound| start >= bound)
            }
        }
    }

    fn compare_start_time<F>(condition: &TagCondition, tags: &TagContext, cmp: F) -> bool
    where
        F: Fn(DateTime<Utc>, DateTime<Utc>) -> bool,
    {
        let Ok(bound) = DateTime::parse_from_rfc3339(&condition.value) else {
            warn!(value = %condition.value, "Selling context has malformed date bound");
            return false;
        };

        match tags.shopping_start_time() {
            Some(start) => cmp(start, bound.with_timezone(&Utc)),
            None => false,
        }
    }
}

impl SellingContextEvaluator for TagConditionEvaluator {
    fn is_satisfied(&self, context: &SellingContext, tags: &TagContext) -> bool {
        let satisfied = context
            .conditions
            .iter()
            .all(|condition| Self::condition_holds(condition, tags));

        debug!(context = %context.guid, satisfied, "Evaluated selling context");
        satisfied
    }
}
