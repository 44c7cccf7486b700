//! # TOML Fixtures
//!
//! A whole pricing world in one file: skus, bundles, price lists, their
//! assignments, base amounts and a cart to price.
//!
//! ## Fixture Format
//! ```toml
//! [[skus]]
//! code = "MUG"
//!
//! [[bundles]]
//! code = "GIFT-BOX"
//! calculated = true
//! select = 0                          # 0 = every constituent
//!
//! [[bundles.constituents]]
//! ordering = 1
//! sku = "MUG"                         # or: bundle = "TEA-SET"
//! quantity = 1
//! adjustments = { PL-RETAIL = -100 }  # cents, per price list
//!
//! [[price_lists]]
//! guid = "PL-RETAIL"
//! currency = "USD"
//!
//! [[assignments]]
//! price_list = "PL-RETAIL"
//! catalog = "master"
//! priority = 10
//!
//! [[base_amounts]]
//! price_list = "PL-RETAIL"
//! sku = "MUG"
//! min_quantity = 1
//! list = 1000
//! sale = 900
//!
//! [cart]
//! sku = "GIFT-BOX"
//! quantity = 1
//!
//! [[cart.items]]
//! ordering = 1
//! sku = "MUG"
//! ```
//!
//! Amounts are integer cents. A cart item without a quantity defaults to its
//! parent's quantity times the constituent quantity at its ordering.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use pricestack_core::validation::validate_price_list_guid;
use pricestack_core::{
    BundleDefinition, CartItemNode, CatalogLookup, Constituent, ConstituentItem, CurrencyCode, FacadeOptions, Money,
    PriceListAssignment, PriceListStackResolver, PriceLookupFacade, PriceSchedule, SelectionRule,
    SellingContext, SkuRef,
};

use crate::conditions::TagConditionEvaluator;
use crate::error::{CatalogError, CatalogResult};
use crate::memory::{BaseAmount, InMemoryCatalog, InMemoryPriceLists, PriceListDescriptor};

// =============================================================================
// File Schema
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub skus: Vec<FixtureSku>,
    #[serde(default)]
    pub bundles: Vec<FixtureBundle>,
    #[serde(default)]
    pub price_lists: Vec<FixturePriceList>,
    #[serde(default)]
    pub assignments: Vec<FixtureAssignment>,
    #[serde(default)]
    pub base_amounts: Vec<FixtureBaseAmount>,
    #[serde(default)]
    pub cart: Option<FixtureCartItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSku {
    pub code: String,
    /// Defaults to the code.
    #[serde(default)]
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureBundle {
    /// Root sku code.
    pub code: String,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub calculated: bool,
    /// How many constituents the shopper picks; 0 means all.
    #[serde(default)]
    pub select: u32,
    #[serde(default)]
    pub constituents: Vec<FixtureConstituent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConstituent {
    pub ordering: i32,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Price-list guid → cents.
    #[serde(default)]
    pub adjustments: BTreeMap<String, i64>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePriceList {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureAssignment {
    #[serde(default)]
    pub guid: Option<String>,
    pub price_list: String,
    pub catalog: String,
    pub priority: i32,
    #[serde(default)]
    pub selling_context: Option<SellingContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureBaseAmount {
    pub price_list: String,
    pub sku: String,
    #[serde(default = "default_quantity")]
    pub min_quantity: i64,
    pub list: i64,
    #[serde(default)]
    pub sale: Option<i64>,
    #[serde(default)]
    pub promoted: Option<i64>,
    /// Recurring period ("monthly"); one-time when absent.
    #[serde(default)]
    pub recurring: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCartItem {
    pub sku: String,
    #[serde(default)]
    pub ordering: i32,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub items: Vec<FixtureCartItem>,
}

// =============================================================================
// Loaded Fixture
// =============================================================================

/// The collaborators and cart a fixture describes.
#[derive(Debug, Clone)]
pub struct LoadedFixture {
    pub catalog: InMemoryCatalog,
    pub price_lists: InMemoryPriceLists,
    pub cart: Option<CartItemNode>,
}

impl LoadedFixture {
    /// A facade over this fixture's collaborators, evaluating selling
    /// contexts with [`TagConditionEvaluator`].
    pub fn facade(&self, options: FacadeOptions) -> PriceLookupFacade {
        let price_lists = Arc::new(self.price_lists.clone());
        let resolver = PriceListStackResolver::new(price_lists.clone(), Arc::new(TagConditionEvaluator::new()));

        PriceLookupFacade::new(Arc::new(self.catalog.clone()), price_lists, resolver).with_options(options)
    }
}

impl Fixture {
    pub fn load(path: &Path) -> CatalogResult<LoadedFixture> {
        info!(?path, "Loading fixture");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)?.build()
    }

    pub fn from_toml_str(contents: &str) -> CatalogResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolves every reference and builds the in-memory collaborators.
    pub fn build(&self) -> CatalogResult<LoadedFixture> {
        let mut catalog = InMemoryCatalog::new();
        for sku in &self.skus {
            catalog.add_sku(sku_ref(&sku.code, sku.guid.as_deref()));
        }

        let mut builder = BundleBuilder {
            fixture: self,
            catalog: &mut catalog,
            built: HashMap::new(),
        };
        for bundle in &self.bundles {
            builder.build(&bundle.code, &mut HashSet::new())?;
        }

        let price_lists = self.build_price_lists(&catalog)?;

        let cart = match &self.cart {
            Some(item) => Some(build_cart_item(item, 1, &catalog)?),
            None => None,
        };

        info!(
            skus = catalog.sku_count(),
            bundles = catalog.bundle_count(),
            "Fixture loaded"
        );

        Ok(LoadedFixture {
            catalog,
            price_lists,
            cart,
        })
    }

    fn build_price_lists(&self, catalog: &InMemoryCatalog) -> CatalogResult<InMemoryPriceLists> {
        let mut lists = InMemoryPriceLists::new();

        for list in &self.price_lists {
            check_price_list_guid(&list.guid, "price list")?;
            let currency = CurrencyCode::parse(&list.currency)
                .map_err(|e| CatalogError::InvalidFixture(format!("price list {}: {}", list.guid, e)))?;
            lists.add_price_list(PriceListDescriptor {
                guid: list.guid.clone(),
                name: list.name.clone(),
                currency,
            });
        }

        for (index, assignment) in self.assignments.iter().enumerate() {
            check_price_list_guid(&assignment.price_list, "assignment")?;
            let currency = lists
                .price_list(&assignment.price_list)
                .map(|list| list.currency.clone())
                .ok_or_else(|| CatalogError::unknown("price list", &assignment.price_list))?;

            lists.add_assignment(PriceListAssignment {
                guid: assignment
                    .guid
                    .clone()
                    .unwrap_or_else(|| format!("assignment-{}", index + 1)),
                price_list_guid: assignment.price_list.clone(),
                catalog_code: assignment.catalog.clone(),
                currency,
                priority: assignment.priority,
                selling_context: assignment.selling_context.clone(),
            });
        }

        for row in &self.base_amounts {
            check_price_list_guid(&row.price_list, "base amount")?;
            if lists.price_list(&row.price_list).is_none() {
                return Err(CatalogError::unknown("price list", &row.price_list));
            }
            let sku = catalog
                .sku_by_code(&row.sku)
                .ok_or_else(|| CatalogError::unknown("sku", &row.sku))?;

            let amount = BaseAmount {
                min_quantity: row.min_quantity,
                list: Money::from_cents(row.list),
                sale: row.sale.map(Money::from_cents),
                promoted: row.promoted.map(Money::from_cents),
            };
            let schedule = match &row.recurring {
                Some(period) => PriceSchedule::Recurring {
                    period: period.clone(),
                },
                None => PriceSchedule::PurchaseTime,
            };
            lists.add_scheduled_amount(&row.price_list, &sku.guid, amount, schedule);
        }

        Ok(lists)
    }
}

fn check_price_list_guid(guid: &str, owner: &str) -> CatalogResult<()> {
    validate_price_list_guid(guid).map_err(|e| CatalogError::InvalidFixture(format!("{}: {}", owner, e)))
}

fn sku_ref(code: &str, guid: Option<&str>) -> SkuRef {
    SkuRef::new(guid.unwrap_or(code), code)
}

// =============================================================================
// Bundle Resolution
// =============================================================================

/// Builds bundle definitions depth-first so nested bundles exist before the
/// bundles that contain them.
struct BundleBuilder<'a> {
    fixture: &'a Fixture,
    catalog: &'a mut InMemoryCatalog,
    built: HashMap<String, Arc<BundleDefinition>>,
}

impl BundleBuilder<'_> {
    fn build(&mut self, code: &str, visiting: &mut HashSet<String>) -> CatalogResult<Arc<BundleDefinition>> {
        if let Some(done) = self.built.get(code) {
            return Ok(done.clone());
        }
        if !visiting.insert(code.to_string()) {
            return Err(CatalogError::InvalidFixture(format!(
                "bundle {} contains itself",
                code
            )));
        }

        let fixture = self.fixture;
        let definition = fixture
            .bundles
            .iter()
            .find(|bundle| bundle.code == code)
            .ok_or_else(|| CatalogError::unknown("bundle", code))?;

        let mut constituents = Vec::with_capacity(definition.constituents.len());
        for entry in &definition.constituents {
            let item = match (&entry.sku, &entry.bundle) {
                (Some(sku), None) => ConstituentItem::Sku(
                    self.catalog
                        .sku_by_code(sku)
                        .cloned()
                        .ok_or_else(|| CatalogError::unknown("sku", sku))?,
                ),
                (None, Some(bundle)) => ConstituentItem::Bundle(self.build(bundle, visiting)?),
                _ => {
                    return Err(CatalogError::InvalidFixture(format!(
                        "constituent {} of {} needs exactly one of sku or bundle",
                        entry.ordering, code
                    )))
                }
            };

            let guid = entry
                .guid
                .clone()
                .unwrap_or_else(|| format!("{}-{}", code, entry.ordering));
            let mut constituent = Constituent::new(guid, entry.ordering, item).with_quantity(entry.quantity);
            for (price_list, cents) in &entry.adjustments {
                check_price_list_guid(price_list, &format!("adjustment on {} constituent {}", code, entry.ordering))?;
                constituent = constituent.with_adjustment(price_list.clone(), Money::from_cents(*cents));
            }
            constituents.push(constituent);
        }

        let root_sku = self
            .catalog
            .sku_by_code(code)
            .cloned()
            .unwrap_or_else(|| sku_ref(code, None));

        let bundle = Arc::new(BundleDefinition {
            guid: definition.guid.clone().unwrap_or_else(|| format!("bundle-{}", code)),
            root_sku,
            calculated: definition.calculated,
            selection: SelectionRule::from_parameter(definition.select),
            constituents,
        });

        visiting.remove(code);
        self.catalog.add_bundle(bundle.clone());
        self.built.insert(code.to_string(), bundle.clone());
        Ok(bundle)
    }
}

/// A child without a quantity gets its parent's quantity times the matching
/// constituent's quantity.
fn build_cart_item(item: &FixtureCartItem, default_quantity: i64, catalog: &InMemoryCatalog) -> CatalogResult<CartItemNode> {
    let sku = catalog
        .sku_by_code(&item.sku)
        .cloned()
        .ok_or_else(|| CatalogError::unknown("sku", &item.sku))?;
    let quantity = item.quantity.unwrap_or(default_quantity);
    let bundle = catalog.bundle_for_sku(&sku.guid);

    let mut node = CartItemNode::new(sku, quantity).with_ordering(item.ordering);
    for child in &item.items {
        let per_unit = bundle
            .as_ref()
            .and_then(|bundle| bundle.constituent_at(child.ordering))
            .map_or(1, |constituent| constituent.quantity);
        node.children.push(build_cart_item(child, quantity * per_unit, catalog)?);
    }
    Ok(node)
}

// =============================================================================
// Unit Tests
// =============================================================================
