//! End-to-end pricing through the facade, the in-memory collaborators and
//! TOML fixtures.

use std::path::PathBuf;

use pricestack_catalog::{Fixture, LoadedFixture};
use pricestack_core::{
    CartItemNode, CatalogLookup, CurrencyCode, FacadeOptions, Money, PriceTier, PricingError, PricingSession,
    Store, TagContext,
};

fn usd() -> CurrencyCode {
    CurrencyCode::parse("USD").unwrap()
}

fn store() -> Store {
    Store::new("store-west", "master")
}

fn load(toml: &str) -> LoadedFixture {
    Fixture::from_toml_str(toml).unwrap().build().unwrap()
}

fn cart_of(loaded: &LoadedFixture, root: &str, children: &[(i32, &str)]) -> CartItemNode {
    let mut cart = CartItemNode::new(loaded.catalog.sku_by_code(root).unwrap().clone(), 1);
    for (ordering, code) in children {
        let sku = loaded.catalog.sku_by_code(code).unwrap().clone();
        cart.children.push(CartItemNode::new(sku, 1).with_ordering(*ordering));
    }
    cart
}

fn sample_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/sample.toml")
}

// =============================================================================
// Assigned Bundles
// =============================================================================

const ASSIGNED: &str = r#"
    [[skus]]
    code = "A"
    [[skus]]
    code = "B"
    [[skus]]
    code = "C"
    [[skus]]
    code = "D"

    [[bundles]]
    code = "KIT"

    [[bundles.constituents]]
    ordering = 1
    sku = "A"
    adjustments = { PL-RETAIL = 500 }

    [[bundles.constituents]]
    ordering = 2
    sku = "B"
    adjustments = { PL-RETAIL = -300 }

    [[bundles.constituents]]
    ordering = 3
    sku = "C"
    adjustments = { PL-RETAIL = 200 }

    [[bundles.constituents]]
    ordering = 4
    sku = "D"
    adjustments = { PL-RETAIL = -200 }

    [[price_lists]]
    guid = "PL-RETAIL"
    currency = "USD"

    [[assignments]]
    price_list = "PL-RETAIL"
    catalog = "master"
    priority = 10

    [[base_amounts]]
    price_list = "PL-RETAIL"
    sku = "KIT"
    list = 10000
"#;

#[test]
fn test_assigned_bundle_adds_positive_adjustments() {
    let loaded = load(ASSIGNED);
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut cart = cart_of(&loaded, "KIT", &[(1, "A"), (2, "B"), (3, "C")]);

    let price = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap()
        .unwrap();

    assert_eq!(price.list_price(1), Some(Money::from_cents(10700)));
    assert_eq!(price.list_price(1).unwrap().to_string(), "107.00");
    assert_eq!(cart.price, Some(price));
}

#[test]
fn test_assigned_bundle_with_only_negative_adjustments_is_unchanged() {
    let loaded = load(ASSIGNED);
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());

    let mut plain = cart_of(&loaded, "KIT", &[]);
    let base = facade
        .price_for_cart_item(&mut plain, &store(), &mut session)
        .unwrap()
        .unwrap();

    let mut cart = cart_of(&loaded, "KIT", &[(2, "B"), (4, "D")]);
    let price = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap()
        .unwrap();

    assert_eq!(price, base);
    assert_eq!(price.list_price(1), Some(Money::from_cents(10000)));
}

#[test]
fn test_unknown_ordering_is_structural_mismatch() {
    let loaded = load(ASSIGNED);
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut cart = cart_of(&loaded, "KIT", &[(1, "A"), (5, "D")]);

    let err = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        PricingError::StructuralMismatch { ref sku_code, ordering: 5 } if sku_code == "D"
    ));
    assert_eq!(err.sku_code(), Some("D"));
}

// =============================================================================
// Calculated Bundles
// =============================================================================

#[test]
fn test_calculated_contribution_never_negative() {
    let loaded = load(
        r#"
        [[skus]]
        code = "MUG"

        [[bundles]]
        code = "BOX"
        calculated = true

        [[bundles.constituents]]
        ordering = 1
        sku = "MUG"
        adjustments = { PL-RETAIL = -100000 }

        [[price_lists]]
        guid = "PL-RETAIL"
        currency = "USD"

        [[assignments]]
        price_list = "PL-RETAIL"
        catalog = "master"
        priority = 10

        [[base_amounts]]
        price_list = "PL-RETAIL"
        sku = "MUG"
        list = 1000
        "#,
    );
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut cart = cart_of(&loaded, "BOX", &[(1, "MUG")]);

    let price = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap()
        .unwrap();

    let mug = cart.children[0].price.as_ref().unwrap();
    assert_eq!(mug.lowest_price(1), Some(Money::zero()));

    let tier = price.tier_for_quantity(1).unwrap();
    assert_eq!(tier.list_price, Money::from_cents(1000));
    assert_eq!(tier.computed_price, Some(Money::zero()));
}

#[test]
fn test_ratchet_keeps_minimum() {
    let mut tier = PriceTier::new(1, Money::from_cents(100));
    for candidate in [50, 30, 40] {
        tier.set_computed_price_if_lower(Money::from_cents(candidate));
    }
    assert_eq!(tier.computed_price, Some(Money::from_cents(30)));
}

// =============================================================================
// Price-List Stack
// =============================================================================

const TWO_ASSIGNMENTS: &str = r#"
    [[skus]]
    code = "MUG"

    [[bundles]]
    code = "KIT"

    [[bundles.constituents]]
    ordering = 1
    sku = "MUG"
    adjustments = { PL-VIP = 100 }

    [[price_lists]]
    guid = "PL-VIP"
    currency = "USD"

    [[price_lists]]
    guid = "PL-RETAIL"
    currency = "USD"

    [[assignments]]
    guid = "assign-retail"
    price_list = "PL-RETAIL"
    catalog = "master"
    priority = 2

    [[assignments]]
    guid = "assign-vip"
    price_list = "PL-VIP"
    catalog = "master"
    priority = 1

    [assignments.selling_context]
    guid = "ctx-vip"

    [[assignments.selling_context.conditions]]
    tag = "SEGMENT"
    operator = "equals"
    value = "vip"
"#;

#[test]
fn test_unsatisfied_context_is_left_out_of_stack() {
    let loaded = load(TWO_ASSIGNMENTS);
    let facade = loaded.facade(FacadeOptions::default());

    let mut shopper = PricingSession::new(usd(), TagContext::new().with_tag("SEGMENT", "retail"));
    let stack = facade.resolve_stack("master", &mut shopper);
    assert_eq!(stack.price_lists(), &["PL-RETAIL".to_string()]);

    let mut vip = PricingSession::new(usd(), TagContext::new().with_tag("SEGMENT", "vip"));
    let stack = facade.resolve_stack("master", &mut vip);
    assert_eq!(
        stack.price_lists(),
        &["PL-VIP".to_string(), "PL-RETAIL".to_string()]
    );
}

#[test]
fn test_tag_change_invalidates_cached_stack() {
    let loaded = load(TWO_ASSIGNMENTS);
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());

    let stack = facade.resolve_stack("master", &mut session);
    assert_eq!(session.valid_price_list_stack("master"), Some(&stack));

    session.set_tag("SEGMENT", "vip");
    assert!(session.valid_price_list_stack("master").is_none());

    let stack = facade.resolve_stack("master", &mut session);
    assert_eq!(stack.len(), 2);
}

#[test]
fn test_adjustments_empty_when_no_price_list_prices_root() {
    let loaded = load(TWO_ASSIGNMENTS);
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new().with_tag("SEGMENT", "vip"));

    let kit = loaded.catalog.bundle_for_sku("KIT").unwrap();
    let adjustments = facade.adjustments_for_bundle(&kit, "master", &mut session);

    assert!(adjustments.is_empty());
}

// =============================================================================
// Sample Fixture
// =============================================================================

#[test]
fn test_sample_fixture_retail_shopper() {
    let loaded = Fixture::load(&sample_fixture()).unwrap();
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut cart = loaded.cart.clone().unwrap();

    let price = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap()
        .unwrap();

    // MUG: sale 10.00 less 2.00; TEA-SET: two green teas at 6.00
    let tier = price.tier_for_quantity(1).unwrap();
    assert_eq!(tier.list_price, Money::from_cents(2400));
    assert_eq!(tier.sale_price, None);
    assert_eq!(tier.computed_price, Some(Money::from_cents(2000)));

    let tea_set = &cart.children[1];
    assert_eq!(
        tea_set.price.as_ref().unwrap().lowest_price(1),
        Some(Money::from_cents(1200))
    );
    assert!(tea_set.children[0].price.is_some());
}

#[test]
fn test_sample_fixture_vip_shopper() {
    let loaded = Fixture::load(&sample_fixture()).unwrap();
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new().with_tag("SEGMENT", "vip"));
    let mut cart = loaded.cart.clone().unwrap();

    let price = facade
        .price_for_cart_item(&mut cart, &store(), &mut session)
        .unwrap()
        .unwrap();

    // MUG from PL-VIP: 11.00 less 4.00
    let tier = price.tier_for_quantity(1).unwrap();
    assert_eq!(tier.list_price, Money::from_cents(2300));
    assert_eq!(tier.computed_price, Some(Money::from_cents(1900)));
}

#[test]
fn test_sample_fixture_assigned_kit() {
    let loaded = Fixture::load(&sample_fixture()).unwrap();
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut kit = cart_of(&loaded, "STARTER-KIT", &[(1, "MUG"), (2, "INFUSER")]);

    let price = facade
        .price_for_cart_item(&mut kit, &store(), &mut session)
        .unwrap()
        .unwrap();

    assert_eq!(price.list_price(1), Some(Money::from_cents(1950)));
}

#[test]
fn test_unpriced_sku_in_unknown_catalog() {
    let loaded = Fixture::load(&sample_fixture()).unwrap();
    let facade = loaded.facade(FacadeOptions::default());
    let mut session = PricingSession::new(usd(), TagContext::new());
    let mut mug = cart_of(&loaded, "MUG", &[]);

    let price = facade
        .price_for_cart_item(&mut mug, &Store::new("store-west", "elsewhere"), &mut session)
        .unwrap();

    assert!(price.is_none());
    assert!(mug.price.is_none());
}
