//! # Price Cart
//!
//! Prices the cart described by a fixture and prints the result as JSON.
//!
//! ## Usage
//! ```bash
//! # Price the sample fixture
//! cargo run -p pricestack-catalog --bin price-cart -- --fixture fixtures/sample.toml
//!
//! # Shop as a VIP in April
//! cargo run -p pricestack-catalog --bin price-cart -- \
//!     --fixture fixtures/sample.toml \
//!     --tag SEGMENT=vip --tag SHOPPING_START_TIME=2026-04-15T12:00:00Z
//! ```
//!
//! ## Output
//! The root price, followed by every cart node with the price the engine
//! attached to it (`null` when none was available).

use serde_json::{json, Value};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use pricestack_catalog::{init_tracing, CatalogError, CatalogResult, EngineConfig, Fixture};
use pricestack_core::{CartItemNode, PricingSession, TagContext};

struct Args {
    config: Option<PathBuf>,
    fixture: Option<PathBuf>,
    tags: Vec<(String, String)>,
}

/// Parses `args` (program name first). `Ok(None)` means help was printed.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args {
        config: None,
        fixture: None,
        tags: Vec::new(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config = Some(PathBuf::from(value_after(args, i)?));
                i += 1;
            }
            "--fixture" | "-f" => {
                parsed.fixture = Some(PathBuf::from(value_after(args, i)?));
                i += 1;
            }
            "--tag" | "-t" => {
                let tag = value_after(args, i)?;
                let (key, value) = tag
                    .split_once('=')
                    .ok_or_else(|| format!("tag must be KEY=VALUE, got '{}'", tag))?;
                parsed.tags.push((key.to_string(), value.to_string()));
                i += 1;
            }
            "--help" | "-h" => {
                println!("pricestack cart pricer");
                println!();
                println!("Usage: price-cart [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>      Engine config file (default: none)");
                println!("  -f, --fixture <PATH>     Fixture to price (overrides config)");
                println!("  -t, --tag <KEY=VALUE>    Shopper tag, repeatable");
                println!("  -h, --help               Show this help message");
                return Ok(None);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
        i += 1;
    }

    Ok(Some(parsed))
}

fn value_after(args: &[String], flag_index: usize) -> Result<&str, String> {
    args.get(flag_index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", args[flag_index]))
}

fn node_report(node: &CartItemNode) -> Value {
    json!({
        "guid": node.guid,
        "sku": node.sku.code,
        "ordering": node.ordering,
        "quantity": node.quantity,
        "price": node.price,
        "children": node.children.iter().map(node_report).collect::<Vec<_>>(),
    })
}

fn run(args: Args) -> CatalogResult<()> {
    let config = EngineConfig::load(args.config.as_deref())?;

    let fixture_path = args
        .fixture
        .or_else(|| config.fixture.path.clone())
        .ok_or_else(|| CatalogError::InvalidConfig("no fixture given (--fixture or [fixture].path)".into()))?;

    let loaded = Fixture::load(&fixture_path)?;
    let mut cart = loaded
        .cart
        .clone()
        .ok_or_else(|| CatalogError::InvalidFixture("fixture has no [cart]".into()))?;

    let tags: TagContext = args.tags.into_iter().collect();
    let mut session = PricingSession::new(config.currency()?, tags);
    let store = config.store();

    let facade = loaded.facade(config.facade_options());
    let price = facade.price_for_cart_item(&mut cart, &store, &mut session)?;

    let report = json!({
        "store": store.code,
        "currency": session.currency().as_str(),
        "price_list_stack": session.valid_price_list_stack(&store.catalog_code),
        "price": price,
        "cart": node_report(&cart),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn main() -> ExitCode {
    init_tracing("info,pricestack_core=debug,pricestack_catalog=debug");

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Pricing failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
