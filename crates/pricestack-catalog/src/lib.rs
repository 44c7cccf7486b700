//! # pricestack-catalog: Collaborators and Fixtures
//!
//! Concrete implementations of everything `pricestack-core` consumes as a
//! trait, plus the file-backed pieces around them.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine.toml + PRICESTACK_* env ──► EngineConfig                        │
//! │                                        │ store, currency, options       │
//! │  fixture.toml ──► Fixture ──► LoadedFixture                             │
//! │                                 ├── InMemoryCatalog      (CatalogLookup)│
//! │                                 ├── InMemoryPriceLists   (assignments,  │
//! │                                 │                         promoted price)│
//! │                                 └── cart: CartItemNode                  │
//! │                                        │                                │
//! │                                        ▼                                │
//! │            PriceLookupFacade (+ TagConditionEvaluator)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Engine configuration (file + environment)
//! - [`conditions`] - Tag-condition selling-context evaluator
//! - [`fixture`] - TOML fixture loading
//! - [`memory`] - In-memory catalog and price lists
//! - [`error`] - Catalog error types

pub mod conditions;
pub mod config;
pub mod error;
pub mod fixture;
pub mod memory;

pub use conditions::TagConditionEvaluator;
pub use config::EngineConfig;
pub use error::{CatalogError, CatalogResult};
pub use fixture::{Fixture, LoadedFixture};
pub use memory::{BaseAmount, InMemoryCatalog, InMemoryPriceLists, PriceListDescriptor};

/// Initializes tracing for binaries and tests that want log output.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
