//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::Arc;

use comanda_core::{FixedClock, Money, PricingMode, Product};
use comanda_db::{Database, DbConfig};
use comanda_service::{ComandaService, MemoryStore};

pub const SODA: &str = "prod-soda";
pub const JUICE: &str = "prod-juice";
pub const BUFFET: &str = "prod-buffet";
pub const SALAD: &str = "prod-salad";
pub const RETIRED: &str = "prod-retired";

/// 2026-10-18 12:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

pub fn brt() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn product(id: &str, name: &str, pricing: PricingMode, active: bool) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: "Test".to_string(),
        pricing,
        active,
        created_at: noon(),
        updated_at: noon(),
    }
}

/// Soda 9.50, juice 7.00, buffet 40.00/kg, salad 49.90/kg, retired 5.00 (inactive).
pub fn catalog() -> Vec<Product> {
    vec![
        product(
            SODA,
            "Refrigerante",
            PricingMode::Unit {
                price: Money::from_cents(950),
            },
            true,
        ),
        product(
            JUICE,
            "Suco Natural",
            PricingMode::Unit {
                price: Money::from_cents(700),
            },
            true,
        ),
        product(
            BUFFET,
            "Buffet por Kg",
            PricingMode::Weight {
                price_per_kg: Money::from_cents(4000),
            },
            true,
        ),
        product(
            SALAD,
            "Saladas por Kg",
            PricingMode::Weight {
                price_per_kg: Money::from_cents(4990),
            },
            true,
        ),
        product(
            RETIRED,
            "Suco de Caju",
            PricingMode::Unit {
                price: Money::from_cents(500),
            },
            false,
        ),
    ]
}

pub struct MemoryHarness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub service: ComandaService,
}

pub fn memory_harness() -> MemoryHarness {
    memory_harness_with_clock(Arc::new(FixedClock::utc(noon())))
}

pub fn memory_harness_with_clock(clock: Arc<FixedClock>) -> MemoryHarness {
    let store = Arc::new(MemoryStore::new());
    for p in catalog() {
        store.put_product(p);
    }
    let service = ComandaService::new(store.clone(), store.clone(), clock.clone());

    MemoryHarness {
        store,
        clock,
        service,
    }
}

pub struct SqliteHarness {
    pub db: Arc<Database>,
    pub clock: Arc<FixedClock>,
    pub service: ComandaService,
}

pub async fn sqlite_harness() -> SqliteHarness {
    let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
    for p in catalog() {
        db.products().insert(&p).await.unwrap();
    }
    let clock = Arc::new(FixedClock::utc(noon()));
    let service = ComandaService::new(db.clone(), db.clone(), clock.clone());

    SqliteHarness { db, clock, service }
}
