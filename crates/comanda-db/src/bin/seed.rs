//! # Seed Data Generator
//!
//! Populates the database with a development catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./comanda_dev.db
//! cargo run -p comanda-db --bin seed
//!
//! # Specify database path
//! cargo run -p comanda-db --bin seed -- --db ./data/comanda.db
//! ```
//!
//! ## Generated Products
//! - Unit-priced drinks, desserts and sides (one price per unit)
//! - Weight-priced buffet items (one price per kilogram)
//! - One inactive product, to exercise the "product_inactive" path

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use comanda_core::validation::validate_product_name;
use comanda_core::{Money, PricingMode, Product};
use comanda_db::repository::product::generate_product_id;
use comanda_db::{Database, DbConfig};

/// (category, name, price in cents)
const UNIT_PRODUCTS: &[(&str, &str, i64)] = &[
    ("Bebidas", "Refrigerante Lata", 650),
    ("Bebidas", "Suco Natural", 950),
    ("Bebidas", "Água Mineral", 400),
    ("Bebidas", "Cerveja Long Neck", 1200),
    ("Bebidas", "Café Expresso", 550),
    ("Sobremesas", "Pudim", 900),
    ("Sobremesas", "Mousse de Maracujá", 850),
    ("Porções", "Batata Frita", 2400),
    ("Porções", "Pastel de Carne", 800),
];

/// (category, name, price per kg in cents)
const WEIGHT_PRODUCTS: &[(&str, &str, i64)] = &[
    ("Buffet", "Buffet Livre por Kg", 6990),
    ("Buffet", "Churrasco por Kg", 8990),
    ("Buffet", "Saladas por Kg", 4990),
    ("Sobremesas", "Sorvete por Kg", 5990),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,comanda=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./comanda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Comanda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./comanda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Comanda Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut catalog: Vec<Product> = Vec::new();
    for (category, name, cents) in UNIT_PRODUCTS {
        catalog.push(product(
            category,
            name,
            PricingMode::Unit {
                price: Money::from_cents(*cents),
            },
            true,
        ));
    }
    for (category, name, cents) in WEIGHT_PRODUCTS {
        catalog.push(product(
            category,
            name,
            PricingMode::Weight {
                price_per_kg: Money::from_cents(*cents),
            },
            true,
        ));
    }
    catalog.push(product(
        "Bebidas",
        "Suco de Caju (fora de época)",
        PricingMode::Unit {
            price: Money::from_cents(950),
        },
        false,
    ));

    let mut generated = 0;
    for p in &catalog {
        validate_product_name(&p.name)?;
        if let Err(e) = db.products().insert(p).await {
            eprintln!("Failed to insert {}: {}", p.name, e);
            continue;
        }
        generated += 1;
        match p.pricing {
            PricingMode::Unit { price } => println!("  + {:<32} {}", p.name, price),
            PricingMode::Weight { price_per_kg } => {
                println!("  + {:<32} {} / kg", p.name, price_per_kg)
            }
        }
    }

    println!();
    println!("✓ Inserted {} products", generated);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn product(category: &str, name: &str, pricing: PricingMode, active: bool) -> Product {
    let now = Utc::now();

    Product {
        id: generate_product_id(),
        name: name.to_string(),
        category: category.to_string(),
        pricing,
        active,
        created_at: now,
        updated_at: now,
    }
}
