//! # Seed Data Generator
//!
//! Populates the database with demo kits for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kitguard_dev.db
//! cargo run -p kitguard-db --bin seed
//!
//! # Specify database path
//! cargo run -p kitguard-db --bin seed -- --db ./data/kitguard.db
//! ```
//!
//! ## Generated Data
//! - Component products with stock levels (ribbon, card, flour, ...)
//! - Kits built from them, including a fractional BOM
//! - One kit whose components are short, one kit-enabled product without
//!   a BOM, and one plain product that is also a component

use std::env;

use anyhow::Context;
use kitguard_core::{Component, Quantity};
use kitguard_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (id, name, available stock in milli-units)
const COMPONENTS: &[(&str, &str, i64)] = &[
    ("RIBBON", "Ribbon", 40_000),
    ("CARD", "Greeting Card", 25_000),
    ("BOX", "Gift Box Shell", 12_000),
    ("CHOC", "Chocolate Bar", 3_000),
    ("FLOUR", "Flour (kg)", 1_200),
    ("SUGAR", "Sugar (kg)", 5_000),
    ("BALLOON", "Balloon", 0),
];

/// (kit id, kit name, [(component id, milli-units per kit)])
const KITS: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "GIFT-BOX",
        "Gift Box",
        &[("BOX", 1_000), ("RIBBON", 2_000), ("CARD", 1_000)],
    ),
    ("CHOC-BOX", "Chocolate Gift", &[("BOX", 1_000), ("CHOC", 4_000)]),
    ("BAKING-KIT", "Baking Kit", &[("FLOUR", 250), ("SUGAR", 100)]),
    ("PARTY-PACK", "Party Pack", &[("BALLOON", 10_000), ("CARD", 1_000)]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kitguard=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kitguard_dev.db");

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
                println!("Kitguard Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kitguard_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kitguard Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name, stock) in COMPONENTS {
        db.products()
            .insert(id, name, false)
            .await
            .with_context(|| format!("inserting component {id}"))?;
        db.stock()
            .set_available(id, Quantity::from_milli(*stock))
            .await?;
    }
    println!("✓ {} components with stock", COMPONENTS.len());

    for (id, name, bom) in KITS {
        db.products()
            .insert(id, name, true)
            .await
            .with_context(|| format!("inserting kit {id}"))?;

        let components: Vec<Component> = bom
            .iter()
            .map(|(component_id, milli)| Component::new(*component_id, "", Quantity::from_milli(*milli)))
            .collect();
        db.boms()
            .replace_components(id, &components)
            .await
            .with_context(|| format!("writing BOM of {id}"))?;
    }
    println!("✓ {} kits", KITS.len());

    // Kit switch on, no BOM yet: sells as a plain product
    db.products().insert("HAMPER", "Holiday Hamper", true).await?;
    db.products().insert("WATER", "Water 500ml", false).await?;
    db.stock().set_available("WATER", Quantity::from_units(48)).await?;
    println!("✓ Plain products");

    println!();
    println!("Kit check:");
    for (id, name, _) in KITS {
        let components = db.boms().get_components(id).await?;
        let mut buildable: Option<i64> = None;
        for component in &components {
            let available = db.stock().get_available(component.product_id.as_str()).await?;
            let per_kit = component.unit_quantity.milli();
            let count = available.milli() / per_kit;
            buildable = Some(buildable.map_or(count, |b| b.min(count)));
        }
        println!("  {:<16} {} buildable", name, buildable.unwrap_or(0));
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
